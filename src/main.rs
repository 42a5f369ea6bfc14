// SPDX-License-Identifier: GPL-3.0-only
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::HttpApiServer;
use crate::config::ServerConfig;
use crate::control::MonitorControl;
use crate::protocols::ddc_ci::I2cDevTransport;

#[macro_use]
extern crate tracing;

mod api;
mod config;
mod control;
mod devices;
mod error;
mod monitor;
mod panel;
mod permissions;
mod protocols;

fn setup_logs() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = fmt::layer().with_target(false).with_writer(io::stderr);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(format!(
        "warn,{}=info",
        env!("CARGO_CRATE_NAME")
    )));

    if let Ok(journal_layer) = tracing_journald::layer() {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .with(journal_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    setup_logs();

    let config_path = config::resolve_path(std::env::args_os().nth(1).map(PathBuf::from));
    let server_config = ServerConfig::load(&config_path);

    permissions::check_i2c_permissions().log();

    let control = Arc::new(MonitorControl::new(Box::new(I2cDevTransport::new())));
    match control.initialize(monitor::enumerate_displays) {
        Ok(count) => info!("Controlling {} display(s)", count),
        Err(e) => warn!("Starting without display control: {}", e),
    }

    let mut server = HttpApiServer::new(Arc::clone(&control));
    if server_config.enabled {
        // The panel stays usable without the API
        if let Err(e) = server.start(server_config) {
            warn!("HTTP API unavailable: {}", e);
        }
    }

    let result = panel::run(&control, io::stdin().lock(), io::stdout());
    server.stop();
    result?;

    Ok(())
}

// SPDX-License-Identifier: GPL-3.0-only
//! Local HTTP API
//!
//! [`HttpApiServer`] owns a dedicated thread running its own tokio runtime.
//! `start` blocks until that thread reports whether the listener is bound,
//! so callers never have to poll to learn if the API is up.
//!
//! # Lifecycle
//!
//! `Stopped -> Starting -> Bound -> Running -> Stopping -> Stopped`, with
//! `Starting -> BindFailed` when the address cannot be claimed.
//!
//! Every `start` opens a new attempt. A worker only moves the state of its
//! own attempt, so a worker abandoned after a start timeout cannot touch the
//! state of a later start.
//!
//! `stop` triggers axum's graceful shutdown: the listener closes, requests
//! already inside the control lock finish and get their response, then the
//! thread is joined.

pub mod payload;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::thread::JoinHandle;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};

use crate::config::ServerConfig;
use crate::control::MonitorControl;
use crate::error::ApiError;

/// How long `start` waits for the bind report
pub const START_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Starting,
    Bound,
    Running,
    Stopping,
    BindFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Lifecycle {
    attempt: u64,
    state: ServerState,
}

type BindReport = Result<SocketAddr, ApiError>;

/// A worker's handle on the lifecycle, bound to one start attempt
#[derive(Debug, Clone)]
struct AttemptState {
    lifecycle: Arc<watch::Sender<Lifecycle>>,
    attempt: u64,
}

impl AttemptState {
    /// Move `from -> to` while this attempt is current
    fn advance(&self, from: ServerState, to: ServerState) -> bool {
        self.lifecycle.send_if_modified(|current| {
            if current.attempt == self.attempt && current.state == from {
                current.state = to;
                true
            } else {
                false
            }
        })
    }

    /// Record `to` while this attempt is current
    fn set(&self, to: ServerState) -> bool {
        self.lifecycle.send_if_modified(|current| {
            if current.attempt == self.attempt {
                current.state = to;
                true
            } else {
                false
            }
        })
    }
}

#[derive(Debug)]
pub struct HttpApiServer {
    control: Arc<MonitorControl>,
    lifecycle: Arc<watch::Sender<Lifecycle>>,
    start_timeout: Duration,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl HttpApiServer {
    pub fn new(control: Arc<MonitorControl>) -> Self {
        let (lifecycle, _) = watch::channel(Lifecycle {
            attempt: 0,
            state: ServerState::Stopped,
        });
        Self {
            control,
            lifecycle: Arc::new(lifecycle),
            start_timeout: START_TIMEOUT,
            shutdown: None,
            worker: None,
        }
    }

    fn set_state(&self, state: ServerState) {
        self.lifecycle.send_modify(|current| current.state = state);
    }

    /// Open a new attempt in `Starting`
    fn begin_attempt(&self) -> AttemptState {
        let mut attempt = 0;
        self.lifecycle.send_modify(|current| {
            current.attempt += 1;
            current.state = ServerState::Starting;
            attempt = current.attempt;
        });
        AttemptState {
            lifecycle: Arc::clone(&self.lifecycle),
            attempt,
        }
    }

    /// Bind and start serving; returns the bound address
    ///
    /// Fails when already running, when the API is disabled, or when the
    /// worker does not report a successful bind within [`START_TIMEOUT`].
    pub fn start(&mut self, config: ServerConfig) -> Result<SocketAddr, ApiError> {
        if self.is_running() {
            return Err(ApiError::AlreadyRunning);
        }
        if !config.enabled {
            info!("HTTP API disabled in configuration");
            return Err(ApiError::Disabled);
        }
        // Reap a worker whose serve loop ended on its own
        self.stop();

        let (report_tx, report_rx) = mpsc::sync_channel(1);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let router = routes::router(Arc::clone(&self.control));
        let attempt = self.begin_attempt();
        let host = config.host.clone();
        let port = config.port;

        let worker = std::thread::Builder::new()
            .name("http-api".to_string())
            .spawn(move || serve(router, host, port, attempt, report_tx, shutdown_rx))
            .map_err(|e| {
                self.set_state(ServerState::Stopped);
                ApiError::Spawn(e)
            })?;

        match report_rx.recv_timeout(self.start_timeout) {
            Ok(Ok(addr)) => {
                info!("HTTP API listening on http://{}", addr);
                self.shutdown = Some(shutdown_tx);
                self.worker = Some(worker);
                Ok(addr)
            }
            Ok(Err(e)) => {
                error!("{}", e);
                if worker.join().is_err() {
                    error!("HTTP API thread panicked");
                }
                Err(e)
            }
            Err(RecvTimeoutError::Timeout) => {
                // The worker finds the report channel closed and exits on its own
                self.set_state(ServerState::Stopping);
                drop(shutdown_tx);
                error!(
                    "HTTP API on {} did not start within {:?}",
                    config.address(),
                    self.start_timeout
                );
                Err(ApiError::StartTimeout(self.start_timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                if worker.join().is_err() {
                    error!("HTTP API thread panicked during start-up");
                }
                self.set_state(ServerState::Stopped);
                Err(ApiError::WorkerExited)
            }
        }
    }

    /// Shut the listener down and join the worker
    ///
    /// Waits for in-flight requests, including any holding the control lock.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        if self.is_running() {
            self.set_state(ServerState::Stopping);
        }
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if worker.join().is_err() {
            error!("HTTP API thread panicked");
        }

        self.set_state(ServerState::Stopped);
        info!("HTTP API stopped");
    }

    pub fn is_running(&self) -> bool {
        self.state() == ServerState::Running
    }

    pub fn state(&self) -> ServerState {
        self.lifecycle.borrow().state
    }
}

impl Drop for HttpApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Body of the `http-api` thread
fn serve(
    router: Router,
    host: String,
    port: u16,
    state: AttemptState,
    report: SyncSender<BindReport>,
    shutdown: oneshot::Receiver<()>,
) {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("http-api-worker")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            state.set(ServerState::BindFailed);
            let _ = report.send(Err(ApiError::Runtime(e)));
            return;
        }
    };

    let served = runtime.block_on(async {
        let addr = format!("{host}:{port}");
        let bound = match TcpListener::bind((host.as_str(), port)).await {
            Ok(listener) => listener.local_addr().map(|local| (listener, local)),
            Err(e) => Err(e),
        };
        let (listener, local) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                state.set(ServerState::BindFailed);
                let _ = report.send(Err(ApiError::Bind { addr, source }));
                return false;
            }
        };

        if !state.advance(ServerState::Starting, ServerState::Bound)
            || !state.advance(ServerState::Bound, ServerState::Running)
            || report.send(Ok(local)).is_err()
        {
            debug!("HTTP API start abandoned, closing {}", local);
            state.set(ServerState::Stopped);
            return false;
        }

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.await;
                debug!("HTTP API shutdown requested");
            })
            .await;
        if let Err(e) = result {
            error!("HTTP API server error: {}", e);
        }
        true
    });

    if served {
        state.set(ServerState::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{TcpListener as StdListener, TcpStream};

    use serde_json::Value;

    use super::*;
    use crate::protocols::testing::{RecordingTransport, fake_displays};

    fn local_config(port: u16) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            enabled: true,
        }
    }

    fn server() -> HttpApiServer {
        let control = Arc::new(MonitorControl::new(Box::new(RecordingTransport::new())));
        control.initialize(|| Ok(fake_displays())).unwrap();
        HttpApiServer::new(control)
    }

    fn request(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, Value) {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        write!(
            stream,
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        let status = response
            .split(' ')
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap();
        let (_, body) = response.split_once("\r\n\r\n").unwrap();
        (status, serde_json::from_str(body).unwrap())
    }

    #[test]
    fn test_start_serves_until_stopped() {
        let mut server = server();
        assert_eq!(server.state(), ServerState::Stopped);

        let addr = server.start(local_config(0)).unwrap();

        assert!(server.is_running());
        assert_ne!(addr.port(), 0);
        let (status, body) = request(addr, "GET", "/health", "");
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");

        server.stop();
        assert_eq!(server.state(), ServerState::Stopped);
        assert!(!server.is_running());
        assert!(TcpStream::connect(addr).is_err());
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut server = server();
        let addr = server.start(local_config(0)).unwrap();

        assert!(matches!(
            server.start(local_config(0)),
            Err(ApiError::AlreadyRunning)
        ));
        assert!(server.is_running());
        assert_eq!(request(addr, "GET", "/health", "").0, 200);
    }

    #[test]
    fn test_port_in_use_fails_within_timeout() {
        let occupied = StdListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();
        let mut server = server();

        let started = std::time::Instant::now();
        let err = server.start(local_config(port)).unwrap_err();

        assert!(started.elapsed() < START_TIMEOUT);
        assert!(matches!(err, ApiError::Bind { .. }));
        assert!(!server.is_running());
        assert_eq!(server.state(), ServerState::BindFailed);
    }

    #[test]
    fn test_bind_failure_is_not_overwritten() {
        let occupied = StdListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();
        let mut server = server();

        assert!(server.start(local_config(port)).is_err());
        // The worker has been joined; nothing may move the state afterwards
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(server.state(), ServerState::BindFailed);

        drop(occupied);
        let addr = server.start(local_config(port)).unwrap();
        assert_eq!(addr.port(), port);
        assert!(server.is_running());
    }

    fn wait_for(server: &HttpApiServer, state: ServerState) -> bool {
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while std::time::Instant::now() < deadline {
            if server.state() == state {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_start_timeout() {
        let mut server = server();
        server.start_timeout = Duration::ZERO;

        let err = server.start(local_config(0)).unwrap_err();

        assert!(matches!(err, ApiError::StartTimeout(_)));
        assert!(!server.is_running());
        // The abandoned worker closes its listener and records the stop
        assert!(wait_for(&server, ServerState::Stopped));
    }

    #[test]
    fn test_abandoned_worker_cannot_touch_next_start() {
        let mut server = server();
        server.start_timeout = Duration::ZERO;
        assert!(server.start(local_config(0)).is_err());

        server.start_timeout = START_TIMEOUT;
        let addr = server.start(local_config(0)).unwrap();

        // Give the abandoned worker time to finish its own transitions
        std::thread::sleep(Duration::from_millis(300));
        assert!(server.is_running());
        assert_eq!(request(addr, "GET", "/health", "").0, 200);

        server.stop();
        assert_eq!(server.state(), ServerState::Stopped);
    }

    #[test]
    fn test_disabled_config() {
        let mut server = server();
        let mut config = local_config(0);
        config.enabled = false;

        assert!(matches!(server.start(config), Err(ApiError::Disabled)));
        assert_eq!(server.state(), ServerState::Stopped);
    }

    #[test]
    fn test_restart_after_stop() {
        let mut server = server();
        server.start(local_config(0)).unwrap();
        server.stop();

        let addr = server.start(local_config(0)).unwrap();

        assert!(server.is_running());
        assert_eq!(request(addr, "GET", "/health", "").0, 200);
    }

    #[test]
    fn test_commands_over_the_wire() {
        let mut server = server();
        let addr = server.start(local_config(0)).unwrap();

        let (status, body) = request(addr, "POST", "/api/brightness", r#"{"value": 65}"#);
        assert_eq!(status, 200);
        assert_eq!(body["brightness"], 65);

        let (status, body) = request(addr, "POST", "/api/contrast", r#"{"value": 101}"#);
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);

        let (status, body) = request(addr, "GET", "/api/status", "");
        assert_eq!(status, 200);
        assert_eq!(body["brightness"], 65);
        assert_eq!(body["contrast"], 50);
        assert_eq!(body["status_message"], "Brightness set to 65%");
    }

    #[test]
    fn test_drop_stops_server() {
        let addr = {
            let mut server = server();
            server.start(local_config(0)).unwrap()
        };
        assert!(TcpStream::connect(addr).is_err());
    }
}

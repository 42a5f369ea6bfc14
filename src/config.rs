// SPDX-License-Identifier: GPL-3.0-only
//! HTTP API configuration
//!
//! Settings come from a `.env`-style file of `KEY=VALUE` lines:
//!
//! ```text
//! HTTP_HOST=127.0.0.1
//! HTTP_PORT=45678
//! API_ENABLED=true
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 45678;
pub const DEFAULT_API_ENABLED: bool = true;

/// Directory under the user config dir holding the fallback config file
pub const APP_DIR: &str = "monitor-control";
pub const CONFIG_FILE_NAME: &str = "config.env";

/// Parsed `KEY=VALUE` file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvFile {
    values: HashMap<String, String>,
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

impl EnvFile {
    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    /// Blank lines, `#` comments and lines without `=` are skipped.
    /// Later keys override earlier ones.
    pub fn parse(contents: &str) -> Self {
        let mut values = HashMap::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                debug!("Skipping malformed config line: {}", line);
                continue;
            };
            values.insert(
                key.trim().to_string(),
                strip_quotes(value.trim()).to_string(),
            );
        }

        Self { values }
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// Falls back to `default` when the key is missing or not an integer
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.values
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Accepts true/1/yes/on and false/0/no/off in any case
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key).map(|v| v.to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => true,
            Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => false,
            _ => default,
        }
    }
}

/// Where the HTTP API listens and whether it runs at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            enabled: DEFAULT_API_ENABLED,
        }
    }
}

impl ServerConfig {
    /// Load from a config file; a missing or unreadable file yields defaults
    pub fn load(path: &Path) -> Self {
        match EnvFile::load(path) {
            Ok(env) => {
                info!("Loaded configuration from {}", path.display());
                Self::from_env_file(&env)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Failed to read {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_env_file(env: &EnvFile) -> Self {
        let raw_port = env.get_int("HTTP_PORT", i64::from(DEFAULT_HTTP_PORT));
        let port = u16::try_from(raw_port).unwrap_or_else(|_| {
            warn!(
                "HTTP_PORT {} is not a valid port, using {}",
                raw_port, DEFAULT_HTTP_PORT
            );
            DEFAULT_HTTP_PORT
        });

        Self {
            host: env.get_string("HTTP_HOST", DEFAULT_HTTP_HOST),
            port,
            enabled: env.get_bool("API_ENABLED", DEFAULT_API_ENABLED),
        }
    }

    /// `host:port` as written in logs and bind errors
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Pick the config file: explicit path, then `./.env`, then the user config dir
pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    let local = PathBuf::from(".env");
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
        .unwrap_or(local)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_skips_comments_and_malformed_lines() {
        let env = EnvFile::parse(
            "# comment\n\n  HTTP_HOST = 0.0.0.0  \nnot a pair\nHTTP_PORT=8080\n",
        );

        assert_eq!(env.get_string("HTTP_HOST", "x"), "0.0.0.0");
        assert_eq!(env.get_int("HTTP_PORT", 0), 8080);
        assert_eq!(env.get_string("not a pair", "missing"), "missing");
        assert_eq!(env.get_string("# comment", "missing"), "missing");
    }

    #[test]
    fn test_quotes_are_stripped() {
        let env = EnvFile::parse("A=\"quoted value\"\nB='single'\nC=\"unbalanced'\nD=\"\n");

        assert_eq!(env.get_string("A", ""), "quoted value");
        assert_eq!(env.get_string("B", ""), "single");
        assert_eq!(env.get_string("C", ""), "\"unbalanced'");
        assert_eq!(env.get_string("D", ""), "\"");
    }

    #[test]
    fn test_value_may_contain_equals() {
        let env = EnvFile::parse("TOKEN=a=b=c\n");
        assert_eq!(env.get_string("TOKEN", ""), "a=b=c");
    }

    #[test]
    fn test_typed_getters_fall_back() {
        let env = EnvFile::parse("N=abc\nB=maybe\nY=Yes\nO=off\n");

        assert_eq!(env.get_int("N", 7), 7);
        assert_eq!(env.get_int("MISSING", 9), 9);
        assert!(env.get_bool("B", true));
        assert!(!env.get_bool("B", false));
        assert!(env.get_bool("Y", false));
        assert!(!env.get_bool("O", true));
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::from_env_file(&EnvFile::default());
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.address(), "127.0.0.1:45678");
        assert!(config.enabled);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = ServerConfig::from_env_file(&EnvFile::parse("HTTP_PORT=70000\n"));
        assert_eq!(config.port, DEFAULT_HTTP_PORT);

        let config = ServerConfig::from_env_file(&EnvFile::parse("HTTP_PORT=-1\n"));
        assert_eq!(config.port, DEFAULT_HTTP_PORT);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "HTTP_HOST=localhost").unwrap();
        writeln!(file, "HTTP_PORT=9000").unwrap();
        writeln!(file, "API_ENABLED=false").unwrap();

        let config = ServerConfig::load(file.path());

        assert_eq!(
            config,
            ServerConfig {
                host: "localhost".to_string(),
                port: 9000,
                enabled: false,
            }
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load(&dir.path().join("absent.env"));
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = PathBuf::from("/tmp/custom.env");
        assert_eq!(resolve_path(Some(path.clone())), path);
    }
}

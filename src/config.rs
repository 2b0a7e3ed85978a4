//! Server configuration.
//!
//! Loaded from environment variables with defaults that reproduce the
//! historical deployment (`0.0.0.0:8085`, log file next to the binary).
//! The binary also reads a `.env` file before calling [`ServerConfig::from_env`].

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Runtime configuration for the HTTP core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0)
    pub host: IpAddr,
    /// Bind port (default: 8085)
    pub port: u16,
    /// Payload log file; created on startup if missing.
    pub log_path: PathBuf,
    /// Tracing level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit tracing output as JSON lines.
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8085,
            log_path: PathBuf::from("http_logs.log"),
            log_level: String::from("info"),
            log_json: false,
        }
    }
}

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `BIMS_HOST`: bind address (default: 0.0.0.0)
    /// - `BIMS_PORT`: bind port (default: 8085)
    /// - `BIMS_LOG_PATH`: payload log file (default: ./http_logs.log)
    /// - `BIMS_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
    /// - `BIMS_LOG_JSON`: `true`/`1` for JSON tracing output (default: false)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(val) = lookup("BIMS_HOST") {
            config.host = val
                .parse()
                .map_err(|_| Error::config(format!("invalid BIMS_HOST: {val}")))?;
        }

        if let Some(val) = lookup("BIMS_PORT") {
            config.port = val
                .parse()
                .map_err(|_| Error::config(format!("invalid BIMS_PORT: {val}")))?;
        }

        if let Some(val) = lookup("BIMS_LOG_PATH") {
            config.log_path = PathBuf::from(val);
        }

        if let Some(val) = lookup("BIMS_LOG_LEVEL") {
            config.log_level = val.to_lowercase();
        }

        if let Some(val) = lookup("BIMS_LOG_JSON") {
            config.log_json = val.eq_ignore_ascii_case("true") || val == "1";
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.log_path.as_os_str().is_empty() {
            return Err(Error::config("BIMS_LOG_PATH must not be empty"));
        }
        if !LEVELS.contains(&self.log_level.as_str()) {
            return Err(Error::config(format!(
                "invalid BIMS_LOG_LEVEL: {} (expected one of {})",
                self.log_level,
                LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// The socket address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_historical_deployment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8085");
        assert_eq!(config.log_path, PathBuf::from("http_logs.log"));
        assert!(!config.log_json);
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("BIMS_HOST", "127.0.0.1"),
            ("BIMS_PORT", "9000"),
            ("BIMS_LOG_PATH", "/var/log/bims/http.log"),
            ("BIMS_LOG_LEVEL", "DEBUG"),
            ("BIMS_LOG_JSON", "1"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.log_path, PathBuf::from("/var/log/bims/http.log"));
        assert_eq!(config.log_level, "debug");
        assert!(config.log_json);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = load(&[("BIMS_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn bad_level_is_rejected() {
        assert!(load(&[("BIMS_LOG_LEVEL", "loud")]).is_err());
    }

    #[test]
    fn empty_log_path_is_rejected() {
        assert!(load(&[("BIMS_LOG_PATH", "")]).is_err());
    }
}

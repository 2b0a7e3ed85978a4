//! Unified error type.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// The error type returned by bims's fallible operations.
///
/// Application-level errors (400, 404, 501, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: reading configuration, opening the log sink,
/// installing the tracing subscriber, binding a port.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O errors not tied to a more specific startup step.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("configuration: {0}")]
    Config(String),

    /// The payload log file could not be created or opened.
    #[error("log sink {}: {source}", path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The listening socket could not be bound.
    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The global tracing subscriber could not be installed.
    #[error("telemetry: {0}")]
    Telemetry(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// A specialized Result type for bims operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_sink_error_names_the_path() {
        let err = Error::LogSink {
            path: PathBuf::from("/nope/http_logs.log"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("log sink /nope/http_logs.log: "), "{msg}");
    }

    #[test]
    fn bind_error_exposes_source() {
        use std::error::Error as _;

        let err = Error::Bind {
            addr: "0.0.0.0:8085".parse().unwrap(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().contains("0.0.0.0:8085"));
        assert!(err.source().is_some());
    }
}

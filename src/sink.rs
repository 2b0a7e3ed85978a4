//! The payload log file.
//!
//! One [`LogSink`] is opened at startup and shared by every request task.
//! Two kinds of entry land in it: a multi-line [`LogRecord`] per logged
//! exchange and a one-line [`AccessRecord`] per request. Each entry is
//! rendered to a single buffer and appended while the sink's lock is held, so
//! concurrent requests never interleave their lines.

use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Local};
use http::{Method, StatusCode};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// Placeholder written for a zero-length payload.
pub const EMPTY_PAYLOAD: &str = "[Empty]";

/// One request/response exchange as written to the log file.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub method: Method,
    pub path: String,
    pub request_id: Option<String>,
    pub request_body: Bytes,
    pub status: StatusCode,
    pub response_body: Bytes,
    pub duration: Duration,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.timestamp.format("%Y/%m/%d %H:%M:%S");
        writeln!(f, "{ts} Request: {} {}", self.method, self.path)?;
        if let Some(id) = &self.request_id {
            writeln!(f, "{ts} Request ID: {id}")?;
        }
        writeln!(f, "{ts} Request Payload: {}", payload_text(&self.request_body))?;
        writeln!(
            f,
            "{ts} Request Response: {} {}\nPayload: {}",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or(""),
            payload_text(&self.response_body),
        )?;
        writeln!(f, "{ts} Duration: {:?}", self.duration)?;
        writeln!(f)
    }
}

fn payload_text(body: &Bytes) -> std::borrow::Cow<'_, str> {
    if body.is_empty() {
        EMPTY_PAYLOAD.into()
    } else {
        String::from_utf8_lossy(body)
    }
}

/// One access-log line: what came in, who sent it, what went out.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub timestamp: DateTime<Local>,
    pub request_id: Option<String>,
    pub method: Method,
    pub path: String,
    pub client: Option<IpAddr>,
    pub status: StatusCode,
    pub bytes: usize,
    pub duration: Duration,
}

impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Access: ", self.timestamp.format("%Y/%m/%d %H:%M:%S"))?;
        if let Some(id) = &self.request_id {
            write!(f, "[{id}] ")?;
        }
        write!(f, "\"{} {}\" from ", self.method, self.path)?;
        match self.client {
            Some(ip) => write!(f, "{ip}")?,
            None => f.write_str("-")?,
        }
        writeln!(
            f,
            " - {} {}B in {:?}",
            self.status.as_u16(),
            self.bytes,
            self.duration,
        )
    }
}

/// Append-only, write-only handle on the payload log file.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl LogSink {
    /// Opens `path` for appending, creating the file and any missing parent
    /// directories first.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let sink_err = |source| Error::LogSink { path: path.clone(), source };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(sink_err)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(sink_err)?;

        debug!(path = %path.display(), "payload log opened");
        Ok(Self { path, file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry. The whole entry is written and flushed before the
    /// lock is released.
    pub async fn append(&self, entry: &impl fmt::Display) -> std::io::Result<()> {
        let text = entry.to_string();
        let mut file = self.file.lock().await;
        file.write_all(text.as_bytes()).await?;
        file.flush().await
    }

    /// Flushes anything still buffered; used on shutdown.
    pub async fn flush(&self) -> std::io::Result<()> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        file.sync_data().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;

    fn record(req: &'static str, res: &'static str) -> LogRecord {
        LogRecord {
            timestamp: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            method: Method::GET,
            path: "/check".to_owned(),
            request_id: None,
            request_body: Bytes::from_static(req.as_bytes()),
            status: StatusCode::OK,
            response_body: Bytes::from_static(res.as_bytes()),
            duration: Duration::from_micros(1500),
        }
    }

    #[test]
    fn renders_check_exchange() {
        let text = record("", "ok").to_string();
        assert_eq!(
            text,
            "2024/03/09 14:05:07 Request: GET /check\n\
             2024/03/09 14:05:07 Request Payload: [Empty]\n\
             2024/03/09 14:05:07 Request Response: 200 OK\n\
             Payload: ok\n\
             2024/03/09 14:05:07 Duration: 1.5ms\n\
             \n"
        );
    }

    #[test]
    fn empty_response_and_request_id() {
        let mut rec = record(r#"{"id":3}"#, "");
        rec.request_id = Some("7f0c".to_owned());
        rec.status = StatusCode::NO_CONTENT;
        let text = rec.to_string();
        assert!(text.contains("Request ID: 7f0c\n"));
        assert!(text.contains(r#"Request Payload: {"id":3}"#));
        assert!(text.contains("Request Response: 204 No Content\nPayload: [Empty]\n"));
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn renders_access_line() {
        let mut access = AccessRecord {
            timestamp: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            request_id: Some("7f0c".to_owned()),
            method: Method::OPTIONS,
            path: "/residents".to_owned(),
            client: Some(IpAddr::from([203, 0, 113, 9])),
            status: StatusCode::OK,
            bytes: 0,
            duration: Duration::from_micros(80),
        };
        assert_eq!(
            access.to_string(),
            "2024/03/09 14:05:07 Access: [7f0c] \"OPTIONS /residents\" from 203.0.113.9 - 200 0B in 80µs\n"
        );

        access.request_id = None;
        access.client = None;
        assert_eq!(
            access.to_string(),
            "2024/03/09 14:05:07 Access: \"OPTIONS /residents\" from - - 200 0B in 80µs\n"
        );
    }

    #[tokio::test]
    async fn open_creates_missing_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/bims/http_logs.log");
        let sink = LogSink::open(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(sink.path(), path);
    }

    #[tokio::test]
    async fn append_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("http_logs.log");
        std::fs::write(&path, "previous run\n").unwrap();

        let sink = LogSink::open(&path).await.unwrap();
        sink.append(&record("", "ok")).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("previous run\n"));
        assert!(text.ends_with("Duration: 1.5ms\n\n"));
    }

    #[tokio::test]
    async fn open_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let err = LogSink::open(blocker.join("http_logs.log")).await.unwrap_err();
        assert!(matches!(err, Error::LogSink { .. }));
    }

    #[tokio::test]
    async fn concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("http_logs.log");
        let sink = Arc::new(LogSink::open(&path).await.unwrap());

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..64 {
            let sink = Arc::clone(&sink);
            tasks.spawn(async move { sink.append(&record("payload", "ok")).await });
        }
        while let Some(res) = tasks.join_next().await {
            res.unwrap().unwrap();
        }

        let text = std::fs::read_to_string(&path).unwrap();
        let expected = record("payload", "ok").to_string();
        let chunks: Vec<&str> = text.split_inclusive("\n\n").collect();
        assert_eq!(chunks.len(), 64);
        assert!(chunks.iter().all(|c| *c == expected));
    }
}

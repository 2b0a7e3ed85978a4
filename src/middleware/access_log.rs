use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use tracing::{Instrument, error, info, info_span};

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::sink::{AccessRecord, LogSink};

/// Access log: one `info` event per request, emitted inside a `request` span
/// carrying the request id.
///
/// With a sink attached, each request also appends one [`AccessRecord`] line
/// to the log file. That covers requests the payload log skips, such as
/// preflights and panicked handlers.
#[derive(Debug, Clone, Default)]
pub struct AccessLog {
    sink: Option<Arc<LogSink>>,
}

impl AccessLog {
    /// Tracing events only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracing events plus one access line per request in `sink`.
    pub fn with_sink(sink: Arc<LogSink>) -> Self {
        Self { sink: Some(sink) }
    }
}

impl Middleware for AccessLog {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let sink = self.sink.clone();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let client = req.client_ip();
        let request_id = req.request_id().map(str::to_owned);
        let span = info_span!(
            "request",
            id = request_id.as_deref().unwrap_or("-"),
            method = %method,
            path = %path,
        );

        Box::pin(
            async move {
                let timestamp = Local::now();
                let start = Instant::now();
                let res = next.run(req).await;
                let duration = start.elapsed();
                info!(
                    client = %client.map(|ip| ip.to_string()).unwrap_or_default(),
                    status = res.status_code().as_u16(),
                    bytes = res.body().len(),
                    elapsed_ms = duration.as_secs_f64() * 1000.0,
                    "{method} {path}",
                );

                if let Some(sink) = sink {
                    let access = AccessRecord {
                        timestamp,
                        request_id,
                        method,
                        path,
                        client,
                        status: res.status_code(),
                        bytes: res.body().len(),
                        duration,
                    };
                    if let Err(e) = sink.append(&access).await {
                        error!(path = %sink.path().display(), error = %e, "failed to write access line");
                    }
                }
                res
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    use super::*;
    use crate::{Response, Router};

    fn get(path: &str) -> Request {
        Request::from_http(http::Request::get(path).body(Full::new(Bytes::new())).unwrap())
    }

    #[tokio::test]
    async fn writes_one_line_per_request() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(LogSink::open(dir.path().join("access.log")).await.unwrap());
        let app = Arc::new(
            Router::new()
                .layer(AccessLog::with_sink(Arc::clone(&sink)))
                .get("/positions", |_req: Request| async { Response::json(r#"["Captain"]"#) }),
        );

        assert_eq!(app.handle(get("/positions")).await.status_code(), StatusCode::OK);
        assert_eq!(app.handle(get("/nowhere")).await.status_code(), StatusCode::NOT_FOUND);

        let text = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2, "{text}");
        assert!(lines[0].contains(" Access: \"GET /positions\" from - - 200 11B in "), "{text}");
        assert!(lines[1].contains(" Access: \"GET /nowhere\" from - - 404 18B in "), "{text}");
    }

    #[tokio::test]
    async fn without_sink_only_traces() {
        let app = Arc::new(
            Router::new()
                .layer(AccessLog::new())
                .get("/check", |_req: Request| async { "ok" }),
        );
        let res = app.handle(get("/check")).await;
        assert_eq!(res.body().as_ref(), b"ok");
    }
}

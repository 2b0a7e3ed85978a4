//! Payload logging and CORS.
//!
//! For every non-`OPTIONS` request the body is buffered (and replayed to the
//! handler), the rest of the chain runs, and the captured response is written
//! to the [`LogSink`] before being sent on unchanged.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    HeaderValue,
};
use http::{Method, StatusCode};
use tracing::{error, warn};

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;
use crate::sink::{LogRecord, LogSink};

/// Body sent when the request payload cannot be read.
pub const BODY_READ_ERROR: &str = "Error reading request body";

/// Captures request/response payloads into the log file and answers CORS
/// preflights.
///
/// - Every response carries permissive `Access-Control-Allow-*` headers;
///   headers set by the handler take precedence.
/// - `OPTIONS` is answered `200` with an empty body; nothing further runs and
///   nothing is logged.
/// - A body that fails to read yields `400` and the handler is skipped.
/// - A failed log write is traced and otherwise ignored.
#[derive(Debug, Clone)]
pub struct PayloadLog {
    sink: Arc<LogSink>,
}

impl PayloadLog {
    pub fn new(sink: Arc<LogSink>) -> Self {
        Self { sink }
    }
}

impl Middleware for PayloadLog {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let sink = Arc::clone(&self.sink);
        Box::pin(log_exchange(sink, req, next))
    }
}

async fn log_exchange(sink: Arc<LogSink>, mut req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return with_cors(Response::status(StatusCode::OK));
    }

    let request_body = match req.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(method = %req.method(), path = req.path(), error = %e, "failed to read request body");
            let res = Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("x-content-type-options", "nosniff")
                .text(BODY_READ_ERROR);
            return with_cors(res);
        }
    };

    let method = req.method().clone();
    let path = req.path().to_owned();
    let request_id = req.request_id().map(str::to_owned);

    let timestamp = Local::now();
    let start = Instant::now();
    let recorded = next.run(req).await;
    let duration = start.elapsed();

    let record = LogRecord {
        timestamp,
        method,
        path,
        request_id,
        request_body,
        status: recorded.status_code(),
        response_body: recorded.body().clone(),
        duration,
    };
    if let Err(e) = sink.append(&record).await {
        error!(path = %sink.path().display(), error = %e, "failed to write payload record");
    }

    with_cors(recorded)
}

/// Adds the permissive CORS headers; a name the handler already set is left
/// alone.
pub(super) fn with_cors(mut res: Response) -> Response {
    let headers = res.headers_mut();
    for name in [
        ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_HEADERS,
    ] {
        headers.entry(name).or_insert(HeaderValue::from_static("*"));
    }
    res
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::header::CONTENT_TYPE;

    use super::*;

    #[test]
    fn cors_defaults_are_added() {
        let res = with_cors(Response::text("ok"));
        assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_METHODS], "*");
        assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_HEADERS], "*");
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(res.body(), &Bytes::from_static(b"ok"));
    }

    #[test]
    fn handler_headers_override_defaults_and_keep_repeats() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .header("access-control-allow-origin", "https://office.example")
            .header("set-cookie", "a=1")
            .header("set-cookie", "b=2")
            .json(r#"{"id":1}"#);
        let res = with_cors(res);

        assert_eq!(res.status_code(), StatusCode::CREATED);
        let origins: Vec<_> = res.headers().get_all(ACCESS_CONTROL_ALLOW_ORIGIN).iter().collect();
        assert_eq!(origins, ["https://office.example"]);
        let cookies: Vec<_> = res.headers().get_all("set-cookie").iter().collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
        assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_METHODS], "*");
    }
}

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use http::StatusCode;
use tracing::error;

use super::payload::with_cors;
use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// Catches a panic anywhere further down the chain and answers
/// `500 Internal Server Error` with an empty body. The connection and the
/// process survive.
///
/// The unwind skips [`PayloadLog`](super::PayloadLog), so the 500 gets the
/// same CORS headers here and no payload record is written.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recover;

impl Middleware for Recover {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let method = req.method().clone();
        let path = req.path().to_owned();

        Box::pin(async move {
            match AssertUnwindSafe(next.run(req)).catch_unwind().await {
                Ok(res) => res,
                Err(panic) => {
                    error!(%method, %path, panic = panic_message(&*panic), "handler panicked");
                    with_cors(Response::status(StatusCode::INTERNAL_SERVER_ERROR))
                }
            }
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

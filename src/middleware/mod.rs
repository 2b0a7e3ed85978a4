//! Middleware layer.
//!
//! Middleware wraps the whole router: it runs for every request, including
//! ones that match no route, which is what lets [`PayloadLog`] answer CORS
//! preflights for any path.
//!
//! A middleware receives the request and a [`Next`]. Calling
//! [`Next::run`] invokes the rest of the chain and yields its buffered
//! [`Response`]; not calling it short-circuits.
//!
//! Built-in middleware, in the order [`routes::router`](crate::routes::router)
//! stacks them (outermost first):
//!
//! - [`RequestId`]: correlation id per request
//! - [`RealIp`]: client address from proxy headers
//! - [`AccessLog`]: one tracing event and one log-file line per request
//! - [`Recover`]: turns a panicking handler into a 500 (with CORS headers)
//! - [`PayloadLog`]: CORS, request/response payload log file

mod access_log;
mod payload;
mod real_ip;
mod recover;
mod request_id;

use std::future::Future;
use std::sync::Arc;

use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

pub use access_log::AccessLog;
pub use payload::PayloadLog;
pub use real_ip::RealIp;
pub use recover::Recover;
pub use request_id::RequestId;

/// A layer in the router's middleware stack.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

/// The remainder of the middleware chain, ending in route dispatch.
#[derive(Clone)]
pub struct Next {
    router: Arc<Router>,
    index: usize,
}

impl Next {
    pub(crate) fn new(router: Arc<Router>) -> Self {
        Self { router, index: 0 }
    }

    /// Runs the rest of the chain against `req`.
    pub async fn run(mut self, req: Request) -> Response {
        match self.router.layer_at(self.index) {
            Some(layer) => {
                self.index += 1;
                layer.call(req, self).await
            }
            None => self.router.dispatch(req).await,
        }
    }
}

/// Adapts an async function into a [`Middleware`].
///
/// ```rust,no_run
/// use bims::middleware::{from_fn, Next};
/// use bims::{Request, Response, Router};
///
/// async fn tag(req: Request, next: Next) -> Response {
///     let mut res = next.run(req).await;
///     res.headers_mut().insert("x-office", "barangay".parse().unwrap());
///     res
/// }
///
/// let app = Router::new().layer(from_fn(tag));
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn(f)
}

/// Middleware built by [`from_fn`].
pub struct FromFn<F>(F);

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self.0)(req, next))
    }
}

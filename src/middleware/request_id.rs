use uuid::Uuid;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// Header read for an upstream-assigned id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assigns every request a correlation id.
///
/// An inbound `X-Request-Id` is kept as-is; otherwise a random UUID is
/// generated. The id is available through [`Request::request_id`] and ends up
/// in both the access log and the payload record.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestId;

impl Middleware for RequestId {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture {
        let id = req
            .header(REQUEST_ID_HEADER)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        req.set_request_id(id);
        Box::pin(next.run(req))
    }
}

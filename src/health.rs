//! Service check handler.
//!
//! `GET /check` answers `200 ok` whenever the process can serve HTTP at all.
//! It has no dependencies on the records backend, so deploy scripts and load
//! balancers can probe it before a database is reachable.

use crate::{Request, Response};

/// `GET /check` → `200 OK`, body `ok`.
pub async fn check(_req: Request) -> Response {
    Response::text("ok")
}

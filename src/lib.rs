//! # bims
//!
//! HTTP core of a records-office backend: resident registry, document
//! issuance (clearances, indigency certificates, referrals), user accounts,
//! file/PDF serving and reporting.
//!
//! The crate owns the route table, the middleware chain and the payload log.
//! The records backend itself plugs in through [`RecordsOffice`].
//!
//! - Radix-tree routing via [`matchit`], one tree per method
//! - hyper on tokio, HTTP/1.1 and HTTP/2, graceful shutdown
//! - Payload logging: every exchange appended to one log file, with
//!   request/response bodies and duration ([`middleware::PayloadLog`])
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bims::{LogSink, RecordsOffice, Request, Response, Server, routes};
//!
//! struct Office;
//!
//! impl RecordsOffice for Office {
//!     async fn read_residents(&self, _req: Request) -> Response {
//!         Response::json(r#"[{"id":1,"name":"Maria Santos"}]"#)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> bims::Result<()> {
//!     let sink = Arc::new(LogSink::open("http_logs.log").await?);
//!     let app = routes::router(Arc::new(Office), sink);
//!     Server::bind("0.0.0.0:8085".parse().unwrap()).await?.serve(app).await
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod health;
pub mod middleware;
pub mod routes;
pub mod sink;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use handler::{BoxFuture, Handler};
pub use http::{HeaderMap, Method, StatusCode};
pub use request::{Body, BoxError, Request};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use routes::{RecordsOffice, Unprovisioned};
pub use server::Server;
pub use sink::{AccessRecord, LogRecord, LogSink};

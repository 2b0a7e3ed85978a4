//! The records-office route table.
//!
//! Every endpoint except `GET /check` belongs to the records backend
//! (accounts, residents, documents, files, reports). The backend plugs in by
//! implementing [`RecordsOffice`]; anything it leaves out answers
//! `501 Not Implemented`.
//!
//! | Method | Path | Endpoint |
//! |---|---|---|
//! | GET | `/check` | [`health::check`] |
//! | POST | `/login` | [`RecordsOffice::login`] |
//! | POST | `/change_password` | [`RecordsOffice::change_password`] |
//! | POST | `/upload` | [`RecordsOffice::upload_user_profile`] |
//! | GET | `/files/{userID}/{filename}` | [`RecordsOffice::serve_file`] |
//! | GET DELETE PUT POST | `/users` | `read_users` `delete_users` `update_users` `create_users` |
//! | POST | `/new` | [`RecordsOffice::new_document`] |
//! | GET DELETE PUT | `/residents` | `read_residents` `delete_residents` `update_residents` |
//! | GET DELETE PUT | `/indigencies` | `read_indigencies` `delete_indigencies` `update_indigencies` |
//! | GET DELETE PUT | `/clearance` | `read_clearance` `delete_clearance` `update_clearance` |
//! | GET DELETE PUT | `/referrals` | `read_referrals` `delete_referrals` `update_referrals` |
//! | GET | `/positions` | [`RecordsOffice::read_positions`] |
//! | GET | `/clearances/{residentID}/{documentID}/{filename}` | [`RecordsOffice::serve_clearance_pdf`] |
//! | GET | `/indigencies/{residentID}/{documentID}/{filename}` | [`RecordsOffice::serve_indigency_pdf`] |
//! | GET | `/referrals/{residentID}/{documentID}/{filename}` | [`RecordsOffice::serve_referral_pdf`] |
//! | GET | `/graph_data` | [`RecordsOffice::monthly_graph`] |
//! | GET | `/total_monthly_data` | [`RecordsOffice::monthly_document_totals`] |

use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use tracing::debug;

use crate::health;
use crate::middleware::{AccessLog, PayloadLog, RealIp, Recover, RequestId};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::sink::LogSink;

/// Declares the backend trait: one overridable endpoint per method name,
/// each defaulting to `501 Not Implemented`.
macro_rules! records_office {
    ($( $(#[$doc:meta])* $name:ident; )+) => {
        /// The records backend behind the router.
        ///
        /// Implement the endpoints your backend supports; the rest answer
        /// `501`. Implementations may use `async fn`:
        ///
        /// ```rust,no_run
        /// use bims::{RecordsOffice, Request, Response};
        ///
        /// struct Office;
        ///
        /// impl RecordsOffice for Office {
        ///     async fn read_positions(&self, _req: Request) -> Response {
        ///         Response::json(r#"["Captain","Secretary","Treasurer"]"#)
        ///     }
        /// }
        /// ```
        pub trait RecordsOffice: Send + Sync + 'static {
            $(
                $(#[$doc])*
                fn $name(&self, req: Request) -> impl Future<Output = Response> + Send {
                    not_implemented(req)
                }
            )+
        }
    };
}

records_office! {
    /// `POST /login`
    login;
    /// `POST /change_password`
    change_password;
    /// `POST /upload`: user profile picture.
    upload_user_profile;
    /// `GET /files/{userID}/{filename}`
    serve_file;
    /// `GET /users`
    read_users;
    /// `DELETE /users`
    delete_users;
    /// `PUT /users`
    update_users;
    /// `POST /users`
    create_users;
    /// `POST /new`: new document application.
    new_document;
    /// `GET /residents`
    read_residents;
    /// `DELETE /residents`
    delete_residents;
    /// `PUT /residents`
    update_residents;
    /// `GET /indigencies`
    read_indigencies;
    /// `DELETE /indigencies`
    delete_indigencies;
    /// `PUT /indigencies`
    update_indigencies;
    /// `GET /clearance`
    read_clearance;
    /// `DELETE /clearance`
    delete_clearance;
    /// `PUT /clearance`
    update_clearance;
    /// `GET /referrals`
    read_referrals;
    /// `DELETE /referrals`
    delete_referrals;
    /// `PUT /referrals`
    update_referrals;
    /// `GET /positions`
    read_positions;
    /// `GET /clearances/{residentID}/{documentID}/{filename}`
    serve_clearance_pdf;
    /// `GET /indigencies/{residentID}/{documentID}/{filename}`
    serve_indigency_pdf;
    /// `GET /referrals/{residentID}/{documentID}/{filename}`
    serve_referral_pdf;
    /// `GET /graph_data`
    monthly_graph;
    /// `GET /total_monthly_data`
    monthly_document_totals;
}

async fn not_implemented(req: Request) -> Response {
    debug!(method = %req.method(), path = req.path(), "endpoint not provided by backend");
    Response::builder()
        .status(StatusCode::NOT_IMPLEMENTED)
        .text("not implemented")
}

/// A backend with no endpoints: only `/check` answers `200`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unprovisioned;

impl RecordsOffice for Unprovisioned {}

/// Turns `office.$method(req)` into a route handler.
macro_rules! endpoint {
    ($office:expr, $method:ident) => {{
        let office = Arc::clone(&$office);
        move |req: Request| {
            let office = Arc::clone(&office);
            async move { office.$method(req).await }
        }
    }};
}

/// Builds the full router: middleware chain plus every records-office route.
///
/// Chain, outermost first: [`RequestId`], [`RealIp`], [`AccessLog`],
/// [`Recover`], [`PayloadLog`]. `sink` receives both the access lines and the
/// payload records.
pub fn router<O: RecordsOffice>(office: Arc<O>, sink: Arc<LogSink>) -> Router {
    Router::new()
        .layer(RequestId)
        .layer(RealIp)
        .layer(AccessLog::with_sink(Arc::clone(&sink)))
        .layer(Recover)
        .layer(PayloadLog::new(sink))
        .get("/check", health::check)
        .post("/login", endpoint!(office, login))
        .post("/change_password", endpoint!(office, change_password))
        .post("/upload", endpoint!(office, upload_user_profile))
        .get("/files/{userID}/{filename}", endpoint!(office, serve_file))
        .get("/users", endpoint!(office, read_users))
        .delete("/users", endpoint!(office, delete_users))
        .put("/users", endpoint!(office, update_users))
        .post("/users", endpoint!(office, create_users))
        .post("/new", endpoint!(office, new_document))
        .get("/residents", endpoint!(office, read_residents))
        .delete("/residents", endpoint!(office, delete_residents))
        .put("/residents", endpoint!(office, update_residents))
        .get("/indigencies", endpoint!(office, read_indigencies))
        .delete("/indigencies", endpoint!(office, delete_indigencies))
        .put("/indigencies", endpoint!(office, update_indigencies))
        .get("/clearance", endpoint!(office, read_clearance))
        .delete("/clearance", endpoint!(office, delete_clearance))
        .put("/clearance", endpoint!(office, update_clearance))
        .get("/referrals", endpoint!(office, read_referrals))
        .delete("/referrals", endpoint!(office, delete_referrals))
        .put("/referrals", endpoint!(office, update_referrals))
        .get("/positions", endpoint!(office, read_positions))
        .get(
            "/clearances/{residentID}/{documentID}/{filename}",
            endpoint!(office, serve_clearance_pdf),
        )
        .get(
            "/indigencies/{residentID}/{documentID}/{filename}",
            endpoint!(office, serve_indigency_pdf),
        )
        .get(
            "/referrals/{residentID}/{documentID}/{filename}",
            endpoint!(office, serve_referral_pdf),
        )
        .get("/graph_data", endpoint!(office, monthly_graph))
        .get("/total_monthly_data", endpoint!(office, monthly_document_totals))
}

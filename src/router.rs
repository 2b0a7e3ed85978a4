//! Radix-tree request router with a middleware stack.
//!
//! One tree per HTTP method, O(path-length) lookup. Middleware added with
//! [`Router::layer`] wraps every request, matched or not; the first layer
//! added is the outermost.

use std::collections::HashMap;
use std::sync::Arc;

use http::header::{ALLOW, HeaderValue};
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup and hand it to [`Server::serve`](crate::Server::serve).
/// Every registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    layers: Vec<Arc<dyn Middleware>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), layers: Vec::new() }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax and are read with
    /// [`Request::param`]:
    ///
    /// ```rust,no_run
    /// # use bims::{Method, Request, Response, Router};
    /// # async fn serve_file(_: Request) -> Response { Response::text("") }
    /// # async fn read_users(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET, "/files/{userID}/{filename}", serve_file)
    ///     .on(Method::GET, "/users",                     read_users);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is malformed or conflicts with a route already
    /// registered for `method`. Routes are fixed at startup, so this surfaces
    /// on the first run.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Appends a middleware. Layers run in the order they were added.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Runs `req` through the middleware stack and the matched handler.
    pub async fn handle(self: &Arc<Self>, req: Request) -> Response {
        Next::new(Arc::clone(self)).run(req).await
    }

    pub(crate) fn layer_at(&self, index: usize) -> Option<Arc<dyn Middleware>> {
        self.layers.get(index).cloned()
    }

    /// Innermost step of the chain: route lookup and handler call.
    pub(crate) async fn dispatch(&self, mut req: Request) -> Response {
        match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.set_params(params);
                handler.call(req).await
            }
            None => self.unmatched(req.method(), req.path()),
        }
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// 405 with an `Allow` header when another method owns the path, else 404.
    fn unmatched(&self, method: &Method, path: &str) -> Response {
        let mut allowed: Vec<&str> = self.routes.iter()
            .filter(|(m, tree)| *m != method && tree.at(path).is_ok())
            .map(|(m, _)| m.as_str())
            .collect();

        if allowed.is_empty() {
            return Response::builder()
                .status(StatusCode::NOT_FOUND)
                .text("404 page not found");
        }

        allowed.sort_unstable();
        let mut res = Response::status(StatusCode::METHOD_NOT_ALLOWED);
        if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
            res.headers_mut().insert(ALLOW, value);
        }
        res
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http_body_util::Full;

    use super::*;
    use crate::middleware::from_fn;

    fn request(method: Method, path: &str) -> Request {
        Request::from_http(
            http::Request::builder()
                .method(method)
                .uri(path)
                .body(Full::new(Bytes::new()))
                .unwrap(),
        )
    }

    async fn echo_user(req: Request) -> Response {
        let user = req.param("userID").unwrap_or("?");
        let file = req.param("filename").unwrap_or("?");
        Response::text(format!("{user}:{file}"))
    }

    #[tokio::test]
    async fn params_are_extracted_by_name() {
        let app = Arc::new(Router::new().get("/files/{userID}/{filename}", echo_user));
        let res = app.handle(request(Method::GET, "/files/7/avatar.png")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"7:avatar.png");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let app = Arc::new(Router::new().get("/check", |_req: Request| async { "ok" }));
        let res = app.handle(request(Method::GET, "/nope")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.body().as_ref(), b"404 page not found");
    }

    #[tokio::test]
    async fn wrong_method_is_405_with_allow() {
        let app = Arc::new(
            Router::new()
                .get("/residents", |_req: Request| async { "list" })
                .put("/residents", |_req: Request| async { "updated" }),
        );
        let res = app.handle(request(Method::POST, "/residents")).await;
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[ALLOW], "GET, PUT");
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn layers_run_outermost_first_and_wrap_misses() {
        let app = Arc::new(
            Router::new()
                .layer(from_fn(|req, next: Next| async move {
                    let mut res = next.run(req).await;
                    res.headers_mut().append("x-trail", HeaderValue::from_static("outer"));
                    res
                }))
                .layer(from_fn(|req, next: Next| async move {
                    let mut res = next.run(req).await;
                    res.headers_mut().append("x-trail", HeaderValue::from_static("inner"));
                    res
                })),
        );
        let res = app.handle(request(Method::GET, "/unrouted")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        let trail: Vec<_> = res.headers().get_all("x-trail").iter().collect();
        assert_eq!(trail, ["inner", "outer"]);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let _ = Router::new()
            .get("/users/{id}", |_req: Request| async { "a" })
            .get("/users/{name}", |_req: Request| async { "b" });
    }
}

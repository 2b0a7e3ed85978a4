//! Incoming HTTP request type.
//!
//! The body stays a stream until someone asks for it. [`Request::bytes`]
//! buffers it and puts a replayable copy back, so a middleware can read the
//! payload and the handler behind it still sees the same bytes.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Body as HttpBody;

/// Boxed error produced by a request body stream.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The type-erased request body.
pub type Body = UnsyncBoxBody<Bytes, BoxError>;

/// An incoming HTTP request.
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
    params: HashMap<String, String>,
    peer_addr: Option<SocketAddr>,
    client_ip: Option<IpAddr>,
    request_id: Option<String>,
}

impl Request {
    /// Wraps any `http::Request` whose body yields [`Bytes`].
    pub fn from_http<B>(req: http::Request<B>) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body: body.map_err(<B::Error as Into<BoxError>>::into).boxed_unsync(),
            params: HashMap::new(),
            peer_addr: None,
            client_ip: None,
            request_id: None,
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn query(&self) -> Option<&str> { self.uri.query() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Header lookup; names are case-insensitive. Non-UTF-8 values read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/files/{userID}/{filename}`, `req.param("userID")` on
    /// `/files/7/avatar.png` returns `Some("7")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Reads the whole body into memory.
    ///
    /// The buffered bytes are put back as the new body, so calling this again
    /// (or handing the request on) yields exactly the same payload.
    pub async fn bytes(&mut self) -> Result<Bytes, BoxError> {
        let body = std::mem::replace(&mut self.body, empty_body());
        let bytes = body.collect().await?.to_bytes();
        self.body = Full::new(bytes.clone())
            .map_err(|never| match never {})
            .boxed_unsync();
        Ok(bytes)
    }

    /// Address of the TCP peer, when served from a socket.
    pub fn peer_addr(&self) -> Option<SocketAddr> { self.peer_addr }

    /// Client address: the forwarded IP if a proxy supplied one, else the peer.
    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_ip.or(self.peer_addr.map(|a| a.ip()))
    }

    /// Correlation id assigned by [`RequestId`](crate::middleware::RequestId).
    pub fn request_id(&self) -> Option<&str> { self.request_id.as_deref() }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub(crate) fn set_peer_addr(&mut self, addr: SocketAddr) {
        self.peer_addr = Some(addr);
    }

    pub(crate) fn set_client_ip(&mut self, ip: IpAddr) {
        self.client_ip = Some(ip);
    }

    pub(crate) fn set_request_id(&mut self, id: String) {
        self.request_id = Some(id);
    }
}

fn empty_body() -> Body {
    Empty::new().map_err(|never| match never {}).boxed_unsync()
}

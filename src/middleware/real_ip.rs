use std::net::IpAddr;

use super::{Middleware, Next};
use crate::handler::BoxFuture;
use crate::request::Request;

/// Headers consulted in order; the first one holding a valid IP wins.
const FORWARDING_HEADERS: [&str; 3] = ["true-client-ip", "x-real-ip", "x-forwarded-for"];

/// Replaces the client address with the one a reverse proxy reported.
///
/// For `X-Forwarded-For` only the first (original client) entry is used.
/// Headers that do not parse as an IP are ignored and the TCP peer address
/// stays in effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealIp;

impl Middleware for RealIp {
    fn call(&self, mut req: Request, next: Next) -> BoxFuture {
        if let Some(ip) = forwarded_ip(&req) {
            req.set_client_ip(ip);
        }
        Box::pin(next.run(req))
    }
}

fn forwarded_ip(req: &Request) -> Option<IpAddr> {
    FORWARDING_HEADERS.iter().find_map(|name| {
        let value = req.header(name)?;
        let first = value.split(',').next()?.trim();
        first.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http_body_util::Full;

    use super::*;

    fn with_headers(headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::get("/residents");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        Request::from_http(builder.body(Full::new(Bytes::new())).unwrap())
    }

    #[test]
    fn true_client_ip_wins() {
        let req = with_headers(&[
            ("x-forwarded-for", "198.51.100.1"),
            ("true-client-ip", "203.0.113.7"),
        ]);
        assert_eq!(forwarded_ip(&req), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn first_forwarded_for_entry_is_the_client() {
        let req = with_headers(&[("x-forwarded-for", "198.51.100.1, 10.0.0.2, 10.0.0.3")]);
        assert_eq!(forwarded_ip(&req), Some("198.51.100.1".parse().unwrap()));
    }

    #[test]
    fn garbage_falls_through() {
        let req = with_headers(&[("x-real-ip", "not-an-ip"), ("x-forwarded-for", "2001:db8::1")]);
        assert_eq!(forwarded_ip(&req), Some("2001:db8::1".parse().unwrap()));

        let req = with_headers(&[("x-real-ip", "unknown")]);
        assert_eq!(forwarded_ip(&req), None);
    }
}

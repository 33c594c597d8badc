//! Request adapter consumed by the router.
//!
//! # Responsibilities
//! - Carry the routing-relevant view of an HTTP request (method, path,
//!   query string, negotiated format, host, context and servlet paths)
//! - Receive the outcome of forward dispatch (`route_args`, `action`)
//! - Serve as the "current request" for reverse resolution and URL finishing
//!
//! # Design Decisions
//! - Plain owned data; the router mutates `method`, `format`, `route_args`
//!   and `action` during dispatch and nothing else
//! - Building from an `http::Request` negotiates the format from the first
//!   `Accept` entry; `*/*` means no preference

use std::collections::HashMap;

use axum::http::{header, Request};

use crate::http::media::MediaType;

/// The routing view of one HTTP request.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    /// HTTP method. May be rewritten by a method override or the HEAD fallback.
    pub method: String,
    /// Request path, including the context path if one is configured.
    pub path: String,
    /// Raw query string without the leading `?`. Empty when absent.
    pub querystring: String,
    /// Negotiated response format.
    pub format: Option<MediaType>,
    /// Host name without port.
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Whether the request arrived over HTTPS.
    pub secure: bool,
    /// Application mount point, e.g. `/app`. Empty when mounted at the root.
    pub context_path: String,
    /// Dispatcher mount point below the context path.
    pub servlet_path: String,
    /// Arguments bound by the winning route.
    pub route_args: HashMap<String, String>,
    /// Concrete action of the winning route.
    pub action: Option<String>,
}

impl RouteRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Build the routing view of an `http::Request`.
    pub fn from_http<B>(req: &Request<B>) -> Self {
        let uri = req.uri();
        let authority = req
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|a| a.as_str().to_string()));
        let (host, port) = match authority {
            Some(authority) => split_authority(&authority),
            None => (None, None),
        };

        let forwarded_https = req
            .headers()
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"));

        let format = req
            .headers()
            .get(header::ACCEPT)
            .and_then(|h| h.to_str().ok())
            .and_then(|accept| accept.split(',').next())
            .and_then(MediaType::parse)
            .filter(|mt| *mt != MediaType::all());

        Self {
            method: req.method().as_str().to_string(),
            path: uri.path().to_string(),
            querystring: uri.query().unwrap_or_default().to_string(),
            format,
            host,
            port,
            secure: uri.scheme_str() == Some("https") || forwarded_https,
            ..Self::default()
        }
    }

    pub fn with_query(mut self, querystring: impl Into<String>) -> Self {
        self.querystring = querystring.into();
        self
    }

    pub fn with_format(mut self, format: MediaType) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }

    pub fn with_servlet_path(mut self, servlet_path: impl Into<String>) -> Self {
        self.servlet_path = servlet_path.into();
        self
    }

    /// Scheme, host and non-default port, e.g. `https://example.com:8443`.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        let host = self.host.as_deref().unwrap_or("localhost");
        match self.port {
            Some(80) if !self.secure => format!("{scheme}://{host}"),
            Some(443) if self.secure => format!("{scheme}://{host}"),
            Some(port) => format!("{scheme}://{host}:{port}"),
            None => format!("{scheme}://{host}"),
        }
    }

    /// Path with the context path removed.
    pub(crate) fn routing_path(&self) -> &str {
        if self.context_path.is_empty() || self.context_path == "/" {
            return &self.path;
        }
        self.path
            .strip_prefix(self.context_path.as_str())
            .unwrap_or(&self.path)
    }
}

fn split_authority(authority: &str) -> (Option<String>, Option<u16>) {
    let authority = authority.rsplit('@').next().unwrap_or(authority);
    match authority.rsplit_once(':') {
        // bracketed IPv6 literal without a port
        Some((host, port)) if !port.contains(']') => {
            (Some(host.to_ascii_lowercase()), port.parse().ok())
        }
        _ => (Some(authority.to_ascii_lowercase()), None),
    }
}

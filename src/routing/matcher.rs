//! Request guards evaluated before path matching.
//!
//! # Responsibilities
//! - Match the HTTP method (exact, `*` wildcard, HEAD served by GET)
//! - Match the negotiated format against declared formats
//! - Match the host against the compiled host pattern
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Method matching is case-insensitive
//! - Host matching is case-insensitive (RFC 9110)
//! - Absent request format or host = condition holds, except on routes
//!   pinned to a format by a static `format` arg
//! - Empty condition = always matches (wildcard)

use regex::Regex;

use crate::http::media::MediaType;

/// The parts of a request a route is matched against.
#[derive(Debug, Clone, Copy)]
pub struct MatchQuery<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub format: Option<&'a MediaType>,
    pub host: Option<&'a str>,
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, query: &MatchQuery<'_>) -> bool;
}

/// Matches the HTTP method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: String,
}

impl MethodMatcher {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, query: &MatchQuery<'_>) -> bool {
        self.method == "*"
            || query.method.eq_ignore_ascii_case(&self.method)
            || (query.method.eq_ignore_ascii_case("HEAD") && self.method == "GET")
    }
}

/// Matches the negotiated format against the formats a route declares.
#[derive(Debug, Clone)]
pub struct FormatMatcher {
    formats: Vec<MediaType>,
    required: bool,
}

impl FormatMatcher {
    /// Requests without a negotiated format pass.
    pub fn new(formats: Vec<MediaType>) -> Self {
        Self {
            formats,
            required: false,
        }
    }

    /// Requests without a negotiated format are rejected.
    pub fn required(formats: Vec<MediaType>) -> Self {
        Self {
            formats,
            required: true,
        }
    }
}

impl Matcher for FormatMatcher {
    fn matches(&self, query: &MatchQuery<'_>) -> bool {
        match query.format {
            Some(accept) if !self.formats.is_empty() => {
                self.formats.iter().any(|declared| accept.includes(declared))
            }
            Some(_) => true,
            None => !self.required,
        }
    }
}

/// Matches the Host header against a compiled host pattern.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    pattern: Option<Regex>,
}

impl HostMatcher {
    /// `None` matches every host.
    pub fn new(pattern: Option<Regex>) -> Self {
        Self { pattern }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, query: &MatchQuery<'_>) -> bool {
        match (&self.pattern, query.host) {
            (Some(pattern), Some(host)) => pattern.is_match(&host.to_ascii_lowercase()),
            _ => true,
        }
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, query: &MatchQuery<'_>) -> bool {
        // All matchers must pass (AND)
        self.matchers.iter().all(|m| m.matches(query))
    }
}

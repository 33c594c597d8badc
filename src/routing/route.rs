//! A single routing rule.
//!
//! # Responsibilities
//! - Hold the raw definition (method, path, action, host, formats, static args)
//! - Own the compiled patterns and the request guard built from them
//! - Decide whether a request matches and extract its arguments
//!
//! # Design Decisions
//! - A `Route` is immutable once compiled; the router shares it via `Arc`
//! - A static `format` arg also declares that format, and the route then
//!   only matches requests with a negotiated format
//! - Static args overlay path captures of the same name

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::http::media::MediaType;
use crate::routing::error::RoutingResult;
use crate::routing::matcher::{AndMatcher, FormatMatcher, HostMatcher, MatchQuery, Matcher, MethodMatcher};
use crate::routing::pattern::{self, Arg, CompiledRoute};

/// Reserved static arg naming the route's format.
pub const FORMAT_ARG: &str = "format";

/// Where a route was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOrigin {
    pub source: String,
    /// 1-based line, when the source format has lines.
    pub line: Option<usize>,
}

/// Raw input to route compilation.
#[derive(Debug, Clone, Default)]
pub struct RouteDefinition {
    /// HTTP verb or `*`.
    pub method: String,
    /// Path template, optionally prefixed by a host template
    /// (`{client}.example.com/dashboard`).
    pub path: String,
    /// Action template, e.g. `Users.show`.
    pub action: String,
    pub static_args: BTreeMap<String, String>,
    pub formats: Vec<MediaType>,
    pub origin: Option<RouteOrigin>,
}

impl RouteDefinition {
    pub fn new(method: impl Into<String>, path: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            action: action.into(),
            ..Self::default()
        }
    }

    /// Prefix the path with a host template. Ignored if the path already has one.
    pub fn with_host(mut self, host: &str) -> Self {
        if !host.is_empty() && self.path.starts_with('/') {
            self.path = format!("{host}{}", self.path);
        }
        self
    }

    pub fn with_static_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.static_args.insert(key.into(), value.into());
        self
    }

    pub fn with_format(mut self, format: MediaType) -> Self {
        self.formats.push(format);
        self
    }

    pub fn with_origin(mut self, source: impl Into<String>, line: Option<usize>) -> Self {
        self.origin = Some(RouteOrigin {
            source: source.into(),
            line,
        });
        self
    }

    pub fn compile(self) -> RoutingResult<Route> {
        Route::compile(self)
    }
}

/// A compiled routing rule.
#[derive(Debug)]
pub struct Route {
    method: String,
    path: String,
    action: String,
    host: String,
    formats: Vec<MediaType>,
    static_args: BTreeMap<String, String>,
    compiled: CompiledRoute,
    guard: AndMatcher,
    origin: Option<RouteOrigin>,
}

impl Route {
    /// Compile a definition into a matchable route.
    pub fn compile(definition: RouteDefinition) -> RoutingResult<Self> {
        let RouteDefinition {
            method,
            path,
            action,
            static_args,
            mut formats,
            origin,
        } = definition;

        let compiled = pattern::compile(&path, &action)?;

        let pinned = static_args.get(FORMAT_ARG).and_then(|f| MediaType::from_format(f));
        let format_matcher = match pinned {
            Some(format) => {
                if !formats.contains(&format) {
                    formats.push(format);
                }
                FormatMatcher::required(formats.clone())
            }
            None => FormatMatcher::new(formats.clone()),
        };

        let method = method.trim().to_ascii_uppercase();
        let guard = AndMatcher::new(vec![
            Box::new(MethodMatcher::new(method.as_str())),
            Box::new(format_matcher),
            Box::new(HostMatcher::new(compiled.host_pattern().cloned())),
        ]);

        Ok(Self {
            path: compiled.path().to_string(),
            host: compiled.host().to_string(),
            method,
            action,
            formats,
            static_args,
            compiled,
            guard,
            origin,
        })
    }

    /// Check if the parts of a request match this route.
    ///
    /// Returns the bound arguments merged with the static args, or `None`.
    /// Without a `host`, host conditions are not evaluated. Without a
    /// `format`, only routes pinned by a static `format` arg are rejected.
    pub fn matches(
        &self,
        method: &str,
        path: &str,
        format: Option<&MediaType>,
        host: Option<&str>,
    ) -> Option<HashMap<String, String>> {
        let query = MatchQuery {
            method,
            path,
            format,
            host,
        };
        if !self.guard.matches(&query) {
            return None;
        }
        let captures = self.compiled.path_pattern().captures(path)?;

        let mut args = HashMap::with_capacity(self.compiled.args().len() + self.static_args.len());
        for arg in self.compiled.args() {
            if arg.is_host_arg() {
                if let Some(host) = host {
                    let value = self.compiled.host_value(&host.to_ascii_lowercase());
                    args.insert(arg.name().to_string(), value);
                }
                continue;
            }
            if let Some(value) = captures.name(arg.name()) {
                args.insert(arg.name().to_string(), value.as_str().to_string());
            }
        }
        args.extend(
            self.static_args
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Some(args)
    }

    /// Upper-cased HTTP verb, or `*`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Path template without the host part.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Raw host template; empty when the route is host-agnostic.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn formats(&self) -> &[MediaType] {
        &self.formats
    }

    pub fn static_args(&self) -> &BTreeMap<String, String> {
        &self.static_args
    }

    pub fn args(&self) -> &[Arg] {
        self.compiled.args()
    }

    pub fn compiled(&self) -> &CompiledRoute {
        &self.compiled
    }

    pub fn origin(&self) -> Option<&RouteOrigin> {
        self.origin.as_ref()
    }

    /// Aligned columns for route table listings.
    pub fn to_fixed_length_string(&self) -> String {
        format!(
            "{:<8}{:<60}{:<60}{:<22}",
            self.method,
            self.path,
            self.action,
            MediaType::join(&self.formats)
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{} -> {}", self.method, self.host, self.path, self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(method: &str, path: &str, action: &str) -> Route {
        RouteDefinition::new(method, path, action).compile().unwrap()
    }

    #[test]
    fn test_matches_path_args() {
        let route = route("GET", "/users/{id}", "Users.show");
        let args = route.matches("GET", "/users/42", None, None).unwrap();
        assert_eq!(args.get("id").map(String::as_str), Some("42"));

        assert!(route.matches("GET", "/users", None, None).is_none());
        assert!(route.matches("GET", "/users/42/edit", None, None).is_none());
        assert!(route.matches("POST", "/users/42", None, None).is_none());
    }

    #[test]
    fn test_head_is_served_by_get_only() {
        let get = route("GET", "/items", "Items.list");
        assert!(get.matches("HEAD", "/items", None, None).is_some());

        let post = route("POST", "/items", "Items.create");
        assert!(post.matches("HEAD", "/items", None, None).is_none());

        let any = route("*", "/items", "Items.any");
        assert!(any.matches("PATCH", "/items", None, None).is_some());
    }

    #[test]
    fn test_constraint_rejects_segment() {
        let route = route("GET", "/orders/{<[0-9]+>id}", "Orders.show");
        assert!(route.matches("GET", "/orders/17", None, None).is_some());
        assert!(route.matches("GET", "/orders/latest", None, None).is_none());
    }

    #[test]
    fn test_static_args_overlay_captures() {
        let route = RouteDefinition::new("GET", "/pages/{page}", "Pages.show")
            .with_static_arg("page", "home")
            .with_static_arg("lang", "en")
            .compile()
            .unwrap();
        let args = route.matches("GET", "/pages/about", None, None).unwrap();
        assert_eq!(args["page"], "home");
        assert_eq!(args["lang"], "en");
    }

    #[test]
    fn test_static_format_gates_matching() {
        let route = RouteDefinition::new("GET", "/feed", "Feed.json")
            .with_static_arg(FORMAT_ARG, "json")
            .compile()
            .unwrap();
        assert_eq!(route.formats(), &[MediaType::new("application", "json")]);

        let json = MediaType::new("application", "json");
        let xml = MediaType::new("application", "xml");
        assert!(route.matches("GET", "/feed", Some(&json), None).is_some());
        assert!(route.matches("GET", "/feed", Some(&xml), None).is_none());
        assert!(route.matches("GET", "/feed", None, None).is_none());

        // a declared format list alone still accepts requests without a format
        let listed = RouteDefinition::new("GET", "/feed", "Feed.any")
            .with_format(json.clone())
            .compile()
            .unwrap();
        assert!(listed.matches("GET", "/feed", None, None).is_some());
    }

    #[test]
    fn test_host_arg_extraction() {
        let route = route("GET", "{client}.example.com/home", "Home.index");
        let args = route
            .matches("GET", "/home", None, Some("Acme.example.com"))
            .unwrap();
        assert_eq!(args["client"], "acme");

        assert!(route.matches("GET", "/home", None, Some("acme.other.org")).is_none());

        // no host supplied: host condition holds, host arg is not bound
        let args = route.matches("GET", "/home", None, None).unwrap();
        assert!(!args.contains_key("client"));
    }

    #[test]
    fn test_with_host_and_display() {
        let route = RouteDefinition::new("get", "/status", "Status.show")
            .with_host("api.example.com")
            .compile()
            .unwrap();
        assert_eq!(route.method(), "GET");
        assert_eq!(route.host(), "api.example.com");
        assert_eq!(route.path(), "/status");
        assert_eq!(route.to_string(), "GET api.example.com/status -> Status.show");
        assert!(route.to_fixed_length_string().starts_with("GET     /status"));
    }
}

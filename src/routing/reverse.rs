//! Reverse resolution: action id + arguments → URL.
//!
//! # Responsibilities
//! - Find the first route whose action pattern accepts the action id and
//!   whose arguments, constraints and static args are all satisfied
//! - Render path, host and query string for that route
//! - Finish URLs (fragment, absolute, secure)
//!
//! # Design Decisions
//! - Each candidate works on its own copy of the arguments; a rejected
//!   candidate leaves nothing behind for the next one
//! - `ActionDefinition` keeps the table snapshot it was resolved against,
//!   so `add`/`remove` re-resolve consistently during a reload
//! - The current request is passed explicitly, never looked up globally

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::http::media::MediaType;
use crate::http::request::RouteRequest;
use crate::routing::args::{is_deferred, ArgMap, ArgValue};
use crate::routing::error::{RoutingError, RoutingResult};
use crate::routing::pattern::{encode_key, encode_value};
use crate::routing::route::{Route, FORMAT_ARG};
use crate::routing::router::RouteTable;

/// The outcome of reverse resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ActionDefinition {
    /// Rendered host; empty for host-agnostic routes.
    pub host: String,
    /// HTTP method; wildcard routes resolve to `GET`.
    pub method: String,
    /// Path plus query string, or an absolute URL once finished.
    pub url: String,
    /// Whether the route accepts any method.
    pub star: bool,
    pub action: String,
    /// Arguments as supplied by the caller.
    pub args: ArgMap,
    #[serde(skip)]
    table: Arc<RouteTable>,
}

impl ActionDefinition {
    /// Add an argument and resolve again.
    pub fn add(
        mut self,
        key: impl Into<String>,
        value: impl Into<ArgValue>,
        current: Option<&RouteRequest>,
    ) -> RoutingResult<Self> {
        self.args.insert(key.into(), value.into());
        reverse(&self.table, &self.action, self.args, current)
    }

    /// Remove an argument and resolve again.
    pub fn remove(mut self, key: &str, current: Option<&RouteRequest>) -> RoutingResult<Self> {
        self.args.remove(key);
        reverse(&self.table, &self.action, self.args, current)
    }

    /// Append a `#fragment`.
    pub fn add_ref(mut self, fragment: &str) -> Self {
        self.url.push('#');
        self.url.push_str(fragment);
        self
    }

    /// Make the URL absolute using the route host, or the current request's
    /// base URL for host-agnostic routes.
    pub fn absolute(mut self, current: &RouteRequest) -> Self {
        if !self.url.starts_with("http") {
            self.url = if self.host.is_empty() {
                format!("{}{}", current.base_url(), self.url)
            } else {
                let scheme = if current.secure { "https://" } else { "http://" };
                format!("{scheme}{}{}", self.host, self.url)
            };
        }
        self
    }

    /// Make the URL absolute and force HTTPS.
    pub fn secure(mut self, current: &RouteRequest) -> Self {
        if !self.url.contains("http://") && !self.url.contains("https://") {
            self = self.absolute(current);
        }
        self.url = self.url.replace("http:", "https:");
        self
    }
}

impl fmt::Display for ActionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

struct Rendered {
    host: String,
    url: String,
}

/// Resolve `action` with `args` against one table snapshot.
pub(crate) fn reverse(
    table: &Arc<RouteTable>,
    action: &str,
    args: ArgMap,
    current: Option<&RouteRequest>,
) -> RoutingResult<ActionDefinition> {
    for route in table.routes() {
        if let Some(rendered) = resolve_with(route, action, &args, current) {
            tracing::debug!(action, route = %route, url = %rendered.url, "Reverse resolved");
            let method = match route.method() {
                "*" => "GET".to_string(),
                method => method.to_string(),
            };
            return Ok(ActionDefinition {
                host: rendered.host,
                method,
                url: rendered.url,
                star: route.method() == "*",
                action: action.to_string(),
                args,
                table: Arc::clone(table),
            });
        }
    }

    tracing::debug!(action, ?args, "No handler found");
    Err(RoutingError::NoHandlerFound {
        action: action.to_string(),
        args,
    })
}

/// Routes whose action pattern accepts `action`, without argument checks.
pub(crate) fn resolve_actions(table: &RouteTable, action: &str) -> Vec<Arc<Route>> {
    table
        .routes()
        .iter()
        .filter(|route| route.compiled().action_pattern().is_match(action))
        .cloned()
        .collect()
}

fn resolve_with(
    route: &Route,
    action: &str,
    args: &ArgMap,
    current: Option<&RouteRequest>,
) -> Option<Rendered> {
    let compiled = route.compiled();
    let captures = compiled.action_pattern().captures(action)?;

    let mut working = args.clone();
    for group in compiled.action_args() {
        if let Some(value) = captures.name(group) {
            working.insert(group.clone(), ArgValue::Single(value.as_str().to_lowercase()));
        }
    }

    let mut bound: HashMap<String, String> = HashMap::with_capacity(compiled.args().len());
    for arg in compiled.args() {
        match working.get(arg.name()).and_then(ArgValue::first) {
            Some(value) => {
                if !is_deferred(value) && !arg.accepts(value) {
                    tracing::trace!(route = %route, arg = arg.name(), value, "constraint rejected");
                    return None;
                }
                bound.insert(arg.name().to_string(), value.to_string());
            }
            None if arg.host_fallback() => {
                working.insert(arg.name().to_string(), ArgValue::Single(String::new()));
                bound.insert(arg.name().to_string(), String::new());
            }
            None => {
                tracing::trace!(route = %route, arg = arg.name(), "missing argument");
                return None;
            }
        }
    }

    for (key, expected) in route.static_args() {
        if key == FORMAT_ARG {
            let ambient = current.and_then(|request| request.format.as_ref());
            let wanted = MediaType::from_format(expected);
            if ambient.is_none() || ambient != wanted.as_ref() {
                return None;
            }
            continue;
        }
        match working.get(key) {
            Some(ArgValue::Single(value)) if value == expected => {}
            _ => return None,
        }
    }

    let view: HashMap<&str, &str> = bound
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let mut path = compiled.render_path(&view);
    if let Some(current) = current {
        path = format!("{}{}", mount_prefix(&current.servlet_path), path);
        path = format!("{}{}", mount_prefix(&current.context_path), path);
    }
    let host = compiled.render_host(&view);

    let mut pairs = Vec::new();
    for (key, value) in &working {
        if bound.contains_key(key) || route.static_args().contains_key(key) {
            continue;
        }
        for item in value.values() {
            pairs.push(format!("{}={}", encode_key(key), encode_value(item)));
        }
    }

    let url = if pairs.is_empty() {
        path
    } else {
        format!("{path}?{}", pairs.join("&"))
    };
    Some(Rendered { host, url })
}

fn mount_prefix(path: &str) -> String {
    if path.is_empty() || path == "/" {
        String::new()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

//! Route table and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in precedence order
//! - Dispatch requests to the first matching route (forward)
//! - Resolve action ids to URLs (reverse)
//! - Load, reload and incrementally extend the table
//!
//! # Design Decisions
//! - Copy-on-write table behind `ArcSwap`: readers take one snapshot per
//!   call and never observe a half-applied reload
//! - New tables are built completely before a single atomic store
//! - First match wins (registration order)
//! - Explicit `NoRouteFound` rather than silent default for dispatch; the
//!   read-only `lookup` returns an empty map instead

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::SystemTime;

use arc_swap::ArcSwap;
use regex::Regex;

use crate::http::media::MediaType;
use crate::http::request::RouteRequest;
use crate::loader::{self, LoadError, RouteSource};
use crate::observability::metrics;
use crate::routing::args::ArgMap;
use crate::routing::error::{RoutingError, RoutingResult};
use crate::routing::reverse::{self, ActionDefinition};
use crate::routing::route::{Route, FORMAT_ARG};

/// Key under which [`Router::lookup`] reports the winning action.
pub const ACTION_KEY: &str = "action";

/// Query-string marker overriding the request method.
static METHOD_OVERRIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"x-http-method-override=(GET|PUT|POST|DELETE|PATCH)")
        .expect("method override pattern is valid")
});

/// An immutable, ordered snapshot of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
    loaded_at: Option<SystemTime>,
}

impl RouteTable {
    pub fn new(routes: Vec<Arc<Route>>) -> Self {
        Self {
            routes,
            loaded_at: None,
        }
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// When the table was last built by [`Router::load`].
    pub fn loaded_at(&self) -> Option<SystemTime> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn describe(&self) -> String {
        self.routes
            .iter()
            .map(|route| route.to_fixed_length_string())
            .collect::<Vec<_>>()
            .join("\n\t")
    }
}

/// Process-wide routing table with forward and reverse lookup.
#[derive(Debug)]
pub struct Router {
    table: ArcSwap<RouteTable>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(RouteTable::default()),
        }
    }

    /// Create a router from already compiled routes, in precedence order.
    pub fn from_routes(routes: impl IntoIterator<Item = Route>) -> Self {
        let routes = routes.into_iter().map(Arc::new).collect();
        Self {
            table: ArcSwap::from_pointee(RouteTable::new(routes)),
        }
    }

    /// The current table. Holding it pins that version across reloads.
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.table.load().routes.clone()
    }

    pub fn len(&self) -> usize {
        self.table.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.load().is_empty()
    }

    pub fn last_loading(&self) -> Option<SystemTime> {
        self.table.load().loaded_at
    }

    /// Parse every source in order and replace the table atomically.
    ///
    /// On error the current table is kept.
    pub fn load<S: RouteSource>(&self, sources: &[S]) -> Result<usize, LoadError> {
        let mut routes = Vec::new();
        for source in sources {
            let parsed = loader::parse(source).inspect_err(|_| metrics::record_reload("failed"))?;
            routes.extend(parsed.into_iter().map(Arc::new));
        }

        let table = RouteTable {
            routes,
            loaded_at: Some(SystemTime::now()),
        };
        let count = table.len();
        tracing::info!(routes = count, "Loaded routes: \n\t{}", table.describe());

        self.table.store(Arc::new(table));
        metrics::record_reload("loaded");
        metrics::set_route_count(count);
        Ok(count)
    }

    /// Reload when any source changed since the last load. Returns whether a
    /// reload happened. A router that was never loaded always reloads.
    pub fn detect_changes<S: RouteSource>(&self, sources: &[S]) -> Result<bool, LoadError> {
        let loaded_at = self.last_loading();
        let mut changed = false;
        for source in sources {
            let modified = source.last_modified()?;
            if loaded_at.map_or(true, |at| modified > at) {
                tracing::debug!(source = source.name(), "Route source changed");
                changed = true;
                break;
            }
        }

        if changed {
            self.load(sources)?;
        }
        Ok(changed)
    }

    /// Remove every route.
    ///
    /// The load timestamp is reset too, so the next
    /// [`detect_changes`](Self::detect_changes) reloads every source even
    /// if none changed.
    pub fn clear(&self) {
        self.table.store(Arc::new(RouteTable::default()));
        metrics::set_route_count(0);
    }

    /// Append a route.
    pub fn add_route(&self, route: Route) {
        self.append_route(route);
    }

    /// Insert a route at `position`, clamped to the table length.
    pub fn add_route_at(&self, position: usize, route: Route) {
        let route = Arc::new(route);
        self.update(|routes| {
            let position = position.min(routes.len());
            routes.insert(position, Arc::clone(&route));
        });
    }

    /// Append a route after all existing ones.
    pub fn append_route(&self, route: Route) {
        let route = Arc::new(route);
        self.update(|routes| routes.push(Arc::clone(&route)));
    }

    /// Insert a route ahead of all existing ones.
    pub fn prepend_route(&self, route: Route) {
        let route = Arc::new(route);
        self.update(|routes| routes.insert(0, Arc::clone(&route)));
    }

    fn update(&self, apply: impl Fn(&mut Vec<Arc<Route>>)) {
        self.table.rcu(|current| {
            let mut next = RouteTable::clone(current);
            apply(&mut next.routes);
            next
        });
        metrics::set_route_count(self.len());
    }

    /// Dispatch a request to the first matching route.
    ///
    /// May rewrite `request.method` (method override) and `request.format`
    /// (captured `format` arg); sets `route_args` and `action` on success.
    pub fn route(&self, request: &mut RouteRequest) -> RoutingResult<Arc<Route>> {
        let table = self.snapshot();
        let result = dispatch(&table, request);
        match &result {
            Ok(route) if serves_head(request, route) => metrics::record_dispatch("head_fallback"),
            Ok(_) => metrics::record_dispatch("matched"),
            Err(_) => metrics::record_dispatch("not_found"),
        }
        result
    }

    /// Read-only lookup: the winning route's arguments plus an `action`
    /// entry, or an empty map when nothing matches.
    pub fn lookup(
        &self,
        method: &str,
        path: &str,
        format: Option<&MediaType>,
        host: Option<&str>,
    ) -> HashMap<String, String> {
        let table = self.table.load();
        for route in table.routes() {
            if let Some(mut args) = route.matches(method, path, format, host) {
                args.insert(ACTION_KEY.to_string(), route.action().to_string());
                return args;
            }
        }
        HashMap::new()
    }

    /// Resolve an action id and arguments to a URL.
    pub fn reverse(
        &self,
        action: &str,
        args: ArgMap,
        current: Option<&RouteRequest>,
    ) -> RoutingResult<ActionDefinition> {
        let result = reverse::reverse(&self.snapshot(), action, args, current);
        match &result {
            Ok(_) => metrics::record_reverse("resolved"),
            Err(_) => metrics::record_reverse("no_handler"),
        }
        result
    }

    /// Resolve an action id that takes no arguments.
    pub fn reverse_action(
        &self,
        action: &str,
        current: Option<&RouteRequest>,
    ) -> RoutingResult<ActionDefinition> {
        self.reverse(action, ArgMap::new(), current)
    }

    /// The current request's base URL followed by the reversed URL.
    pub fn full_url(&self, action: &str, args: ArgMap, current: &RouteRequest) -> RoutingResult<String> {
        let definition = self.reverse(action, args, Some(current))?;
        Ok(format!("{}{}", current.base_url(), definition))
    }

    /// Routes whose action pattern accepts `action`, arguments not checked.
    pub fn resolve_actions(&self, action: &str) -> Vec<Arc<Route>> {
        reverse::resolve_actions(&self.table.load(), action)
    }
}

fn dispatch(table: &RouteTable, request: &mut RouteRequest) -> RoutingResult<Arc<Route>> {
    tracing::trace!(path = %request.path, querystring = %request.querystring, "Route");

    // request method may be overridden by an x-http-method-override parameter
    if let Some(caps) = METHOD_OVERRIDE.captures(&request.querystring) {
        let method = caps[1].to_string();
        tracing::trace!(from = %request.method, to = %method, "Request method overridden");
        request.method = method;
    }

    let path = request.routing_path().to_string();
    for route in table.routes() {
        let Some(args) = route.matches(
            &request.method,
            &path,
            request.format.as_ref(),
            request.host.as_deref(),
        ) else {
            continue;
        };

        let mut action = route.action().to_string();
        if action.contains('{') {
            for (name, value) in &args {
                action = action.replace(&format!("{{{name}}}"), value);
            }
        }
        if let Some(format) = args.get(FORMAT_ARG) {
            request.format = MediaType::from_format(format);
        }
        tracing::debug!(method = %request.method, path = %path, route = %route, action = %action, "Route matched");
        request.route_args = args;
        request.action = Some(action);
        return Ok(Arc::clone(route));
    }

    // Not found - if the request was a HEAD, see if there is a matching GET
    if request.method.eq_ignore_ascii_case("HEAD") {
        request.method = "GET".to_string();
        let result = dispatch(table, request);
        request.method = "HEAD".to_string();
        return result.map_err(|_| not_found(request));
    }

    tracing::debug!(method = %request.method, path = %request.path, "No route matched");
    Err(not_found(request))
}

fn not_found(request: &RouteRequest) -> RoutingError {
    RoutingError::NoRouteFound {
        method: request.method.clone(),
        path: request.path.clone(),
    }
}

/// A HEAD request answered by a GET route.
fn serves_head(request: &RouteRequest, route: &Route) -> bool {
    request.method.eq_ignore_ascii_case("HEAD") && route.method() == "GET"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemorySource;
    use crate::routing::args::arg_map;
    use crate::routing::route::RouteDefinition;

    fn route(method: &str, path: &str, action: &str) -> Route {
        RouteDefinition::new(method, path, action).compile().unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let router = Router::from_routes([
            route("GET", "/users/me", "Users.me"),
            route("GET", "/users/{id}", "Users.show"),
        ]);
        let mut request = RouteRequest::new("GET", "/users/me");
        let matched = router.route(&mut request).unwrap();
        assert_eq!(matched.action(), "Users.me");
        assert_eq!(request.action.as_deref(), Some("Users.me"));

        let mut request = RouteRequest::new("GET", "/users/42");
        router.route(&mut request).unwrap();
        assert_eq!(request.action.as_deref(), Some("Users.show"));
        assert_eq!(request.route_args["id"], "42");
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let router = Router::from_routes([route("GET", "/items", "Items.list")]);
        let mut request = RouteRequest::new("HEAD", "/items");
        let matched = router.route(&mut request).unwrap();
        assert_eq!(matched.action(), "Items.list");
        assert_eq!(request.method, "HEAD");
        assert!(serves_head(&request, &matched));
    }

    #[test]
    fn test_head_without_get_route_is_not_found() {
        let router = Router::from_routes([route("GET", "/items", "Items.list")]);
        let mut request = RouteRequest::new("HEAD", "/missing");
        let err = router.route(&mut request).unwrap_err();
        assert!(matches!(
            err,
            RoutingError::NoRouteFound { ref method, ref path } if method == "HEAD" && path == "/missing"
        ));
        assert_eq!(request.method, "HEAD");
        assert!(request.action.is_none());
    }

    #[test]
    fn test_no_route_found() {
        let router = Router::from_routes([route("GET", "/items", "Items.list")]);
        let mut request = RouteRequest::new("POST", "/items");
        let err = router.route(&mut request).unwrap_err();
        assert!(matches!(
            err,
            RoutingError::NoRouteFound { ref method, ref path } if method == "POST" && path == "/items"
        ));
    }

    #[test]
    fn test_method_override() {
        let router = Router::from_routes([
            route("POST", "/items/{id}", "Items.create"),
            route("DELETE", "/items/{id}", "Items.delete"),
        ]);
        let mut request = RouteRequest::new("POST", "/items/3").with_query("x-http-method-override=DELETE&v=1");
        router.route(&mut request).unwrap();
        assert_eq!(request.method, "DELETE");
        assert_eq!(request.action.as_deref(), Some("Items.delete"));
    }

    #[test]
    fn test_context_path_is_stripped() {
        let router = Router::from_routes([route("GET", "/users", "Users.list")]);
        let mut request = RouteRequest::new("GET", "/app/users").with_context_path("/app");
        assert!(router.route(&mut request).is_ok());
    }

    #[test]
    fn test_templated_action_and_format_capture() {
        let router = Router::from_routes([route(
            "GET",
            "/{controller}/show.{format}",
            "{controller}.show",
        )]);
        let mut request = RouteRequest::new("GET", "/Users/show.json")
            .with_format(MediaType::new("text", "html"));
        router.route(&mut request).unwrap();
        assert_eq!(request.action.as_deref(), Some("Users.show"));
        assert_eq!(request.format, Some(MediaType::new("application", "json")));
    }

    #[test]
    fn test_lookup() {
        let router = Router::from_routes([route("GET", "/users/{id}", "Users.show")]);
        let args = router.lookup("GET", "/users/9", None, None);
        assert_eq!(args["id"], "9");
        assert_eq!(args[ACTION_KEY], "Users.show");

        assert!(router.lookup("GET", "/nothing", None, None).is_empty());
    }

    #[test]
    fn test_insertion_positions() {
        let router = Router::from_routes([route("GET", "/b", "B.index")]);
        router.append_route(route("GET", "/c", "C.index"));
        router.prepend_route(route("GET", "/a", "A.index"));
        router.add_route_at(99, route("GET", "/d", "D.index"));
        router.add_route_at(1, route("GET", "/a2", "A2.index"));

        let paths: Vec<_> = router.routes().iter().map(|r| r.path().to_string()).collect();
        assert_eq!(paths, vec!["/a", "/a2", "/b", "/c", "/d"]);

        router.clear();
        assert!(router.is_empty());
    }

    #[test]
    fn test_clear_forces_next_reload() {
        let router = Router::new();
        let sources = [MemorySource::new("routes", "GET /a A.index\n").with_modified(SystemTime::UNIX_EPOCH)];
        assert!(router.detect_changes(&sources).unwrap());
        assert!(!router.detect_changes(&sources).unwrap());

        router.clear();
        assert!(router.last_loading().is_none());
        assert!(router.detect_changes(&sources).unwrap());
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_snapshot_survives_clear() {
        let router = Router::from_routes([route("GET", "/users/{id}", "Users.show")]);
        let snapshot = router.snapshot();
        router.clear();
        assert_eq!(snapshot.len(), 1);
        assert!(router.reverse("Users.show", arg_map([("id", "1")]), None).is_err());
    }

    #[test]
    fn test_round_trip() {
        let router = Router::from_routes([route("GET", "/users/{id}", "Users.show")]);
        let definition = router
            .reverse("Users.show", arg_map([("id", "42")]), None)
            .unwrap();
        assert_eq!(definition.url, "/users/42");

        let mut request = RouteRequest::new(definition.method.clone(), definition.url.clone());
        router.route(&mut request).unwrap();
        assert_eq!(request.route_args["id"], "42");
        assert_eq!(request.action.as_deref(), Some("Users.show"));
    }

    #[test]
    fn test_full_url() {
        let router = Router::from_routes([route("GET", "/users/{id}", "Users.show")]);
        let current = RouteRequest::new("GET", "/").with_host("example.com");
        let url = router
            .full_url("Users.show", arg_map([("id", "5")]), &current)
            .unwrap();
        assert_eq!(url, "http://example.com/users/5");
    }
}

//! Forward routing against a realistic route file.

use std::thread;

use action_router::routing::RoutingError;
use action_router::{MediaType, MemorySource, RouteRequest, Router};
use axum::http::Request;

mod common;

fn dispatch(router: &Router, mut request: RouteRequest) -> Result<RouteRequest, RoutingError> {
    router.route(&mut request)?;
    Ok(request)
}

#[test]
fn test_dispatch_basic_routes() {
    let router = common::router_from(common::APP_ROUTES);

    let request = dispatch(&router, RouteRequest::new("GET", "/")).unwrap();
    assert_eq!(request.action.as_deref(), Some("Application.index"));

    let request = dispatch(&router, RouteRequest::new("GET", "/users/")).unwrap();
    assert_eq!(request.action.as_deref(), Some("Users.list"));

    let request = dispatch(&router, RouteRequest::new("GET", "/users/42")).unwrap();
    assert_eq!(request.action.as_deref(), Some("Users.show"));
    assert_eq!(request.route_args["id"], "42");

    let request = dispatch(&router, RouteRequest::new("DELETE", "/users/42")).unwrap();
    assert_eq!(request.action.as_deref(), Some("Users.delete"));
}

#[test]
fn test_constraint_miss_is_not_found() {
    let router = common::router_from(common::APP_ROUTES);
    let err = dispatch(&router, RouteRequest::new("GET", "/users/alice")).unwrap_err();
    assert_eq!(err.to_string(), "No route found for GET /users/alice");
}

#[test]
fn test_format_suffix_sets_request_format() {
    let router = common::router_from(common::APP_ROUTES);
    let request = dispatch(&router, RouteRequest::new("GET", "/users/42.json")).unwrap();
    assert_eq!(request.route_args["format"], "json");
    assert_eq!(request.format, Some(MediaType::new("application", "json")));
}

#[test]
fn test_method_override_and_head() {
    let router = common::router_from(common::APP_ROUTES);

    let request = RouteRequest::new("POST", "/users/7").with_query("x-http-method-override=PUT");
    let request = dispatch(&router, request).unwrap();
    assert_eq!(request.method, "PUT");
    assert_eq!(request.action.as_deref(), Some("Users.update"));

    let request = dispatch(&router, RouteRequest::new("HEAD", "/users/7")).unwrap();
    assert_eq!(request.method, "HEAD");
    assert_eq!(request.action.as_deref(), Some("Users.show"));
}

#[test]
fn test_static_format_route_is_negotiated() {
    let router = common::router_from(common::APP_ROUTES);

    let rss = RouteRequest::new("GET", "/feed").with_format(MediaType::new("application", "rss+xml"));
    let request = dispatch(&router, rss).unwrap();
    assert_eq!(request.route_args["format"], "rss");

    let html = RouteRequest::new("GET", "/feed").with_format(MediaType::new("text", "html"));
    let request = dispatch(&router, html).unwrap();
    assert!(!request.route_args.contains_key("format"));
    assert_eq!(request.format, Some(MediaType::new("text", "html")));
}

#[test]
fn test_static_format_route_needs_negotiated_format() {
    let router = common::router_from(common::APP_ROUTES);

    let request = dispatch(&router, RouteRequest::new("GET", "/feed")).unwrap();
    assert_eq!(request.action.as_deref(), Some("Feed.show"));
    assert!(!request.route_args.contains_key("format"));
    assert_eq!(request.format, None);

    // `Accept: */*` negotiates no format either
    let http = Request::builder()
        .method("GET")
        .uri("/feed")
        .header("accept", "*/*")
        .body(())
        .unwrap();
    let request = dispatch(&router, RouteRequest::from_http(&http)).unwrap();
    assert!(!request.route_args.contains_key("format"));
    assert_eq!(request.format, None);
}

#[test]
fn test_host_routes() {
    let router = common::router_from(common::APP_ROUTES);

    let request = RouteRequest::new("GET", "/dashboard").with_host("ACME.example.com");
    let request = dispatch(&router, request).unwrap();
    assert_eq!(request.action.as_deref(), Some("Dashboard.index"));
    assert_eq!(request.route_args["tenant"], "acme");

    let elsewhere = RouteRequest::new("GET", "/dashboard").with_host("acme.example.org");
    assert!(dispatch(&router, elsewhere).is_err());
}

#[test]
fn test_templated_action_from_http_request() {
    let router = common::router_from(common::APP_ROUTES);
    let http = Request::builder()
        .method("GET")
        .uri("/admin/users/list?page=2")
        .header("host", "acme.example.com:8080")
        .header("accept", "application/json, text/html")
        .body(())
        .unwrap();

    let request = dispatch(&router, RouteRequest::from_http(&http)).unwrap();
    assert_eq!(request.action.as_deref(), Some("admin.users.list"));
    assert_eq!(request.querystring, "page=2");
    assert_eq!(request.port, Some(8080));
}

#[test]
fn test_wildcard_method_catch_all() {
    let router = common::router_from(common::APP_ROUTES);
    let request = dispatch(&router, RouteRequest::new("PATCH", "/api/v1/things")).unwrap();
    assert_eq!(request.action.as_deref(), Some("Api.proxy"));
    assert_eq!(request.route_args["path"], "v1/things");
}

#[test]
fn test_context_path_mount() {
    let router = common::router_from(common::APP_ROUTES);
    let request = RouteRequest::new("GET", "/shop/users/3").with_context_path("/shop");
    let request = dispatch(&router, request).unwrap();
    assert_eq!(request.route_args["id"], "3");
}

#[test]
fn test_dispatch_during_reload_sees_whole_tables() {
    let router = Router::new();
    let v1 = vec![MemorySource::new("routes", "GET /ping Ping.v1\n")];
    let v2 = vec![MemorySource::new("routes", "GET /ping Ping.v2\nGET /pong Pong.v2\n")];
    router.load(&v1).unwrap();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..500 {
                    let request = dispatch(&router, RouteRequest::new("GET", "/ping")).unwrap();
                    let action = request.action.unwrap();
                    assert!(action == "Ping.v1" || action == "Ping.v2");
                }
            });
        }
        for i in 0..100 {
            let sources = if i % 2 == 0 { &v2 } else { &v1 };
            router.load(sources.as_slice()).unwrap();
        }
    });

    let table = router.snapshot();
    assert!(table.len() == 1 || table.len() == 2);
}

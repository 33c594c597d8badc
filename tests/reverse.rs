//! Reverse routing against a realistic route file.

use action_router::config::RequestDefaults;
use action_router::routing::RoutingError;
use action_router::{arg_map, ArgMap, ArgValue, MediaType, RouteRequest};

mod common;

#[test]
fn test_reverse_with_constraints() {
    let router = common::router_from(common::APP_ROUTES);

    let def = router.reverse("Users.show", arg_map([("id", "42")]), None).unwrap();
    assert_eq!(def.url, "/users/42");
    assert_eq!(def.method, "GET");

    let err = router
        .reverse("Users.show", arg_map([("id", "alice")]), None)
        .unwrap_err();
    assert!(matches!(err, RoutingError::NoHandlerFound { ref action, .. } if action == "Users.show"));
}

#[test]
fn test_extra_args_become_query_string() {
    let router = common::router_from(common::APP_ROUTES);
    let args = arg_map([
        ("id", ArgValue::from("42")),
        ("format", ArgValue::from("json")),
        ("fields", ArgValue::from(vec!["name", "email"])),
    ]);
    let def = router.reverse("Users.show", args, None).unwrap();
    assert_eq!(def.url, "/users/42?fields=name&fields=email&format=json");
}

#[test]
fn test_optional_trailing_slash_is_not_rendered() {
    let router = common::router_from(common::APP_ROUTES);
    let def = router.reverse_action("Users.list", None).unwrap();
    assert_eq!(def.url, "/users");
}

#[test]
fn test_templated_action_reverses_to_path() {
    let router = common::router_from(common::APP_ROUTES);
    let def = router.reverse_action("admin.Users.List", None).unwrap();
    assert_eq!(def.url, "/admin/users/list");

    let mut request = RouteRequest::new(def.method.clone(), def.url.clone());
    router.route(&mut request).unwrap();
    assert_eq!(request.action.as_deref(), Some("admin.users.list"));
}

#[test]
fn test_host_route_renders_host() {
    let router = common::router_from(common::APP_ROUTES);
    let current = RouteRequest::new("GET", "/").with_host("www.example.com");

    let def = router
        .reverse("Dashboard.index", arg_map([("tenant", "acme")]), Some(&current))
        .unwrap();
    assert_eq!(def.host, "acme.example.com");
    assert_eq!(def.clone().absolute(&current).url, "http://acme.example.com/dashboard");
    assert_eq!(def.secure(&current).url, "https://acme.example.com/dashboard");
}

#[test]
fn test_wildcard_route_defaults_to_get() {
    let router = common::router_from(common::APP_ROUTES);
    let def = router
        .reverse("Api.proxy", arg_map([("path", "v1/things")]), None)
        .unwrap();
    assert!(def.star);
    assert_eq!(def.method, "GET");
    assert_eq!(def.url, "/api/v1%2Fthings");
}

#[test]
fn test_static_format_follows_current_request() {
    let router = common::router_from(
        "GET /feed.rss Feed.show {format:'rss'}\nGET /feed Feed.show\n",
    );
    let rss = RouteRequest::new("GET", "/").with_format(MediaType::new("application", "rss+xml"));
    assert_eq!(router.reverse_action("Feed.show", Some(&rss)).unwrap().url, "/feed.rss");
    assert_eq!(router.reverse_action("Feed.show", None).unwrap().url, "/feed");
}

#[test]
fn test_configured_mount_points() {
    let router = common::router_from(common::APP_ROUTES);
    let defaults = RequestDefaults {
        context_path: "/shop".to_string(),
        servlet_path: "/web".to_string(),
        host: "shop.example.com".to_string(),
        port: Some(8443),
        secure: true,
        ..RequestDefaults::default()
    };
    let current = defaults.to_request("GET", "/");

    let def = router.reverse("Users.show", arg_map([("id", "1")]), Some(&current)).unwrap();
    assert_eq!(def.url, "/shop/web/users/1");

    let url = router.full_url("Users.show", arg_map([("id", "1")]), &current).unwrap();
    assert_eq!(url, "https://shop.example.com:8443/shop/web/users/1");
}

#[test]
fn test_definition_refinement() {
    let router = common::router_from(common::APP_ROUTES);
    let def = router.reverse_action("Users.list", None).unwrap();

    let def = def.add("page", "3", None).unwrap();
    assert_eq!(def.url, "/users?page=3");
    // Users.list has no `id` placeholder, so it joins the query string
    let def = def.add("id", "8", None).unwrap();
    assert_eq!(def.url, "/users?id=8&page=3");
    let def = def.remove("page", None).unwrap();
    assert_eq!(def.add_ref("top").url, "/users?id=8#top");
}

#[test]
fn test_round_trip_over_fixture() {
    let router = common::router_from(common::APP_ROUTES);
    let cases: Vec<(&str, ArgMap)> = vec![
        ("Application.index", ArgMap::new()),
        ("Users.show", arg_map([("id", "5")])),
        ("Users.update", arg_map([("id", "5")])),
        ("Users.delete", arg_map([("id", "5")])),
        ("Users.create", ArgMap::new()),
    ];
    for (action, args) in cases {
        let def = router.reverse(action, args, None).unwrap();
        let mut request = RouteRequest::new(def.method.clone(), def.url.clone());
        router.route(&mut request).unwrap();
        assert_eq!(request.action.as_deref(), Some(action), "round trip of {action}");
    }
}

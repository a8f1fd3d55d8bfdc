//! Integration tests for route registration, matching, and URL generation.
//!
//! Tests cover: template precedence, optional and wildcard parameters,
//! typed URL parameters sharing a base path, URL round trips, error handler
//! registration, session layering, change listeners, startup tables, and
//! snapshot atomicity under concurrent writers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use wayfinder_router::{
    ApplicationRouteRegistry, ErrorTarget, ErrorType, Layout, Location, RegistryScope, Route,
    RouteParameters, RouteRegistry, RouteTable, RouteTarget, RoutesChangedEvent,
    SessionRouteRegistry, UrlParameter, UrlParameterSpec, UrlParameterType, ViewId,
    WayfinderError,
};

const A: ViewId = ViewId::new("A");
const B: ViewId = ViewId::new("B");
const L: ViewId = ViewId::new("L");
const SHELL: ViewId = ViewId::new("Shell");
const NOT_FOUND_PAGE: ViewId = ViewId::new("NotFoundPage");

fn string_parameter() -> UrlParameterSpec {
    UrlParameterSpec::required(UrlParameterType::String)
}

fn resolve(registry: &dyn RouteRegistry, path: &str) -> Option<(ViewId, RouteParameters)> {
    let found = registry.navigation_route(&Location::parse(path).unwrap())?;
    Some((found.entry.view(), found.parameters))
}

// ═════════════════════════════════════════════════════════════════════
// 1. Exact templates beat parameterized ones at the same base path
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_exact_template_wins_regardless_of_order() {
    let registry = ApplicationRouteRegistry::new();
    registry.set_route("items/:id", B, Vec::new()).unwrap();
    registry.set_route("items/new", A, Vec::new()).unwrap();

    assert_eq!(resolve(&registry, "items/new").unwrap().0, A);
    let (view, params) = resolve(&registry, "items/12").unwrap();
    assert_eq!(view, B);
    assert_eq!(params.get("id"), Some("12"));
}

// ═════════════════════════════════════════════════════════════════════
// 2. A plain route and a URL-parameter route share "param"
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_param_base_path_shared_by_two_views() {
    let registry = ApplicationRouteRegistry::new();
    registry.set_route("param", A, Vec::new()).unwrap();
    registry
        .set_route_target("param", RouteTarget::new(B).with_url_parameter(string_parameter()))
        .unwrap();

    let (view, params) = resolve(&registry, "param/x").unwrap();
    assert_eq!(view, B);
    assert_eq!(params.get(RouteParameters::URL_PARAMETER_NAME), Some("x"));
    assert_eq!(resolve(&registry, "param").unwrap().0, A);

    assert_eq!(registry.remove_route_target("param", A).unwrap(), 1);
    assert!(resolve(&registry, "param").is_none());
    assert_eq!(resolve(&registry, "param/x").unwrap().0, B);
}

#[test]
fn test_remove_route_drops_every_target_at_base_path() {
    let registry = ApplicationRouteRegistry::new();
    registry.set_route("param", A, Vec::new()).unwrap();
    registry
        .set_route_target("param", RouteTarget::new(B).with_url_parameter(string_parameter()))
        .unwrap();
    assert_eq!(registry.remove_route("param").unwrap(), 2);
    assert!(registry.is_empty());
}

// ═════════════════════════════════════════════════════════════════════
// 3. Optional parameters and aliases
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_optional_alias_of_same_view() {
    let registry = ApplicationRouteRegistry::new();
    registry.set_route("route", L, Vec::new()).unwrap();
    registry.set_route("route/:p?", L, Vec::new()).unwrap();

    assert_eq!(resolve(&registry, "route").unwrap().0, L);
    let (view, params) = resolve(&registry, "route/1").unwrap();
    assert_eq!(view, L);
    assert_eq!(params.get("p"), Some("1"));
    assert!(resolve(&registry, "route/1/2").is_none());
}

#[test]
fn test_optional_conflicting_with_other_view_is_ambiguous() {
    let registry = ApplicationRouteRegistry::new();
    registry.set_route("route", A, Vec::new()).unwrap();
    let err = registry.set_route("route/:p?", B, Vec::new()).unwrap_err();
    assert!(matches!(err, WayfinderError::AmbiguousRoute(_)));
    assert_eq!(resolve(&registry, "route").unwrap().0, A);
}

// ═════════════════════════════════════════════════════════════════════
// 4. Wildcards keep empty segments
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_wildcard_binds_empty_segments() {
    let registry = ApplicationRouteRegistry::new();
    registry.set_route("wild/:p*", A, Vec::new()).unwrap();

    let (_, params) = resolve(&registry, "wild//two/three").unwrap();
    assert_eq!(params.get("p"), Some("/two/three"));
    assert_eq!(params.get_wildcard("p"), vec!["", "two", "three"]);

    let (_, params) = resolve(&registry, "wild").unwrap();
    assert!(params.get_wildcard("p").is_empty());
}

// ═════════════════════════════════════════════════════════════════════
// 5. URL generation round-trips
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_url_round_trip() {
    let registry = ApplicationRouteRegistry::new();
    registry
        .set_route("shop/:category/:item?/:rest*", A, Vec::new())
        .unwrap();
    registry
        .set_route_target(
            "orders",
            RouteTarget::new(B).with_url_parameter(UrlParameterSpec::required(UrlParameterType::Long)),
        )
        .unwrap();

    let cases = [
        RouteParameters::new([("category", "books")]).unwrap(),
        RouteParameters::new([("category", "books"), ("item", "rust")]).unwrap(),
        RouteParameters::new([("category", "books"), ("item", "rust"), ("rest", "a/b")]).unwrap(),
        RouteParameters::new([("category", "books"), ("item", "rust"), ("rest", "")]).unwrap(),
    ];
    for params in cases {
        let url = registry.url(A, &params).unwrap();
        let (view, resolved) = resolve(&registry, &url).unwrap();
        assert_eq!(view, A, "{url}");
        assert_eq!(resolved, params, "{url}");
    }

    let url = registry
        .url(B, &RouteParameters::for_url_parameter(&UrlParameter::Long(9_000_000_000)))
        .unwrap();
    assert_eq!(url, "orders/9000000000");
    assert_eq!(resolve(&registry, &url).unwrap().0, B);
}

#[test]
fn test_url_round_trip_keeps_parameters_in_their_slots() {
    let registry = ApplicationRouteRegistry::new();
    registry.set_route("doc/:lang?/:version?", A, Vec::new()).unwrap();
    for params in [
        RouteParameters::empty(),
        RouteParameters::new([("lang", "en")]).unwrap(),
        RouteParameters::new([("lang", "en"), ("version", "2")]).unwrap(),
    ] {
        let url = registry.url(A, &params).unwrap();
        assert_eq!(resolve(&registry, &url), Some((A, params)), "{url}");
    }
    // Without `lang`, the version would land in the `lang` slot.
    let version_only = RouteParameters::new([("version", "2")]).unwrap();
    assert!(matches!(
        registry.url(A, &version_only),
        Err(WayfinderError::InvalidParameter(_))
    ));
}

#[test]
fn test_url_round_trip_for_root_wildcard() {
    let registry = ApplicationRouteRegistry::new();
    registry.set_route(":path*", A, Vec::new()).unwrap();
    for params in [
        RouteParameters::empty(),
        RouteParameters::new([("path", "a/b")]).unwrap(),
        RouteParameters::new([("path", "a//b")]).unwrap(),
    ] {
        let url = registry.url(A, &params).unwrap();
        assert_eq!(resolve(&registry, &url), Some((A, params)), "{url}");
    }
    let empty = RouteParameters::new([("path", "")]).unwrap();
    assert!(registry.url(A, &empty).is_err());
}

#[test]
fn test_url_rejects_bad_parameters() {
    let registry = ApplicationRouteRegistry::new();
    registry.set_route("user/:id([0-9]+)", A, Vec::new()).unwrap();

    let missing = registry.url(A, &RouteParameters::empty());
    assert!(missing.is_err());
    let ineligible = registry.url(A, &RouteParameters::new([("id", "abc")]).unwrap());
    assert!(ineligible.is_err());
    let unused = registry.url(A, &RouteParameters::new([("id", "1"), ("extra", "x")]).unwrap());
    assert!(unused.is_err());
    let structural = registry.url(A, &RouteParameters::new([("id", "1/2")]).unwrap());
    assert!(structural.is_err());
    assert!(matches!(
        registry.url(B, &RouteParameters::empty()),
        Err(WayfinderError::NotFound(_))
    ));
}

// ═════════════════════════════════════════════════════════════════════
// 6. Error handler registration
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_duplicate_custom_error_handlers_fail() {
    let registry = ApplicationRouteRegistry::new();
    registry
        .set_error_handler(ErrorTarget::new(ErrorType::NOT_FOUND, NOT_FOUND_PAGE))
        .unwrap();
    let err = registry
        .set_error_handler(ErrorTarget::new(ErrorType::NOT_FOUND, A))
        .unwrap_err();
    assert!(matches!(err, WayfinderError::ImproperlyConfigured(_)));

    let target = registry
        .error_target(&WayfinderError::NotFound("x".into()))
        .unwrap();
    assert_eq!(target.view(), NOT_FOUND_PAGE);
}

// ═════════════════════════════════════════════════════════════════════
// 7. Session registries layer over the application registry
// ═════════════════════════════════════════════════════════════════════

fn recorder() -> (Arc<Mutex<Vec<RoutesChangedEvent>>>, Arc<dyn Fn(&RoutesChangedEvent) + Send + Sync>) {
    let events: Arc<Mutex<Vec<RoutesChangedEvent>>> = Arc::default();
    let sink = Arc::clone(&events);
    let listener: Arc<dyn Fn(&RoutesChangedEvent) + Send + Sync> =
        Arc::new(move |event: &RoutesChangedEvent| sink.lock().unwrap().push(event.clone()));
    (events, listener)
}

#[test]
fn test_session_layering_and_listeners() {
    let application = Arc::new(ApplicationRouteRegistry::new());
    application.set_route("home", A, Vec::new()).unwrap();
    let session = SessionRouteRegistry::new(Arc::clone(&application));

    let (app_events, app_listener) = recorder();
    let (session_events, session_listener) = recorder();
    application.add_routes_changed_listener(app_listener);
    let session_id = session.add_routes_changed_listener(session_listener);

    session.set_route("home", B, Vec::new()).unwrap();
    assert_eq!(resolve(&session, "home").unwrap().0, B);
    assert_eq!(resolve(application.as_ref(), "home").unwrap().0, A);
    assert!(app_events.lock().unwrap().is_empty());

    application.set_route("about", A, Vec::new()).unwrap();
    assert_eq!(resolve(&session, "about").unwrap().0, A);
    assert_eq!(app_events.lock().unwrap().len(), 1);
    {
        let seen = session_events.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].scope, RegistryScope::Session);
        assert_eq!(seen[1].scope, RegistryScope::Application);
        assert_eq!(seen[1].added[0].path, "about");
    }

    let paths: Vec<_> = session.registered_routes().into_iter().map(|r| (r.path, r.view)).collect();
    assert_eq!(paths, vec![("about".to_string(), A), ("home".to_string(), B)]);

    assert!(session.remove_routes_changed_listener(session_id));
    application.remove_route("about").unwrap();
    assert_eq!(session_events.lock().unwrap().len(), 2);
}

#[test]
fn test_unchanged_transaction_fires_nothing() {
    let registry = ApplicationRouteRegistry::new();
    let (events, listener) = recorder();
    registry.add_routes_changed_listener(listener);
    registry.update(&mut |_| Ok(())).unwrap();
    let _ = registry.update(&mut |config| {
        config.set_route("x", A, Vec::new())?;
        Err(WayfinderError::ImproperlyConfigured("abort".into()))
    });
    assert!(events.lock().unwrap().is_empty());
    assert!(!registry.has_route("x"));
}

// ═════════════════════════════════════════════════════════════════════
// 8. Startup tables
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_route_table_listing() {
    let registry = ApplicationRouteRegistry::new();
    RouteTable::new()
        .layout(Layout::new(SHELL).prefix("app"))
        .route(Route::new("", A).layout(SHELL))
        .route(Route::new("b", B).layout(SHELL).alias("bee"))
        .route(Route::new("login", L))
        .register(&registry)
        .unwrap();

    assert_eq!(registry.route("app").unwrap().view(), A);
    assert_eq!(registry.route("app/bee").unwrap().view(), B);
    let grouped = registry.routes_by_parent();
    assert_eq!(grouped[&Some(SHELL)].len(), 3);
    assert_eq!(grouped[&None][0].view, L);
}

// ═════════════════════════════════════════════════════════════════════
// 9. Readers never observe half a transaction
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_concurrent_readers_see_whole_batches() {
    let registry = Arc::new(ApplicationRouteRegistry::new());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    let snapshot = registry.configuration();
                    for i in 0..50 {
                        assert_eq!(
                            snapshot.has_route(&format!("left{i}")),
                            snapshot.has_route(&format!("right{i}")),
                        );
                    }
                }
            })
        })
        .collect();

    for i in 0..50 {
        registry
            .update(&mut |config| {
                config.set_route(&format!("left{i}"), A, Vec::new())?;
                config.set_route(&format!("right{i}"), B, Vec::new())
            })
            .unwrap();
    }
    done.store(true, Ordering::SeqCst);
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(registry.registered_routes().len(), 100);
}

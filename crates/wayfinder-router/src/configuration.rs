//! The value a route registry holds.
//!
//! A [`RouteConfiguration`] is plain data: route entries in registration
//! order, the route tree built from them, and the error handlers. Registries
//! hand out shared snapshots of it and mutate private copies inside
//! transactions.

use std::collections::BTreeMap;
use std::sync::Arc;

use wayfinder_core::{ErrorType, WayfinderError, WayfinderResult};

use crate::error_handler::{ErrorHandlers, ErrorTarget};
use crate::location::Location;
use crate::matcher::{normalize_path, RouteEntry, RouteMatch, RouteMatcher};
use crate::parameters::{RouteParameters, UrlParameter};
use crate::target::{RouteData, RouteTarget, ViewId};

/// Routes and error handlers of one registry scope.
#[derive(Debug, Clone, Default)]
pub struct RouteConfiguration {
    entries: Vec<Arc<RouteEntry>>,
    matcher: RouteMatcher,
    errors: ErrorHandlers,
}

impl RouteConfiguration {
    /// An empty configuration with the built-in error handlers.
    pub fn new() -> Self {
        Self {
            errors: ErrorHandlers::with_defaults(),
            ..Self::default()
        }
    }

    /// An empty configuration without any error handler.
    pub fn empty() -> Self {
        Self::default()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Registers `view` at `path`, rendered inside `parents` (innermost first).
    pub fn set_route(&mut self, path: &str, view: ViewId, parents: Vec<ViewId>) -> WayfinderResult<()> {
        self.set_route_target(path, RouteTarget::new(view).with_parents(parents))
    }

    /// Registers `target` at `path`.
    ///
    /// If the target declares a URL parameter, its segment is appended to
    /// the template.
    pub fn set_route_target(&mut self, path: &str, target: RouteTarget) -> WayfinderResult<()> {
        let entry = Arc::new(RouteEntry::new(path, target)?);
        self.matcher.insert(&entry)?;
        tracing::debug!(
            template = %entry.template(),
            view = %entry.view(),
            "route registered"
        );
        self.entries.push(entry);
        Ok(())
    }

    /// Removes every target registered at `path`. Returns the removed entries.
    pub fn remove_route(&mut self, path: &str) -> Vec<Arc<RouteEntry>> {
        let path = normalize_path(path);
        self.remove_where(|entry| entry.path() == path)
    }

    /// Removes only the association of `view` with `path`.
    pub fn remove_route_target(&mut self, path: &str, view: ViewId) -> Vec<Arc<RouteEntry>> {
        let path = normalize_path(path);
        self.remove_where(|entry| entry.path() == path && entry.view() == view)
    }

    /// Removes every route of `view`.
    pub fn remove_view(&mut self, view: ViewId) -> Vec<Arc<RouteEntry>> {
        self.remove_where(|entry| entry.view() == view)
    }

    /// Removes every route. Error handlers are kept.
    pub fn clear_routes(&mut self) -> Vec<Arc<RouteEntry>> {
        self.matcher = RouteMatcher::new();
        std::mem::take(&mut self.entries)
    }

    fn remove_where<F>(&mut self, predicate: F) -> Vec<Arc<RouteEntry>>
    where
        F: Fn(&RouteEntry) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| predicate(entry));
        self.entries = kept;
        for entry in &removed {
            self.matcher.remove(entry.template(), Some(entry.view()));
            tracing::debug!(template = %entry.template(), view = %entry.view(), "route removed");
        }
        removed
    }

    /// Registers an error view.
    pub fn set_error_handler(&mut self, target: ErrorTarget) -> WayfinderResult<()> {
        self.errors.register(target)
    }

    /// Removes the error view registered for exactly `kind`.
    pub fn remove_error_handler(&mut self, kind: ErrorType) -> Option<ErrorTarget> {
        self.errors.remove(kind)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Every entry, in registration order.
    pub fn entries(&self) -> &[Arc<RouteEntry>] {
        &self.entries
    }

    /// Returns `true` if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if any target is registered at `path`.
    pub fn has_route(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.entries.iter().any(|entry| entry.path() == path)
    }

    /// Finds the best entry for `location`.
    pub fn resolve(&self, location: &Location) -> Option<RouteMatch<'_>> {
        self.matcher.find_location(location)
    }

    /// Finds the best entry for raw segments.
    pub fn find(&self, segments: &[&str]) -> Option<RouteMatch<'_>> {
        self.matcher.find(segments)
    }

    /// The target shown for `path`.
    pub fn route(&self, path: &str) -> Option<Arc<RouteTarget>> {
        let location = Location::parse(path).ok()?;
        self.resolve(&location)
            .map(|found| Arc::clone(found.entry.target()))
    }

    /// The target shown for `path` followed by `segments`.
    pub fn route_with_segments(&self, path: &str, segments: &[&str]) -> Option<Arc<RouteTarget>> {
        let location = Location::parse(path).ok()?;
        let mut all = location.route_segments();
        all.extend_from_slice(segments);
        self.find(&all).map(|found| Arc::clone(found.entry.target()))
    }

    /// The first entry registered for `view`. Its template is canonical.
    pub fn entry_for(&self, view: ViewId) -> Option<&Arc<RouteEntry>> {
        self.entries.iter().find(|entry| entry.view() == view)
    }

    /// The canonical template of `view`.
    pub fn template(&self, view: ViewId) -> Option<String> {
        self.entry_for(view).map(|entry| entry.template().to_string())
    }

    /// Builds a URL for `view`.
    ///
    /// Every template of the view is tried in registration order. A URL is
    /// only returned if it resolves back to `view` with the same parameters.
    pub fn url(&self, view: ViewId, parameters: &RouteParameters) -> WayfinderResult<String> {
        let mut failure = None;
        for entry in self.entries.iter().filter(|entry| entry.view() == view) {
            let url = match entry.template().format_url(parameters) {
                Ok(url) => url,
                Err(err) => {
                    failure = Some(err);
                    continue;
                }
            };
            let resolved = Location::parse(&url)
                .ok()
                .and_then(|location| {
                    self.resolve(&location)
                        .map(|found| (found.entry.view(), found.parameters))
                });
            match resolved {
                Some((found, bound)) if found == view && bound == *parameters => {
                    return Ok(url);
                }
                Some((found, bound)) if found == view => {
                    failure = Some(WayfinderError::InvalidParameter(format!(
                        "URL '{url}' for '{view}' resolves with parameters {bound:?}, not {parameters:?}"
                    )));
                }
                Some((found, _)) => {
                    failure = Some(WayfinderError::InvalidParameter(format!(
                        "URL '{url}' for '{view}' is shadowed by '{found}'"
                    )));
                }
                None => {
                    failure = Some(WayfinderError::InvalidParameter(format!(
                        "URL '{url}' for '{view}' does not resolve"
                    )));
                }
            }
        }
        Err(failure.unwrap_or_else(|| {
            WayfinderError::NotFound(format!("'{view}' is not registered as a route target"))
        }))
    }

    /// Builds a URL for a view that takes a typed URL parameter.
    pub fn url_with_parameter(&self, view: ViewId, parameter: &UrlParameter) -> WayfinderResult<String> {
        self.url(view, &RouteParameters::for_url_parameter(parameter))
    }

    /// Every route, sorted by template.
    pub fn routes(&self) -> Vec<RouteData> {
        let mut routes: Vec<_> = self.entries.iter().map(|entry| entry.data()).collect();
        routes.sort_by(|a, b| a.template.cmp(&b.template));
        routes
    }

    /// Routes grouped by their outermost layout. Routes without layouts are
    /// under `None`.
    pub fn routes_by_parent(&self) -> BTreeMap<Option<ViewId>, Vec<RouteData>> {
        let mut grouped: BTreeMap<Option<ViewId>, Vec<RouteData>> = BTreeMap::new();
        for route in self.routes() {
            grouped.entry(route.outermost_parent()).or_default().push(route);
        }
        grouped
    }

    /// Explains for each registered template why `location` does not match it.
    pub fn explain(&self, location: &Location) -> Vec<String> {
        let segments = location.route_segments();
        self.entries
            .iter()
            .filter_map(|entry| {
                entry
                    .template()
                    .explain_mismatch(&segments)
                    .map(|reason| format!("'{}' ({}): {reason}", entry.template(), entry.view()))
            })
            .collect()
    }

    pub const fn error_handlers(&self) -> &ErrorHandlers {
        &self.errors
    }

    /// The error view for `error`.
    pub fn error_target(&self, error: &WayfinderError) -> Option<&ErrorTarget> {
        self.errors.lookup(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{UrlParameterSpec, UrlParameterType};

    const A: ViewId = ViewId::new("A");
    const B: ViewId = ViewId::new("B");
    const LAYOUT: ViewId = ViewId::new("Layout");

    fn view_at(config: &RouteConfiguration, path: &str) -> Option<ViewId> {
        config.route(path).map(|target| target.view())
    }

    #[test]
    fn test_exact_and_url_parameter_variant() {
        let mut config = RouteConfiguration::new();
        config.set_route("param", A, Vec::new()).unwrap();
        config
            .set_route_target(
                "param",
                RouteTarget::new(B).with_url_parameter(UrlParameterSpec::required(UrlParameterType::String)),
            )
            .unwrap();
        assert_eq!(view_at(&config, "param"), Some(A));
        assert_eq!(view_at(&config, "param/x"), Some(B));

        config.remove_route_target("param", A);
        assert_eq!(view_at(&config, "param"), None);
        assert_eq!(view_at(&config, "param/x"), Some(B));
    }

    #[test]
    fn test_remove_route_removes_all_targets_at_path() {
        let mut config = RouteConfiguration::new();
        config.set_route("param", A, Vec::new()).unwrap();
        config
            .set_route_target(
                "/param/",
                RouteTarget::new(B).with_url_parameter(UrlParameterSpec::required(UrlParameterType::Int)),
            )
            .unwrap();
        assert_eq!(config.remove_route("param").len(), 2);
        assert!(config.is_empty());
        assert_eq!(view_at(&config, "param/1"), None);
    }

    #[test]
    fn test_failed_registration_keeps_previous_state() {
        let mut config = RouteConfiguration::new();
        config.set_route("a", A, Vec::new()).unwrap();
        assert!(config.set_route("a", B, Vec::new()).is_err());
        assert_eq!(config.entries().len(), 1);
        assert_eq!(view_at(&config, "a"), Some(A));
    }

    #[test]
    fn test_canonical_template_is_first_registration() {
        let mut config = RouteConfiguration::new();
        config.set_route("home", A, Vec::new()).unwrap();
        config.set_route("", A, Vec::new()).unwrap();
        assert_eq!(config.template(A).as_deref(), Some("home"));
        assert_eq!(config.url(A, &RouteParameters::empty()).unwrap(), "home");
    }

    #[test]
    fn test_url_uses_alias_that_fits_parameters() {
        let mut config = RouteConfiguration::new();
        config.set_route("route", A, Vec::new()).unwrap();
        config.set_route("route/:p?", A, Vec::new()).unwrap();
        let params = RouteParameters::new([("p", "1")]).unwrap();
        assert_eq!(config.url(A, &params).unwrap(), "route/1");
        assert_eq!(config.url(A, &RouteParameters::empty()).unwrap(), "route");
    }

    #[test]
    fn test_url_rejects_shadowed_result() {
        let mut config = RouteConfiguration::new();
        config.set_route("items/new", A, Vec::new()).unwrap();
        config.set_route("items/:id", B, Vec::new()).unwrap();
        let params = RouteParameters::new([("id", "new")]).unwrap();
        assert!(matches!(
            config.url(B, &params),
            Err(WayfinderError::InvalidParameter(_))
        ));
        let params = RouteParameters::new([("id", "7")]).unwrap();
        assert_eq!(config.url(B, &params).unwrap(), "items/7");
    }

    #[test]
    fn test_url_rejects_shifted_optional() {
        let mut config = RouteConfiguration::new();
        config.set_route("a/:x?/:y?", A, Vec::new()).unwrap();
        let both = RouteParameters::new([("x", "1"), ("y", "2")]).unwrap();
        assert_eq!(config.url(A, &both).unwrap(), "a/1/2");
        let only_y = RouteParameters::new([("y", "1")]).unwrap();
        let err = config.url(A, &only_y).unwrap_err();
        assert!(matches!(err, WayfinderError::InvalidParameter(_)));
        assert!(err.to_string().contains("a/1"));
    }

    #[test]
    fn test_url_rejects_empty_root_wildcard() {
        let mut config = RouteConfiguration::new();
        config.set_route(":p*", A, Vec::new()).unwrap();
        let empty = RouteParameters::new([("p", "")]).unwrap();
        assert!(matches!(
            config.url(A, &empty),
            Err(WayfinderError::InvalidParameter(_))
        ));
        assert_eq!(config.url(A, &RouteParameters::empty()).unwrap(), "");
        let nested = RouteParameters::new([("p", "docs/intro")]).unwrap();
        assert_eq!(config.url(A, &nested).unwrap(), "docs/intro");
    }

    #[test]
    fn test_url_for_unknown_view() {
        let config = RouteConfiguration::new();
        assert!(matches!(
            config.url(A, &RouteParameters::empty()),
            Err(WayfinderError::NotFound(_))
        ));
    }

    #[test]
    fn test_url_with_typed_parameter() {
        let mut config = RouteConfiguration::new();
        config
            .set_route_target(
                "orders",
                RouteTarget::new(A).with_url_parameter(UrlParameterSpec::required(UrlParameterType::Long)),
            )
            .unwrap();
        assert_eq!(
            config.url_with_parameter(A, &UrlParameter::Long(9)).unwrap(),
            "orders/9"
        );
        assert!(config
            .url_with_parameter(A, &UrlParameter::Text("x".into()))
            .is_err());
    }

    #[test]
    fn test_route_with_segments() {
        let mut config = RouteConfiguration::new();
        config.set_route("users/:id", A, Vec::new()).unwrap();
        assert_eq!(
            config.route_with_segments("users", &["5"]).map(|t| t.view()),
            Some(A)
        );
        assert!(config.route_with_segments("users", &[]).is_none());
    }

    #[test]
    fn test_routes_sorted_and_grouped() {
        let mut config = RouteConfiguration::new();
        config.set_route("b", B, vec![LAYOUT]).unwrap();
        config.set_route("a", A, Vec::new()).unwrap();
        let routes = config.routes();
        assert_eq!(routes[0].template, "a");
        assert_eq!(routes[1].template, "b");
        let grouped = config.routes_by_parent();
        assert_eq!(grouped[&Some(LAYOUT)].len(), 1);
        assert_eq!(grouped[&None][0].view, A);
    }

    #[test]
    fn test_explain_lists_near_misses() {
        let mut config = RouteConfiguration::new();
        config.set_route("users/:id(\\d+)", A, Vec::new()).unwrap();
        config.set_route("about", B, Vec::new()).unwrap();
        let lines = config.explain(&Location::parse("users/abc").unwrap());
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("'users/:id(\\d+)' (A):"));
        assert!(config.explain(&Location::parse("about").unwrap()).len() == 1);
    }

    #[test]
    fn test_has_route_and_remove_view() {
        let mut config = RouteConfiguration::new();
        config.set_route("a", A, Vec::new()).unwrap();
        config.set_route("alias", A, Vec::new()).unwrap();
        assert!(config.has_route("/a"));
        assert_eq!(config.remove_view(A).len(), 2);
        assert!(!config.has_route("a"));
    }

    #[test]
    fn test_new_has_default_error_handlers() {
        assert_eq!(RouteConfiguration::new().error_handlers().len(), 3);
        assert!(RouteConfiguration::empty().error_handlers().is_empty());
    }
}

//! Turning a location into a navigation state.

use std::sync::Arc;

use wayfinder_core::WayfinderResult;

use crate::location::Location;
use crate::matcher::RouteEntry;
use crate::parameters::{RouteParameters, UrlParameter};
use crate::registry::RouteRegistry;
use crate::target::{RouteTarget, ViewId};

/// The outcome of resolving one location.
#[derive(Debug, Clone)]
pub struct NavigationState {
    location: Location,
    entry: Arc<RouteEntry>,
    parameters: RouteParameters,
}

impl NavigationState {
    pub const fn new(location: Location, entry: Arc<RouteEntry>, parameters: RouteParameters) -> Self {
        Self {
            location,
            entry,
            parameters,
        }
    }

    /// The resolved location.
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// The matched route.
    pub const fn entry(&self) -> &Arc<RouteEntry> {
        &self.entry
    }

    pub fn target(&self) -> &RouteTarget {
        self.entry.target()
    }

    pub fn view(&self) -> ViewId {
        self.entry.view()
    }

    /// The matched template text.
    pub fn template(&self) -> String {
        self.entry.template().to_string()
    }

    /// Parameters extracted from the location.
    pub const fn parameters(&self) -> &RouteParameters {
        &self.parameters
    }

    /// The typed URL parameter, if the target declares one.
    ///
    /// Conversion failures are not-found errors.
    pub fn url_parameter(&self) -> WayfinderResult<Option<UrlParameter>> {
        match self.target().url_parameter() {
            Some(spec) => spec.convert(self.parameters.get(RouteParameters::URL_PARAMETER_NAME)),
            None => Ok(None),
        }
    }
}

/// Picks the navigation state for a location.
pub trait RouteResolver: Send + Sync {
    /// Returns `None` if no route matches.
    fn resolve(&self, registry: &dyn RouteRegistry, location: &Location) -> Option<NavigationState>;
}

/// Resolves through the registry's route tree.
///
/// An exact template always beats parameterized ones at the same base path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRouteResolver;

impl RouteResolver for DefaultRouteResolver {
    fn resolve(&self, registry: &dyn RouteRegistry, location: &Location) -> Option<NavigationState> {
        let found = registry.navigation_route(location)?;
        Some(NavigationState::new(location.clone(), found.entry, found.parameters))
    }
}

#[cfg(test)]
mod tests {
    use wayfinder_core::WayfinderError;

    use super::*;
    use crate::parameters::{UrlParameterSpec, UrlParameterType};
    use crate::registry::ApplicationRouteRegistry;

    const A: ViewId = ViewId::new("A");
    const B: ViewId = ViewId::new("B");

    fn resolve(registry: &ApplicationRouteRegistry, path: &str) -> Option<NavigationState> {
        DefaultRouteResolver.resolve(registry, &Location::parse(path).unwrap())
    }

    #[test]
    fn test_exact_beats_parameterized_in_any_order() {
        let registry = ApplicationRouteRegistry::new();
        registry
            .set_route_target(
                "param",
                RouteTarget::new(B).with_url_parameter(UrlParameterSpec::required(UrlParameterType::String)),
            )
            .unwrap();
        registry.set_route("param", A, Vec::new()).unwrap();
        assert_eq!(resolve(&registry, "param").unwrap().view(), A);
        let state = resolve(&registry, "param/x").unwrap();
        assert_eq!(state.view(), B);
        assert_eq!(state.url_parameter().unwrap(), Some(UrlParameter::Text("x".into())));
    }

    #[test]
    fn test_typed_parameter_conversion() {
        let registry = ApplicationRouteRegistry::new();
        registry
            .set_route_target(
                "flags",
                RouteTarget::new(A).with_url_parameter(UrlParameterSpec::optional(UrlParameterType::Bool)),
            )
            .unwrap();
        let state = resolve(&registry, "flags/TRUE").unwrap();
        assert_eq!(state.url_parameter().unwrap(), Some(UrlParameter::Bool(true)));
        assert_eq!(resolve(&registry, "flags").unwrap().url_parameter().unwrap(), None);
        assert!(resolve(&registry, "flags/maybe").is_none());
    }

    #[test]
    fn test_non_text_wildcard_is_not_found() {
        let registry = ApplicationRouteRegistry::new();
        registry
            .set_route_target(
                "ids",
                RouteTarget::new(A).with_url_parameter(UrlParameterSpec::wildcard(UrlParameterType::Int)),
            )
            .unwrap();
        let state = resolve(&registry, "ids/1/2").unwrap();
        assert!(matches!(state.url_parameter(), Err(WayfinderError::NotFound(_))));
    }

    #[test]
    fn test_no_match() {
        let registry = ApplicationRouteRegistry::new();
        assert!(resolve(&registry, "nothing").is_none());
    }
}

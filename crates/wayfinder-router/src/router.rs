//! The router: entry point for navigations and URL generation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use wayfinder_core::{Settings, WayfinderError, WayfinderResult};

use crate::event::{Destination, NavigationTrigger};
use crate::location::Location;
use crate::navigation::NavigationOutcome;
use crate::parameters::{RouteParameters, UrlParameter};
use crate::registry::RouteRegistry;
use crate::resolver::{DefaultRouteResolver, NavigationState, RouteResolver};
use crate::target::{RouteData, ViewId};
use crate::ui::Ui;
use crate::view::Instantiator;

/// Navigates UIs using a registry, a resolver and an instantiator.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use wayfinder_router::{
///     ApplicationRouteRegistry, RouteRegistry, Router, Ui, View, ViewFactory, ViewId,
/// };
///
/// #[derive(Default)]
/// struct Home;
/// impl View for Home {}
///
/// const HOME: ViewId = ViewId::new("Home");
///
/// let registry = Arc::new(ApplicationRouteRegistry::new());
/// registry.set_route("", HOME, Vec::new()).unwrap();
/// let factory = ViewFactory::new().with_default::<Home>(HOME);
/// let router = Router::new(registry, Arc::new(factory));
///
/// let mut ui = Ui::new();
/// let outcome = router.navigate_to(&mut ui, "").unwrap();
/// assert_eq!(outcome.status().as_u16(), 200);
/// assert_eq!(ui.active_chain(), vec![HOME]);
/// ```
#[derive(Clone)]
pub struct Router {
    pub(crate) registry: Arc<dyn RouteRegistry>,
    pub(crate) resolver: Arc<dyn RouteResolver>,
    pub(crate) instantiator: Arc<dyn Instantiator>,
    pub(crate) settings: Arc<Settings>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("scope", &self.registry.scope())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// A router with default settings and the default resolver.
    pub fn new(registry: Arc<dyn RouteRegistry>, instantiator: Arc<dyn Instantiator>) -> Self {
        Self {
            registry,
            resolver: Arc::new(DefaultRouteResolver),
            instantiator,
            settings: Arc::new(Settings::default()),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Arc<Settings>) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn RouteResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn registry(&self) -> &Arc<dyn RouteRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Navigates `ui` to `location`.
    ///
    /// Errors are rendered by error views and reported through the outcome's
    /// status. Only a failing error view makes this return `Err`.
    pub fn navigate(
        &self,
        ui: &mut Ui,
        location: Location,
        trigger: NavigationTrigger,
    ) -> WayfinderResult<NavigationOutcome> {
        self.run(ui, location, trigger)
    }

    /// Parses `path` (with optional query and fragment) and navigates to it.
    pub fn navigate_to(&self, ui: &mut Ui, path: &str) -> WayfinderResult<NavigationOutcome> {
        let location = Location::parse(path)?;
        self.navigate(ui, location, NavigationTrigger::Programmatic)
    }

    /// Navigates to the URL of `view`.
    pub fn navigate_to_view(
        &self,
        ui: &mut Ui,
        view: ViewId,
        parameters: &RouteParameters,
    ) -> WayfinderResult<NavigationOutcome> {
        let location = Location::parse(&self.registry.url(view, parameters)?)?;
        self.navigate(ui, location, NavigationTrigger::Programmatic)
    }

    /// Resolves `location` without navigating.
    pub fn resolve_navigation_target(&self, location: &Location) -> Option<NavigationState> {
        self.resolver.resolve(self.registry.as_ref(), location)
    }

    /// The URL of a view without parameters.
    pub fn url(&self, view: ViewId) -> WayfinderResult<String> {
        self.registry.url(view, &RouteParameters::empty())
    }

    /// The URL of `view` with route parameters.
    pub fn url_with_parameters(&self, view: ViewId, parameters: &RouteParameters) -> WayfinderResult<String> {
        self.registry.url(view, parameters)
    }

    /// The URL of a view taking a typed URL parameter.
    pub fn url_with_parameter(&self, view: ViewId, parameter: &UrlParameter) -> WayfinderResult<String> {
        self.registry
            .url(view, &RouteParameters::for_url_parameter(parameter))
    }

    /// The leading static part of the canonical template of `view`.
    pub fn url_base(&self, view: ViewId) -> WayfinderResult<String> {
        let template = self.registry.template(view).ok_or_else(|| {
            WayfinderError::NotFound(format!("'{view}' is not registered as a route target"))
        })?;
        Ok(crate::template::RouteTemplate::parse(&template)?.base_path())
    }

    /// Every visible route, sorted by template.
    pub fn routes(&self) -> Vec<RouteData> {
        self.registry.registered_routes()
    }

    /// Visible routes grouped by outermost layout.
    pub fn routes_by_parent(&self) -> BTreeMap<Option<ViewId>, Vec<RouteData>> {
        self.registry.routes_by_parent()
    }

    pub(crate) fn destination_location(&self, destination: Destination) -> WayfinderResult<Location> {
        match destination {
            Destination::Location(location) => Ok(location),
            Destination::Path(path) => Location::parse(&path),
            Destination::View { view, parameters } => Location::parse(&self.registry.url(view, &parameters)?),
        }
    }
}

//! Route registries.
//!
//! A registry holds a [`RouteConfiguration`] snapshot behind an
//! `RwLock<Arc<_>>`. Every change runs as a transaction: the writer takes the
//! update lock, edits a private copy, and swaps it in only if the whole
//! transaction succeeded. Readers clone the current `Arc` and never observe a
//! half-applied batch.
//!
//! [`ApplicationRouteRegistry`] is shared by the whole process.
//! [`SessionRouteRegistry`] layers routes for one session on top of it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use wayfinder_core::{WayfinderError, WayfinderResult};

use crate::configuration::RouteConfiguration;
use crate::error_handler::ErrorTarget;
use crate::listeners::{ListenerId, ListenerList};
use crate::location::Location;
use crate::matcher::RouteEntry;
use crate::parameters::RouteParameters;
use crate::target::{RouteData, RouteTarget, ViewId};

/// Which registry a change happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryScope {
    Application,
    Session,
}

/// Routes added and removed by one committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutesChangedEvent {
    pub scope: RegistryScope,
    pub added: Vec<RouteData>,
    pub removed: Vec<RouteData>,
}

/// Callback for [`RoutesChangedEvent`]s.
pub type RoutesChangedListener = dyn Fn(&RoutesChangedEvent) + Send + Sync;

/// A route found for a location.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub entry: Arc<RouteEntry>,
    pub parameters: RouteParameters,
}

/// Transaction callback passed to [`RouteRegistry::update`].
pub type Transaction<'a> = dyn FnMut(&mut RouteConfiguration) -> WayfinderResult<()> + 'a;

/// Read and write access to registered routes.
pub trait RouteRegistry: Send + Sync {
    /// The scope of this registry.
    fn scope(&self) -> RegistryScope;

    /// Runs `transaction` against a copy of the configuration and commits the
    /// copy if it succeeds. Nothing changes if it fails.
    fn update(&self, transaction: &mut Transaction<'_>) -> WayfinderResult<()>;

    /// The best route for `location`.
    fn navigation_route(&self, location: &Location) -> Option<ResolvedRoute>;

    /// The error view for `error`.
    fn error_target(&self, error: &WayfinderError) -> Option<ErrorTarget>;

    /// The canonical template of `view`.
    fn template(&self, view: ViewId) -> Option<String>;

    /// Builds a URL for `view` that resolves back to it.
    fn url(&self, view: ViewId, parameters: &RouteParameters) -> WayfinderResult<String>;

    /// Every visible route, sorted by template.
    fn registered_routes(&self) -> Vec<RouteData>;

    /// Why `location` matches none of the visible templates.
    fn explain(&self, location: &Location) -> Vec<String>;

    /// Adds a listener for committed route changes.
    fn add_routes_changed_listener(&self, listener: Arc<RoutesChangedListener>) -> ListenerId;

    /// Removes a listener. Returns `true` if it was registered.
    fn remove_routes_changed_listener(&self, id: ListenerId) -> bool;

    // ── Provided ─────────────────────────────────────────────────────

    /// Registers `view` at `path` inside `parents`, innermost first.
    fn set_route(&self, path: &str, view: ViewId, parents: Vec<ViewId>) -> WayfinderResult<()> {
        self.update(&mut |config| config.set_route(path, view, parents.clone()))
    }

    /// Registers a full target at `path`.
    fn set_route_target(&self, path: &str, target: RouteTarget) -> WayfinderResult<()> {
        self.update(&mut |config| config.set_route_target(path, target.clone()))
    }

    /// Removes every target at `path`. Returns how many routes were removed.
    fn remove_route(&self, path: &str) -> WayfinderResult<usize> {
        let mut removed = 0;
        self.update(&mut |config| {
            removed = config.remove_route(path).len();
            Ok(())
        })?;
        Ok(removed)
    }

    /// Removes the association of `view` with `path` only.
    fn remove_route_target(&self, path: &str, view: ViewId) -> WayfinderResult<usize> {
        let mut removed = 0;
        self.update(&mut |config| {
            removed = config.remove_route_target(path, view).len();
            Ok(())
        })?;
        Ok(removed)
    }

    /// Removes every route of `view`.
    fn remove_view(&self, view: ViewId) -> WayfinderResult<usize> {
        let mut removed = 0;
        self.update(&mut |config| {
            removed = config.remove_view(view).len();
            Ok(())
        })?;
        Ok(removed)
    }

    /// Registers an error view.
    fn set_error_handler(&self, target: ErrorTarget) -> WayfinderResult<()> {
        self.update(&mut |config| config.set_error_handler(target.clone()))
    }

    /// The target shown for `path`.
    fn route(&self, path: &str) -> Option<Arc<RouteTarget>> {
        let location = Location::parse(path).ok()?;
        self.navigation_route(&location)
            .map(|found| Arc::clone(found.entry.target()))
    }

    /// Returns `true` if any visible target is registered at `path`.
    fn has_route(&self, path: &str) -> bool {
        let path = crate::matcher::normalize_path(path);
        self.registered_routes().iter().any(|route| route.path == path)
    }

    /// Visible routes grouped by outermost layout.
    fn routes_by_parent(&self) -> BTreeMap<Option<ViewId>, Vec<RouteData>> {
        let mut grouped: BTreeMap<Option<ViewId>, Vec<RouteData>> = BTreeMap::new();
        for route in self.registered_routes() {
            grouped.entry(route.outermost_parent()).or_default().push(route);
        }
        grouped
    }

    /// Returns `true` if no route is visible.
    fn is_empty(&self) -> bool {
        self.registered_routes().is_empty()
    }
}

struct RegistryCore {
    scope: RegistryScope,
    snapshot: RwLock<Arc<RouteConfiguration>>,
    update_lock: Mutex<()>,
    listeners: ListenerList<RoutesChangedListener>,
}

impl RegistryCore {
    fn new(scope: RegistryScope, configuration: RouteConfiguration) -> Self {
        Self {
            scope,
            snapshot: RwLock::new(Arc::new(configuration)),
            update_lock: Mutex::new(()),
            listeners: ListenerList::new(),
        }
    }

    fn snapshot(&self) -> Arc<RouteConfiguration> {
        Arc::clone(&self.snapshot.read().expect("registry snapshot lock poisoned"))
    }

    fn update(&self, transaction: &mut Transaction<'_>) -> WayfinderResult<()> {
        let guard = self.update_lock.lock().expect("registry update lock poisoned");
        let current = self.snapshot();
        let mut working = RouteConfiguration::clone(&current);
        if let Err(err) = transaction(&mut working) {
            tracing::debug!(scope = ?self.scope, error = %err, "route transaction rolled back");
            return Err(err);
        }
        let event = diff(self.scope, &current, &working);
        *self.snapshot.write().expect("registry snapshot lock poisoned") = Arc::new(working);
        drop(guard);

        if let Some(event) = event {
            tracing::debug!(
                scope = ?event.scope,
                added = event.added.len(),
                removed = event.removed.len(),
                "routes changed"
            );
            self.listeners.fire(&event);
        }
        Ok(())
    }
}

impl fmt::Debug for RegistryCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCore")
            .field("scope", &self.scope)
            .field("routes", &self.snapshot().entries().len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn diff(
    scope: RegistryScope,
    before: &RouteConfiguration,
    after: &RouteConfiguration,
) -> Option<RoutesChangedEvent> {
    let missing_from = |haystack: &RouteConfiguration, entry: &Arc<RouteEntry>| {
        !haystack.entries().iter().any(|other| Arc::ptr_eq(other, entry))
    };
    let added: Vec<_> = after
        .entries()
        .iter()
        .filter(|entry| missing_from(before, entry))
        .map(|entry| entry.data())
        .collect();
    let removed: Vec<_> = before
        .entries()
        .iter()
        .filter(|entry| missing_from(after, entry))
        .map(|entry| entry.data())
        .collect();
    if added.is_empty() && removed.is_empty() {
        None
    } else {
        Some(RoutesChangedEvent {
            scope,
            added,
            removed,
        })
    }
}

/// The process-wide registry.
///
/// # Examples
///
/// ```
/// use wayfinder_router::{ApplicationRouteRegistry, RouteRegistry, ViewId};
///
/// let registry = ApplicationRouteRegistry::new();
/// registry.update(&mut |config| {
///     config.set_route("", ViewId::new("Home"), Vec::new())?;
///     config.set_route("about", ViewId::new("About"), Vec::new())
/// })
/// .unwrap();
/// assert_eq!(registry.route("about").unwrap().view(), ViewId::new("About"));
/// ```
#[derive(Debug)]
pub struct ApplicationRouteRegistry {
    core: RegistryCore,
}

impl Default for ApplicationRouteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationRouteRegistry {
    /// A registry with no routes and the built-in error views.
    pub fn new() -> Self {
        Self::with_configuration(RouteConfiguration::new())
    }

    /// A registry starting from `configuration`.
    pub fn with_configuration(configuration: RouteConfiguration) -> Self {
        Self {
            core: RegistryCore::new(RegistryScope::Application, configuration),
        }
    }

    /// The current configuration.
    pub fn configuration(&self) -> Arc<RouteConfiguration> {
        self.core.snapshot()
    }
}

impl RouteRegistry for ApplicationRouteRegistry {
    fn scope(&self) -> RegistryScope {
        RegistryScope::Application
    }

    fn update(&self, transaction: &mut Transaction<'_>) -> WayfinderResult<()> {
        self.core.update(transaction)
    }

    fn navigation_route(&self, location: &Location) -> Option<ResolvedRoute> {
        let config = self.core.snapshot();
        config.resolve(location).map(|found| ResolvedRoute {
            entry: Arc::clone(found.entry),
            parameters: found.parameters,
        })
    }

    fn error_target(&self, error: &WayfinderError) -> Option<ErrorTarget> {
        self.core.snapshot().error_target(error).cloned()
    }

    fn template(&self, view: ViewId) -> Option<String> {
        self.core.snapshot().template(view)
    }

    fn url(&self, view: ViewId, parameters: &RouteParameters) -> WayfinderResult<String> {
        self.core.snapshot().url(view, parameters)
    }

    fn registered_routes(&self) -> Vec<RouteData> {
        self.core.snapshot().routes()
    }

    fn explain(&self, location: &Location) -> Vec<String> {
        self.core.snapshot().explain(location)
    }

    fn add_routes_changed_listener(&self, listener: Arc<RoutesChangedListener>) -> ListenerId {
        self.core.listeners.add(listener)
    }

    fn remove_routes_changed_listener(&self, id: ListenerId) -> bool {
        self.core.listeners.remove(id)
    }
}

/// Routes for one session, layered over the application registry.
///
/// Reads look at the session routes first and fall back to the application
/// registry, so application changes show through immediately. Writes only
/// touch the session.
#[derive(Debug)]
pub struct SessionRouteRegistry {
    parent: Arc<ApplicationRouteRegistry>,
    core: RegistryCore,
}

impl SessionRouteRegistry {
    /// An empty session scope over `parent`.
    pub fn new(parent: Arc<ApplicationRouteRegistry>) -> Self {
        Self {
            parent,
            core: RegistryCore::new(RegistryScope::Session, RouteConfiguration::empty()),
        }
    }

    /// The application registry below this session.
    pub const fn parent(&self) -> &Arc<ApplicationRouteRegistry> {
        &self.parent
    }

    /// The session's own configuration, without application routes.
    pub fn configuration(&self) -> Arc<RouteConfiguration> {
        self.core.snapshot()
    }
}

impl RouteRegistry for SessionRouteRegistry {
    fn scope(&self) -> RegistryScope {
        RegistryScope::Session
    }

    fn update(&self, transaction: &mut Transaction<'_>) -> WayfinderResult<()> {
        self.core.update(transaction)
    }

    fn navigation_route(&self, location: &Location) -> Option<ResolvedRoute> {
        let config = self.core.snapshot();
        let own = config.resolve(location).map(|found| ResolvedRoute {
            entry: Arc::clone(found.entry),
            parameters: found.parameters,
        });
        own.or_else(|| self.parent.navigation_route(location))
    }

    fn error_target(&self, error: &WayfinderError) -> Option<ErrorTarget> {
        let own = self.core.snapshot().error_target(error).cloned();
        own.or_else(|| self.parent.error_target(error))
    }

    fn template(&self, view: ViewId) -> Option<String> {
        self.core
            .snapshot()
            .template(view)
            .or_else(|| self.parent.template(view))
    }

    fn url(&self, view: ViewId, parameters: &RouteParameters) -> WayfinderResult<String> {
        let config = self.core.snapshot();
        if config.entry_for(view).is_some() {
            config.url(view, parameters)
        } else {
            self.parent.url(view, parameters)
        }
    }

    fn registered_routes(&self) -> Vec<RouteData> {
        let config = self.core.snapshot();
        let mut routes = config.routes();
        routes.extend(
            self.parent
                .registered_routes()
                .into_iter()
                .filter(|route| !config.has_route(&route.path)),
        );
        routes.sort_by(|a, b| a.template.cmp(&b.template));
        routes
    }

    fn explain(&self, location: &Location) -> Vec<String> {
        let mut lines = self.core.snapshot().explain(location);
        lines.extend(self.parent.explain(location));
        lines
    }

    /// The listener also hears application-scope changes.
    fn add_routes_changed_listener(&self, listener: Arc<RoutesChangedListener>) -> ListenerId {
        let id = self.core.listeners.add(Arc::clone(&listener));
        self.parent.core.listeners.insert(id, listener);
        id
    }

    fn remove_routes_changed_listener(&self, id: ListenerId) -> bool {
        let own = self.core.listeners.remove(id);
        let parent = self.parent.core.listeners.remove(id);
        own || parent
    }
}

/// Listeners this session placed on the application registry go with it.
impl Drop for SessionRouteRegistry {
    fn drop(&mut self) {
        for id in self.core.listeners.ids() {
            self.parent.core.listeners.remove(id);
        }
    }
}

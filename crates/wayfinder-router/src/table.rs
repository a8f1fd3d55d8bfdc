//! Startup registration of routes, layouts and error views.
//!
//! A [`RouteTable`] collects declarations and registers them in a single
//! transaction. Layout parent chains are flattened and route prefixes are
//! composed once, here, so nothing walks layout relationships while
//! navigating.
//!
//! # Examples
//!
//! ```
//! use wayfinder_router::{
//!     ApplicationRouteRegistry, Layout, Route, RouteRegistry, RouteTable, ViewId,
//! };
//!
//! const SHELL: ViewId = ViewId::new("Shell");
//! const ADMIN: ViewId = ViewId::new("AdminLayout");
//! const USERS: ViewId = ViewId::new("Users");
//!
//! let registry = ApplicationRouteRegistry::new();
//! RouteTable::new()
//!     .layout(Layout::new(SHELL))
//!     .layout(Layout::new(ADMIN).parent(SHELL).prefix("admin"))
//!     .route(Route::new("users", USERS).layout(ADMIN))
//!     .register(&registry)
//!     .unwrap();
//!
//! let target = registry.route("admin/users").unwrap();
//! assert_eq!(target.chain(), vec![SHELL, ADMIN, USERS]);
//! ```

use std::collections::HashMap;

use wayfinder_core::{ErrorType, WayfinderError, WayfinderResult};

use crate::configuration::RouteConfiguration;
use crate::error_handler::ErrorTarget;
use crate::matcher::normalize_path;
use crate::parameters::UrlParameterSpec;
use crate::registry::RouteRegistry;
use crate::target::{RouteTarget, ViewId};

/// A layout declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    view: ViewId,
    parent: Option<ViewId>,
    prefix: Option<String>,
    absolute: bool,
}

impl Layout {
    pub const fn new(view: ViewId) -> Self {
        Self {
            view,
            parent: None,
            prefix: None,
            absolute: false,
        }
    }

    /// Renders this layout inside `parent`.
    #[must_use]
    pub const fn parent(mut self, parent: ViewId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Prepends `prefix` to the paths of everything inside this layout.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Stops prefixes of outer layouts from being prepended.
    #[must_use]
    pub const fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }
}

/// A route declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    path: String,
    view: ViewId,
    layout: Option<ViewId>,
    url_parameter: Option<UrlParameterSpec>,
    aliases: Vec<String>,
    absolute: bool,
}

impl Route {
    pub fn new(path: impl Into<String>, view: ViewId) -> Self {
        Self {
            path: path.into(),
            view,
            layout: None,
            url_parameter: None,
            aliases: Vec::new(),
            absolute: false,
        }
    }

    /// Renders the view inside `layout`.
    #[must_use]
    pub const fn layout(mut self, layout: ViewId) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Declares the typed URL parameter of the view.
    #[must_use]
    pub const fn url_parameter(mut self, spec: UrlParameterSpec) -> Self {
        self.url_parameter = Some(spec);
        self
    }

    /// Registers the view under another path as well.
    #[must_use]
    pub fn alias(mut self, path: impl Into<String>) -> Self {
        self.aliases.push(path.into());
        self
    }

    /// Ignores the prefixes of the enclosing layouts.
    #[must_use]
    pub const fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }
}

/// An error view declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    kind: ErrorType,
    view: ViewId,
    layout: Option<ViewId>,
}

impl ErrorView {
    pub const fn new(kind: ErrorType, view: ViewId) -> Self {
        Self {
            kind,
            view,
            layout: None,
        }
    }

    #[must_use]
    pub const fn layout(mut self, layout: ViewId) -> Self {
        self.layout = Some(layout);
        self
    }
}

/// Collected declarations, registered together.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    layouts: Vec<Layout>,
    routes: Vec<Route>,
    error_views: Vec<ErrorView>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layouts.push(layout);
        self
    }

    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    #[must_use]
    pub fn error_view(mut self, error_view: ErrorView) -> Self {
        self.error_views.push(error_view);
        self
    }

    /// Registers everything in one transaction. Nothing is registered if
    /// any declaration is invalid.
    pub fn register(&self, registry: &dyn RouteRegistry) -> WayfinderResult<()> {
        registry.update(&mut |config| self.apply(config))
    }

    /// Adds every declaration to `config`.
    pub fn apply(&self, config: &mut RouteConfiguration) -> WayfinderResult<()> {
        let layouts = self.layout_index()?;
        for route in &self.routes {
            let parents = parent_chain(&layouts, route.layout)?;
            let paths = std::iter::once(&route.path).chain(&route.aliases);
            for path in paths {
                let full_path = compose_path(&layouts, &parents, path, route.absolute);
                let mut target = RouteTarget::new(route.view).with_parents(parents.clone());
                if let Some(spec) = route.url_parameter {
                    target = target.with_url_parameter(spec);
                }
                config.set_route_target(&full_path, target)?;
            }
        }
        for error_view in &self.error_views {
            let parents = parent_chain(&layouts, error_view.layout)?;
            config.set_error_handler(
                ErrorTarget::new(error_view.kind, error_view.view).with_parents(parents),
            )?;
        }
        Ok(())
    }

    fn layout_index(&self) -> WayfinderResult<HashMap<ViewId, &Layout>> {
        let mut index = HashMap::with_capacity(self.layouts.len());
        for layout in &self.layouts {
            if index.insert(layout.view, layout).is_some() {
                return Err(WayfinderError::ImproperlyConfigured(format!(
                    "layout '{}' is declared twice",
                    layout.view
                )));
            }
        }
        Ok(index)
    }
}

/// The layout chain starting at `layout`, innermost first.
fn parent_chain(layouts: &HashMap<ViewId, &Layout>, layout: Option<ViewId>) -> WayfinderResult<Vec<ViewId>> {
    let mut chain: Vec<ViewId> = Vec::new();
    let mut next = layout;
    while let Some(view) = next {
        if chain.contains(&view) {
            let cycle: Vec<_> = chain.iter().map(ToString::to_string).collect();
            return Err(WayfinderError::ImproperlyConfigured(format!(
                "layout cycle: {} -> {view}",
                cycle.join(" -> ")
            )));
        }
        let declared = layouts.get(&view).ok_or_else(|| {
            WayfinderError::ImproperlyConfigured(format!("layout '{view}' is not declared"))
        })?;
        chain.push(view);
        next = declared.parent;
    }
    Ok(chain)
}

/// Prepends layout prefixes, innermost first, until an absolute one.
fn compose_path(
    layouts: &HashMap<ViewId, &Layout>,
    parents: &[ViewId],
    path: &str,
    absolute: bool,
) -> String {
    let mut parts = vec![normalize_path(path)];
    if !absolute {
        for layout in parents.iter().filter_map(|view| layouts.get(view)) {
            if let Some(prefix) = &layout.prefix {
                parts.push(normalize_path(prefix));
            }
            if layout.absolute {
                break;
            }
        }
    }
    parts.reverse();
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

//! # wayfinder-router
//!
//! Client-side navigation for view trees. Views register under path
//! templates, optionally inside nested layouts. The [`Router`] resolves a
//! [`Location`] to a view chain, runs the before-leave, before-enter and
//! after-navigation lifecycle on a [`Ui`], follows forwards and reroutes,
//! and renders errors through error views picked by [`ErrorType`].
//!
//! ## Modules
//!
//! - [`location`] - Locations and query parameters
//! - [`parameters`] - Route parameters and typed URL parameters
//! - [`template`] - Route template parsing
//! - [`matcher`] - The segment tree routes are matched against
//! - [`configuration`] - Registry snapshots
//! - [`registry`] - Application and session route registries
//! - [`table`] - Startup registration with layouts and prefixes
//! - [`resolver`] - Location to navigation state
//! - [`view`] - The view trait and instantiation
//! - [`event`] - Navigation events and redirects
//! - [`navigation`] - The navigation lifecycle
//! - [`error_handler`] - Error view registration and lookup
//! - [`error_views`] - Built-in error views
//! - [`link`] - Router links and highlighting
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use wayfinder_router::{
//!     ApplicationRouteRegistry, BeforeEnterEvent, Capabilities, Route, RouteTable, Router,
//!     Ui, View, ViewFactory, ViewId,
//! };
//! use wayfinder_core::WayfinderResult;
//!
//! #[derive(Default)]
//! struct Admin;
//!
//! impl View for Admin {
//!     fn capabilities(&self) -> Capabilities {
//!         Capabilities::NONE.on_enter()
//!     }
//!
//!     fn before_enter(&mut self, event: &mut BeforeEnterEvent) -> WayfinderResult<()> {
//!         event.forward_to("login");
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Login;
//! impl View for Login {}
//!
//! const ADMIN: ViewId = ViewId::new("Admin");
//! const LOGIN: ViewId = ViewId::new("Login");
//!
//! let registry = Arc::new(ApplicationRouteRegistry::new());
//! RouteTable::new()
//!     .route(Route::new("admin", ADMIN))
//!     .route(Route::new("login", LOGIN))
//!     .register(registry.as_ref())
//!     .unwrap();
//! let factory = ViewFactory::new()
//!     .with_default::<Admin>(ADMIN)
//!     .with_default::<Login>(LOGIN);
//! let router = Router::new(registry, Arc::new(factory));
//!
//! let mut ui = Ui::new();
//! router.navigate_to(&mut ui, "admin").unwrap();
//! assert_eq!(ui.location().unwrap().path(), "login");
//! assert_eq!(ui.active_chain(), vec![LOGIN]);
//! ```

pub mod configuration;
pub mod error_handler;
pub mod error_views;
pub mod event;
pub mod link;
pub mod listeners;
pub mod location;
pub mod matcher;
pub mod navigation;
pub mod parameters;
pub mod registry;
pub mod resolver;
pub mod router;
pub mod table;
pub mod target;
pub mod template;
pub mod ui;
pub mod view;

pub use http::StatusCode;
pub use wayfinder_core::{ErrorType, WayfinderError, WayfinderResult};

pub use configuration::RouteConfiguration;
pub use error_handler::{ErrorHandlers, ErrorParameter, ErrorTarget};
pub use error_views::{AccessDeniedView, ErrorPage, InternalServerErrorView, RouteNotFoundView};
pub use event::{
    AfterNavigationEvent, BeforeEnterEvent, BeforeEvent, BeforeLeaveEvent, Destination,
    NavigationTrigger, Redirect, RedirectKind,
};
pub use link::{highlight, HighlightCondition, RouterLink};
pub use listeners::ListenerId;
pub use location::{Location, QueryParameters};
pub use navigation::{ContinueNavigation, NavigationOutcome, NavigationResult};
pub use parameters::{ParameterArity, RouteParameters, UrlParameter, UrlParameterSpec, UrlParameterType};
pub use registry::{
    ApplicationRouteRegistry, RegistryScope, RouteRegistry, RoutesChangedEvent,
    SessionRouteRegistry,
};
pub use resolver::{DefaultRouteResolver, NavigationState, RouteResolver};
pub use router::Router;
pub use table::{ErrorView, Layout, Route, RouteTable};
pub use target::{RouteData, RouteTarget, ViewId};
pub use template::RouteTemplate;
pub use ui::{ActiveView, Ui};
pub use view::{Capabilities, Instantiator, View, ViewFactory};

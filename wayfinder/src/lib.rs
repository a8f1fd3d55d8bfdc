//! # wayfinder
//!
//! Navigation router for view-based UIs.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `wayfinder` to get everything, or on the individual
//! crates for finer-grained control.

/// Error taxonomy, settings, logging setup, and shared utilities.
pub use wayfinder_core as core;

/// Route templates, registries, the navigation lifecycle, and router links.
pub use wayfinder_router as router;

pub use tracing;
pub use tracing_subscriber;

pub use wayfinder_core::{ErrorType, Settings, WayfinderError, WayfinderResult};
pub use wayfinder_router::{
    ApplicationRouteRegistry, Location, NavigationOutcome, RouteRegistry, RouteTable, Router,
    RouterLink, SessionRouteRegistry, Ui, View, ViewFactory, ViewId,
};

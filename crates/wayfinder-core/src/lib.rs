//! # wayfinder-core
//!
//! Core types for the wayfinder navigation router: the error taxonomy,
//! settings and their loaders, logging setup, and shared utilities.
//! This crate knows nothing about routes; it is the foundation the router
//! crate builds on.
//!
//! ## Modules
//!
//! - [`error`] - Error types, error kinds, and result aliases
//! - [`settings`] - Router settings
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - Utility types (`MultiValueDict`)

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{ErrorType, WayfinderError, WayfinderResult};
pub use settings::Settings;

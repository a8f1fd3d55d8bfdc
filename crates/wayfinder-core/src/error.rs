//! Core error types for wayfinder.
//!
//! [`WayfinderError`] covers configuration errors raised at registration time,
//! resolution failures (nothing matched, bad parameters), lifecycle failures
//! raised while a navigation attempt runs, and fatal failures of error views.
//!
//! Every error also belongs to an [`ErrorType`], a node in a small static
//! hierarchy that error views are registered against. Applications can declare
//! their own kinds as constants hanging off the built-in ones.

use std::fmt;

use thiserror::Error;

/// A kind of navigation error, used to pick the view that renders it.
///
/// Kinds form a tree rooted at [`ErrorType::EXCEPTION`]. A handler registered
/// for a kind also handles every descendant that has no handler of its own.
///
/// # Examples
///
/// ```
/// use wayfinder_core::error::ErrorType;
///
/// const QUOTA_EXCEEDED: ErrorType =
///     ErrorType::new("QuotaExceeded", Some(&ErrorType::INTERNAL_SERVER_ERROR));
///
/// assert!(QUOTA_EXCEEDED.is_a(&ErrorType::EXCEPTION));
/// assert!(!QUOTA_EXCEEDED.is_a(&ErrorType::NOT_FOUND));
/// ```
#[derive(Clone, Copy)]
pub struct ErrorType {
    name: &'static str,
    parent: Option<&'static ErrorType>,
}

impl ErrorType {
    /// The root of the hierarchy.
    pub const EXCEPTION: Self = Self::new("Exception", None);
    /// No route matched the requested location.
    pub const NOT_FOUND: Self = Self::new("NotFound", Some(&Self::EXCEPTION));
    /// The user may not see the requested location.
    pub const ACCESS_DENIED: Self = Self::new("AccessDenied", Some(&Self::EXCEPTION));
    /// Anything that went wrong while running the navigation lifecycle.
    pub const INTERNAL_SERVER_ERROR: Self =
        Self::new("InternalServerError", Some(&Self::EXCEPTION));
    /// An observer failed during a navigation attempt.
    pub const NAVIGATION_FAILED: Self =
        Self::new("NavigationFailed", Some(&Self::INTERNAL_SERVER_ERROR));
    /// A redirect chain revisited a location or ran too long.
    pub const REDIRECT_LOOP: Self = Self::new("RedirectLoop", Some(&Self::INTERNAL_SERVER_ERROR));
    /// A handler asked for both a forward and a reroute.
    pub const CONFLICTING_REDIRECT: Self =
        Self::new("ConflictingRedirect", Some(&Self::INTERNAL_SERVER_ERROR));
    /// An error view returned a status outside the accepted set.
    pub const INVALID_STATUS_CODE: Self =
        Self::new("InvalidStatusCode", Some(&Self::INTERNAL_SERVER_ERROR));

    /// Declares a new error kind below `parent`.
    pub const fn new(name: &'static str, parent: Option<&'static Self>) -> Self {
        Self { name, parent }
    }

    /// Returns the name of this kind. Names identify kinds.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the parent kind, or `None` for the root.
    pub const fn parent(&self) -> Option<&'static Self> {
        self.parent
    }

    /// Returns `true` if this kind equals `other` or descends from it.
    pub fn is_a(&self, other: &Self) -> bool {
        self.ancestry().any(|kind| kind == *other)
    }

    /// Iterates from this kind up to the root, most specific first.
    pub fn ancestry(&self) -> impl Iterator<Item = Self> {
        let mut next = Some(*self);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.parent.copied();
            Some(current)
        })
    }
}

impl PartialEq for ErrorType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ErrorType {}

impl std::hash::Hash for ErrorType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorType({})", self.name)
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The primary error type for wayfinder.
///
/// Each variant maps to an [`ErrorType`] via [`WayfinderError::error_type`]
/// and to a navigation status code via [`WayfinderError::status_code`].
#[derive(Error, Debug)]
pub enum WayfinderError {
    // ── Configuration ────────────────────────────────────────────────

    /// Routes, layouts, or error handlers were declared inconsistently.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// Two registrations cannot be told apart by any location.
    #[error("Ambiguous route: {0}")]
    AmbiguousRoute(String),

    /// A route template could not be parsed.
    #[error("Invalid route template '{template}': {reason}")]
    InvalidTemplate {
        /// The template text as given.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A settings source could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Locations and parameters ─────────────────────────────────────

    /// A path could not be turned into a location.
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// Route parameters were malformed, missing, or unusable.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // ── Resolution ───────────────────────────────────────────────────

    /// Generic not-found condition.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No registered route matches `path`.
    #[error("No route found for '{path}'")]
    RouteNotFound {
        /// The path that failed to resolve.
        path: String,
        /// One line per near-miss template explaining why it did not match.
        diagnostics: Vec<String>,
    },

    /// The current user may not navigate to the location.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Generic internal failure.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    /// An observer failed while navigating to `location`.
    #[error("Navigation to '{location}' failed: {message}")]
    NavigationFailed {
        /// The location being navigated to.
        location: String,
        /// The message of the causing error.
        message: String,
        /// The causing error.
        #[source]
        source: Box<WayfinderError>,
    },

    /// A redirect chain revisited a location or exceeded the hop limit.
    #[error("Redirect loop detected: {0}")]
    RedirectLoop(String),

    /// A single handler asked for both a forward and a reroute.
    #[error("Conflicting redirect: {0}")]
    ConflictingRedirect(String),

    /// An error view returned a status outside the accepted set.
    #[error("Error view '{view}' returned invalid status code {status}")]
    InvalidStatusCode {
        /// The error view that produced the status.
        view: String,
        /// The rejected status.
        status: u16,
    },

    // ── Fatal ────────────────────────────────────────────────────────

    /// An error view failed while rendering an error. Never recovered.
    #[error("Error handler failed: {message}")]
    ErrorHandlerFailed {
        /// What went wrong in the handler.
        message: String,
        /// The error the handler was rendering, or its own failure.
        #[source]
        source: Option<Box<WayfinderError>>,
    },

    // ── Application ──────────────────────────────────────────────────

    /// An application-defined error kind.
    #[error("{kind}: {message}")]
    Custom {
        /// The kind used to select an error view.
        kind: ErrorType,
        /// Human readable message.
        message: String,
    },

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl WayfinderError {
    /// Returns the kind used to select an error view for this error.
    pub const fn error_type(&self) -> ErrorType {
        match self {
            Self::NotFound(_) | Self::RouteNotFound { .. } => ErrorType::NOT_FOUND,
            Self::AccessDenied(_) => ErrorType::ACCESS_DENIED,
            Self::NavigationFailed { .. } => ErrorType::NAVIGATION_FAILED,
            Self::RedirectLoop(_) => ErrorType::REDIRECT_LOOP,
            Self::ConflictingRedirect(_) => ErrorType::CONFLICTING_REDIRECT,
            Self::InvalidStatusCode { .. } => ErrorType::INVALID_STATUS_CODE,
            Self::Custom { kind, .. } => *kind,
            Self::ImproperlyConfigured(_)
            | Self::AmbiguousRoute(_)
            | Self::InvalidTemplate { .. }
            | Self::ConfigurationError(_)
            | Self::InvalidLocation(_)
            | Self::InvalidParameter(_)
            | Self::InternalServerError(_)
            | Self::ErrorHandlerFailed { .. }
            | Self::IoError(_) => ErrorType::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the navigation status code associated with this error.
    ///
    /// - `NotFound` kinds -> 404
    /// - `AccessDenied` kinds -> 401
    /// - Everything else -> 500
    pub fn status_code(&self) -> u16 {
        let kind = self.error_type();
        if kind.is_a(&ErrorType::NOT_FOUND) {
            404
        } else if kind.is_a(&ErrorType::ACCESS_DENIED) {
            401
        } else {
            500
        }
    }

    /// Returns the wrapped error for variants that carry one.
    pub fn cause(&self) -> Option<&Self> {
        match self {
            Self::NavigationFailed { source, .. } => Some(source),
            Self::ErrorHandlerFailed { source, .. } => source.as_deref(),
            _ => None,
        }
    }

    /// Iterates over this error and every wrapped cause, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &Self> {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.cause();
            Some(current)
        })
    }

    /// Returns `true` for failures that must not be routed to an error view.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ErrorHandlerFailed { .. })
    }
}

/// A convenience type alias for `Result<T, WayfinderError>`.
pub type WayfinderResult<T> = Result<T, WayfinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTA: ErrorType = ErrorType::new("Quota", Some(&ErrorType::INTERNAL_SERVER_ERROR));

    #[test]
    fn test_error_type_ancestry_most_specific_first() {
        let names: Vec<_> = ErrorType::REDIRECT_LOOP.ancestry().map(|k| k.name()).collect();
        assert_eq!(names, vec!["RedirectLoop", "InternalServerError", "Exception"]);
    }

    #[test]
    fn test_error_type_is_a() {
        assert!(ErrorType::NOT_FOUND.is_a(&ErrorType::EXCEPTION));
        assert!(ErrorType::NOT_FOUND.is_a(&ErrorType::NOT_FOUND));
        assert!(!ErrorType::EXCEPTION.is_a(&ErrorType::NOT_FOUND));
        assert!(QUOTA.is_a(&ErrorType::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_error_type_equality_by_name() {
        let again = ErrorType::new("NotFound", Some(&ErrorType::EXCEPTION));
        assert_eq!(again, ErrorType::NOT_FOUND);
        assert_ne!(ErrorType::NOT_FOUND, ErrorType::ACCESS_DENIED);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(WayfinderError::NotFound("x".into()).status_code(), 404);
        assert_eq!(
            WayfinderError::RouteNotFound {
                path: "x".into(),
                diagnostics: Vec::new()
            }
            .status_code(),
            404
        );
        assert_eq!(WayfinderError::AccessDenied("x".into()).status_code(), 401);
        assert_eq!(WayfinderError::RedirectLoop("x".into()).status_code(), 500);
        assert_eq!(WayfinderError::ConflictingRedirect("x".into()).status_code(), 500);
        assert_eq!(WayfinderError::ImproperlyConfigured("x".into()).status_code(), 500);
        assert_eq!(
            WayfinderError::Custom {
                kind: ErrorType::NOT_FOUND,
                message: "gone".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            WayfinderError::Custom {
                kind: QUOTA,
                message: "full".into()
            }
            .status_code(),
            500
        );
    }

    #[test]
    fn test_error_chain_outermost_first() {
        let err = WayfinderError::NavigationFailed {
            location: "users".into(),
            message: "denied".into(),
            source: Box::new(WayfinderError::AccessDenied("denied".into())),
        };
        let kinds: Vec<_> = err.chain().map(WayfinderError::error_type).collect();
        assert_eq!(kinds, vec![ErrorType::NAVIGATION_FAILED, ErrorType::ACCESS_DENIED]);
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_display() {
        let err = WayfinderError::InvalidTemplate {
            template: "a/:*".into(),
            reason: "missing parameter name".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid route template 'a/:*': missing parameter name"
        );
        let custom = WayfinderError::Custom {
            kind: QUOTA,
            message: "full".into(),
        };
        assert_eq!(custom.to_string(), "Quota: full");
    }

    #[test]
    fn test_fatal_only_for_handler_failures() {
        assert!(WayfinderError::ErrorHandlerFailed {
            message: "boom".into(),
            source: None
        }
        .is_fatal());
        assert!(!WayfinderError::InternalServerError("x".into()).is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: WayfinderError = io_err.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("file missing"));
    }
}

//! Error handler registration and lookup.
//!
//! An error view is registered for one [`ErrorType`]. Looking up the view for
//! an error tries, in order:
//!
//! 1. the exact kind of the error and of each wrapped cause, outermost first;
//! 2. the ancestors of the outermost error's kind, most specific first.
//!
//! Built-in handlers are marked as defaults. A custom handler replaces a
//! default one for the same kind; two custom handlers for one kind are a
//! configuration error.

use wayfinder_core::{ErrorType, WayfinderError, WayfinderResult};

use crate::location::Location;
use crate::target::ViewId;

/// An error view registered for one error kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorTarget {
    kind: ErrorType,
    view: ViewId,
    parents: Vec<ViewId>,
    is_default: bool,
}

impl ErrorTarget {
    /// A custom handler for `kind`.
    pub const fn new(kind: ErrorType, view: ViewId) -> Self {
        Self {
            kind,
            view,
            parents: Vec::new(),
            is_default: false,
        }
    }

    /// A built-in handler that any custom handler replaces.
    pub const fn fallback(kind: ErrorType, view: ViewId) -> Self {
        Self {
            kind,
            view,
            parents: Vec::new(),
            is_default: true,
        }
    }

    /// Renders the error view inside `parents`, innermost first.
    #[must_use]
    pub fn with_parents(mut self, parents: Vec<ViewId>) -> Self {
        self.parents = parents;
        self
    }

    pub const fn kind(&self) -> ErrorType {
        self.kind
    }

    pub const fn view(&self) -> ViewId {
        self.view
    }

    /// Layouts, innermost first.
    pub fn parents(&self) -> &[ViewId] {
        &self.parents
    }

    pub const fn is_default(&self) -> bool {
        self.is_default
    }

    /// The chain to render, outermost layout first and the error view last.
    pub fn chain(&self) -> Vec<ViewId> {
        self.parents
            .iter()
            .rev()
            .copied()
            .chain(std::iter::once(self.view))
            .collect()
    }
}

/// The error handlers of one configuration, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorHandlers {
    targets: Vec<ErrorTarget>,
}

impl ErrorHandlers {
    /// No handlers.
    pub const fn new() -> Self {
        Self {
            targets: Vec::new(),
        }
    }

    /// The built-in handlers for not-found, access-denied and every other error.
    pub fn with_defaults() -> Self {
        use crate::error_views::{AccessDeniedView, InternalServerErrorView, RouteNotFoundView};

        let mut handlers = Self::new();
        for target in [
            ErrorTarget::fallback(ErrorType::NOT_FOUND, RouteNotFoundView::ID),
            ErrorTarget::fallback(ErrorType::ACCESS_DENIED, AccessDeniedView::ID),
            ErrorTarget::fallback(ErrorType::EXCEPTION, InternalServerErrorView::ID),
        ] {
            handlers.targets.push(target);
        }
        handlers
    }

    /// Registers `target`.
    ///
    /// Re-registering the same view for a kind is a no-op.
    pub fn register(&mut self, target: ErrorTarget) -> WayfinderResult<()> {
        let Some(existing) = self.targets.iter_mut().find(|t| t.kind == target.kind) else {
            self.targets.push(target);
            return Ok(());
        };
        if existing.is_default && !target.is_default {
            *existing = target;
            return Ok(());
        }
        if target.is_default || existing.view == target.view {
            return Ok(());
        }
        Err(WayfinderError::ImproperlyConfigured(format!(
            "only one error view may handle '{}'; found '{}' and '{}'",
            target.kind, existing.view, target.view
        )))
    }

    /// Removes the handler for `kind`. Returns the removed target.
    pub fn remove(&mut self, kind: ErrorType) -> Option<ErrorTarget> {
        let index = self.targets.iter().position(|t| t.kind == kind)?;
        Some(self.targets.remove(index))
    }

    /// Removes every handler rendered by `view`.
    pub fn remove_view(&mut self, view: ViewId) -> usize {
        let before = self.targets.len();
        self.targets.retain(|t| t.view != view);
        before - self.targets.len()
    }

    /// The handler registered for exactly `kind`.
    pub fn get(&self, kind: ErrorType) -> Option<&ErrorTarget> {
        self.targets.iter().find(|t| t.kind == kind)
    }

    /// The handler for `error`: exact kinds along the cause chain first,
    /// then the ancestors of the outermost kind.
    pub fn lookup(&self, error: &WayfinderError) -> Option<&ErrorTarget> {
        error
            .chain()
            .find_map(|e| self.get(e.error_type()))
            .or_else(|| {
                error
                    .error_type()
                    .ancestry()
                    .skip(1)
                    .find_map(|kind| self.get(kind))
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// What an error view is asked to render.
#[derive(Debug)]
pub struct ErrorParameter {
    kind: ErrorType,
    error: WayfinderError,
    location: Location,
    verbose: bool,
}

impl ErrorParameter {
    pub(crate) const fn new(
        kind: ErrorType,
        error: WayfinderError,
        location: Location,
        verbose: bool,
    ) -> Self {
        Self {
            kind,
            error,
            location,
            verbose,
        }
    }

    /// The kind the chosen handler is registered for.
    pub const fn handled_kind(&self) -> ErrorType {
        self.kind
    }

    /// The error being rendered.
    pub const fn error(&self) -> &WayfinderError {
        &self.error
    }

    /// The location whose navigation failed.
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// Whether details may be shown to the user.
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// The custom message for application errors, the error text otherwise.
    pub fn message(&self) -> String {
        match &self.error {
            WayfinderError::Custom { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Near-miss explanations, when the error is a failed route lookup.
    pub fn diagnostics(&self) -> &[String] {
        self.error
            .chain()
            .find_map(|e| match e {
                WayfinderError::RouteNotFound { diagnostics, .. } => Some(diagnostics.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Messages of the error and each wrapped cause, outermost first.
    pub fn causes(&self) -> Vec<String> {
        self.error.chain().map(ToString::to_string).collect()
    }
}

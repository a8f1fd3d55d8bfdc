//! Navigation events handed to views and UI listeners.
//!
//! [`BeforeLeaveEvent`] and [`BeforeEnterEvent`] both dereference to
//! [`BeforeEvent`], which carries the redirect requests a handler can make.
//! [`AfterNavigationEvent`] is read-only and fires once per completed
//! navigation.

use std::fmt;
use std::ops::{Deref, DerefMut};

use wayfinder_core::{ErrorType, WayfinderError, WayfinderResult};

use crate::location::Location;
use crate::navigation::ContinueNavigation;
use crate::parameters::RouteParameters;
use crate::target::ViewId;

/// What started a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationTrigger {
    /// The initial page load.
    PageLoad,
    /// A click on a [`RouterLink`](crate::link::RouterLink).
    RouterLink,
    /// Browser back or forward.
    History,
    /// Application code called the router.
    Programmatic,
}

impl NavigationTrigger {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PageLoad => "page_load",
            Self::RouterLink => "router_link",
            Self::History => "history",
            Self::Programmatic => "programmatic",
        }
    }
}

impl fmt::Display for NavigationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a forward or reroute should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A parsed location.
    Location(Location),
    /// A path, parsed when the redirect is followed.
    Path(String),
    /// A view, with the URL built from its canonical template.
    View {
        view: ViewId,
        parameters: RouteParameters,
    },
}

impl Destination {
    /// A view destination with parameters.
    pub const fn view(view: ViewId, parameters: RouteParameters) -> Self {
        Self::View { view, parameters }
    }
}

impl From<Location> for Destination {
    fn from(location: Location) -> Self {
        Self::Location(location)
    }
}

impl From<&str> for Destination {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Destination {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<ViewId> for Destination {
    fn from(view: ViewId) -> Self {
        Self::View {
            view,
            parameters: RouteParameters::empty(),
        }
    }
}

/// Whether a redirect changes the visible location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Resolve the destination and show its location.
    Forward,
    /// Resolve the destination but keep the original location visible.
    Reroute,
}

/// A redirect requested by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub kind: RedirectKind,
    pub destination: Destination,
}

#[derive(Debug, Clone)]
struct ErrorRedirect {
    kind: ErrorType,
    message: String,
}

/// State shared by the before-leave and before-enter events.
#[derive(Debug)]
pub struct BeforeEvent {
    location: Location,
    trigger: NavigationTrigger,
    redirect: Option<Redirect>,
    error: Option<ErrorRedirect>,
    conflict: bool,
}

impl BeforeEvent {
    pub(crate) const fn new(location: Location, trigger: NavigationTrigger) -> Self {
        Self {
            location,
            trigger,
            redirect: None,
            error: None,
            conflict: false,
        }
    }

    /// The location being navigated to.
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// What started the navigation.
    pub const fn trigger(&self) -> NavigationTrigger {
        self.trigger
    }

    /// Navigates to `destination` instead, updating the visible location.
    pub fn forward_to(&mut self, destination: impl Into<Destination>) {
        self.request(RedirectKind::Forward, destination.into());
    }

    /// Shows `destination` instead, keeping the visible location.
    pub fn reroute_to(&mut self, destination: impl Into<Destination>) {
        self.request(RedirectKind::Reroute, destination.into());
    }

    /// Shows the error view registered for `kind`.
    pub fn reroute_to_error(&mut self, kind: ErrorType, message: impl Into<String>) {
        if self.redirect.as_ref().is_some_and(|r| r.kind == RedirectKind::Forward) {
            self.conflict = true;
        }
        self.error = Some(ErrorRedirect {
            kind,
            message: message.into(),
        });
    }

    /// The pending redirect, if any.
    pub const fn redirect(&self) -> Option<&Redirect> {
        self.redirect.as_ref()
    }

    /// Returns `true` if a forward was requested.
    pub fn has_forward(&self) -> bool {
        self.redirect.as_ref().is_some_and(|r| r.kind == RedirectKind::Forward)
    }

    /// Returns `true` if a reroute, including one to an error view, was requested.
    pub fn has_reroute(&self) -> bool {
        self.error.is_some() || self.redirect.as_ref().is_some_and(|r| r.kind == RedirectKind::Reroute)
    }

    /// Returns `true` if an error view was requested.
    pub const fn has_error_redirect(&self) -> bool {
        self.error.is_some()
    }

    fn request(&mut self, kind: RedirectKind, destination: Destination) {
        let other_kind = match kind {
            RedirectKind::Forward => self.has_reroute(),
            RedirectKind::Reroute => self.has_forward(),
        };
        if other_kind {
            self.conflict = true;
        }
        self.redirect = Some(Redirect { kind, destination });
    }

    /// Takes what the last handler requested.
    ///
    /// A forward combined with a reroute is a [`WayfinderError::ConflictingRedirect`];
    /// an error redirect becomes the error to render.
    pub(crate) fn take_redirect(&mut self) -> WayfinderResult<Option<Redirect>> {
        let redirect = self.redirect.take();
        let error = self.error.take();
        if std::mem::take(&mut self.conflict) {
            return Err(WayfinderError::ConflictingRedirect(format!(
                "a handler requested both a forward and a reroute while navigating to '{}'",
                self.location
            )));
        }
        if let Some(error) = error {
            return Err(WayfinderError::Custom {
                kind: error.kind,
                message: error.message,
            });
        }
        Ok(redirect)
    }

    pub(crate) const fn has_pending(&self) -> bool {
        self.redirect.is_some() || self.error.is_some() || self.conflict
    }
}

/// Sent to UI listeners and active views when a navigation away starts.
#[derive(Debug)]
pub struct BeforeLeaveEvent {
    base: BeforeEvent,
    continuation: ContinueNavigation,
    postponed: bool,
}

impl BeforeLeaveEvent {
    pub(crate) const fn new(base: BeforeEvent, continuation: ContinueNavigation) -> Self {
        Self {
            base,
            continuation,
            postponed: false,
        }
    }

    /// Suspends the navigation. The returned handle resumes or cancels it.
    ///
    /// Observers after the current one run only when the navigation is
    /// resumed.
    pub fn postpone(&mut self) -> ContinueNavigation {
        self.postponed = true;
        self.continuation.clone()
    }

    /// Returns `true` if a handler postponed the navigation.
    pub const fn is_postponed(&self) -> bool {
        self.postponed
    }
}

impl Deref for BeforeLeaveEvent {
    type Target = BeforeEvent;

    fn deref(&self) -> &BeforeEvent {
        &self.base
    }
}

impl DerefMut for BeforeLeaveEvent {
    fn deref_mut(&mut self) -> &mut BeforeEvent {
        &mut self.base
    }
}

/// Sent to UI listeners and the new chain before it becomes active.
#[derive(Debug)]
pub struct BeforeEnterEvent {
    base: BeforeEvent,
    target: ViewId,
    layouts: Vec<ViewId>,
    parameters: RouteParameters,
}

impl BeforeEnterEvent {
    pub(crate) const fn new(
        base: BeforeEvent,
        target: ViewId,
        layouts: Vec<ViewId>,
        parameters: RouteParameters,
    ) -> Self {
        Self {
            base,
            target,
            layouts,
            parameters,
        }
    }

    /// The view being navigated to.
    pub const fn target(&self) -> ViewId {
        self.target
    }

    /// Layouts around the target, outermost first.
    pub fn layouts(&self) -> &[ViewId] {
        &self.layouts
    }

    /// Parameters extracted from the location.
    pub const fn route_parameters(&self) -> &RouteParameters {
        &self.parameters
    }
}

impl Deref for BeforeEnterEvent {
    type Target = BeforeEvent;

    fn deref(&self) -> &BeforeEvent {
        &self.base
    }
}

impl DerefMut for BeforeEnterEvent {
    fn deref_mut(&mut self) -> &mut BeforeEvent {
        &mut self.base
    }
}

/// Sent once a navigation completed.
#[derive(Debug, Clone)]
pub struct AfterNavigationEvent {
    location: Location,
    trigger: NavigationTrigger,
    active_chain: Vec<ViewId>,
    parameters: RouteParameters,
}

impl AfterNavigationEvent {
    pub(crate) const fn new(
        location: Location,
        trigger: NavigationTrigger,
        active_chain: Vec<ViewId>,
        parameters: RouteParameters,
    ) -> Self {
        Self {
            location,
            trigger,
            active_chain,
            parameters,
        }
    }

    /// The visible location after navigating.
    pub const fn location(&self) -> &Location {
        &self.location
    }

    pub const fn trigger(&self) -> NavigationTrigger {
        self.trigger
    }

    /// The active chain, outermost layout first and the shown view last.
    pub fn active_chain(&self) -> &[ViewId] {
        &self.active_chain
    }

    /// The shown view.
    pub fn target(&self) -> Option<ViewId> {
        self.active_chain.last().copied()
    }

    pub const fn route_parameters(&self) -> &RouteParameters {
        &self.parameters
    }
}

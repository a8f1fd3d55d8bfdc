//! Views, their capabilities, and how the router obtains instances.
//!
//! A view declares which lifecycle hooks it wants through [`Capabilities`];
//! the router only calls hooks that are declared. Instances come from an
//! [`Instantiator`], usually a [`ViewFactory`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use wayfinder_core::{WayfinderError, WayfinderResult};

use crate::error_handler::ErrorParameter;
use crate::error_views::{AccessDeniedView, InternalServerErrorView, RouteNotFoundView};
use crate::event::{AfterNavigationEvent, BeforeEnterEvent, BeforeLeaveEvent};
use crate::parameters::UrlParameter;
use crate::target::ViewId;

/// The set of lifecycle hooks a view takes part in.
///
/// # Examples
///
/// ```
/// use wayfinder_router::Capabilities;
///
/// let caps = Capabilities::NONE.on_enter().after_navigation();
/// assert!(caps.handles_enter());
/// assert!(!caps.handles_leave());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    leave: bool,
    enter: bool,
    after_navigation: bool,
    parameter: bool,
    error: bool,
}

impl Capabilities {
    /// No hooks.
    pub const NONE: Self = Self {
        leave: false,
        enter: false,
        after_navigation: false,
        parameter: false,
        error: false,
    };

    /// Adds [`View::before_leave`].
    #[must_use]
    pub const fn on_leave(mut self) -> Self {
        self.leave = true;
        self
    }

    /// Adds [`View::before_enter`].
    #[must_use]
    pub const fn on_enter(mut self) -> Self {
        self.enter = true;
        self
    }

    /// Adds [`View::after_navigation`].
    #[must_use]
    pub const fn after_navigation(mut self) -> Self {
        self.after_navigation = true;
        self
    }

    /// Adds [`View::set_parameter`].
    #[must_use]
    pub const fn accepts_parameter(mut self) -> Self {
        self.parameter = true;
        self
    }

    /// Adds [`View::set_error_parameter`].
    #[must_use]
    pub const fn handles_error(mut self) -> Self {
        self.error = true;
        self
    }

    pub const fn handles_leave(self) -> bool {
        self.leave
    }

    pub const fn handles_enter(self) -> bool {
        self.enter
    }

    pub const fn handles_after_navigation(self) -> bool {
        self.after_navigation
    }

    pub const fn handles_parameter(self) -> bool {
        self.parameter
    }

    pub const fn handles_error_parameter(self) -> bool {
        self.error
    }
}

/// Lets the router hand out `&dyn Any` for any view.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A routable view, layout, or error view.
///
/// Every hook has a no-op default. Hooks only run when the matching
/// capability is declared by [`View::capabilities`].
pub trait View: AsAny + Send {
    /// Hooks this view takes part in.
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    /// Called while this view is active and a navigation away starts.
    fn before_leave(&mut self, _event: &mut BeforeLeaveEvent) -> WayfinderResult<()> {
        Ok(())
    }

    /// Receives the typed URL parameter, right before this view's
    /// [`before_enter`](View::before_enter).
    fn set_parameter(
        &mut self,
        _event: &mut BeforeEnterEvent,
        _parameter: Option<UrlParameter>,
    ) -> WayfinderResult<()> {
        Ok(())
    }

    /// Called before this view becomes part of the active chain.
    fn before_enter(&mut self, _event: &mut BeforeEnterEvent) -> WayfinderResult<()> {
        Ok(())
    }

    /// Called once the navigation completed with this view in the chain.
    fn after_navigation(&mut self, _event: &AfterNavigationEvent) {}

    /// Receives the error this view should render. Returns the status code.
    fn set_error_parameter(
        &mut self,
        _event: &BeforeEnterEvent,
        _parameter: &ErrorParameter,
    ) -> WayfinderResult<u16> {
        Ok(500)
    }

    /// Called when this instance leaves the active chain for good.
    fn detach(&mut self) {}
}

/// Borrows a view as its concrete type.
pub fn downcast_view<T: View + 'static>(view: &dyn View) -> Option<&T> {
    <dyn View as AsAny>::as_any(view).downcast_ref::<T>()
}

/// Mutably borrows a view as its concrete type.
pub fn downcast_view_mut<T: View + 'static>(view: &mut dyn View) -> Option<&mut T> {
    <dyn View as AsAny>::as_any_mut(view).downcast_mut::<T>()
}

/// Creates view instances on demand.
pub trait Instantiator: Send + Sync {
    /// Creates a new instance of `view`.
    fn create(&self, view: ViewId) -> WayfinderResult<Box<dyn View>>;
}

/// Constructor stored in a [`ViewFactory`].
pub type ViewConstructor = Arc<dyn Fn() -> Box<dyn View> + Send + Sync>;

/// An [`Instantiator`] backed by registered constructors.
///
/// [`ViewFactory::new`] already knows the built-in error views.
#[derive(Clone)]
pub struct ViewFactory {
    constructors: HashMap<ViewId, ViewConstructor>,
}

impl fmt::Debug for ViewFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut views: Vec<_> = self.constructors.keys().collect();
        views.sort();
        f.debug_struct("ViewFactory").field("views", &views).finish()
    }
}

impl Default for ViewFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewFactory {
    /// A factory that can build the built-in error views.
    pub fn new() -> Self {
        Self::empty()
            .with_default::<RouteNotFoundView>(RouteNotFoundView::ID)
            .with_default::<AccessDeniedView>(AccessDeniedView::ID)
            .with_default::<InternalServerErrorView>(InternalServerErrorView::ID)
    }

    /// A factory with no constructors at all.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registers a constructor for `view`, replacing any previous one.
    pub fn register(&mut self, view: ViewId, constructor: ViewConstructor) {
        self.constructors.insert(view, constructor);
    }

    /// Registers `constructor` and returns the factory.
    #[must_use]
    pub fn with<F>(mut self, view: ViewId, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn View> + Send + Sync + 'static,
    {
        self.register(view, Arc::new(constructor));
        self
    }

    /// Registers `V::default` as the constructor for `view`.
    #[must_use]
    pub fn with_default<V: View + Default + 'static>(self, view: ViewId) -> Self {
        self.with(view, || Box::new(V::default()))
    }

    /// Returns `true` if `view` can be built.
    pub fn contains(&self, view: ViewId) -> bool {
        self.constructors.contains_key(&view)
    }
}

impl Instantiator for ViewFactory {
    fn create(&self, view: ViewId) -> WayfinderResult<Box<dyn View>> {
        let constructor = self.constructors.get(&view).ok_or_else(|| {
            WayfinderError::ImproperlyConfigured(format!("no constructor registered for view '{view}'"))
        })?;
        Ok(constructor())
    }
}

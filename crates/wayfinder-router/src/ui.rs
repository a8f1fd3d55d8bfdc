//! The navigable UI: active view chain, visible location and listeners.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use wayfinder_core::WayfinderResult;

use crate::event::{AfterNavigationEvent, BeforeEnterEvent, BeforeLeaveEvent, NavigationTrigger};
use crate::listeners::{ListenerId, ListenerList};
use crate::location::Location;
use crate::parameters::RouteParameters;
use crate::target::ViewId;
use crate::view::{downcast_view, downcast_view_mut, View};

/// UI-level before-leave callback. Runs before any view's `before_leave`.
pub type BeforeLeaveListener = dyn Fn(&mut BeforeLeaveEvent) -> WayfinderResult<()> + Send + Sync;

/// UI-level before-enter callback. Runs before any view's `before_enter`.
pub type BeforeEnterListener = dyn Fn(&mut BeforeEnterEvent) -> WayfinderResult<()> + Send + Sync;

/// UI-level after-navigation callback. Runs after the views.
pub type AfterNavigationListener = dyn Fn(&AfterNavigationEvent) + Send + Sync;

static NEXT_UI_ID: AtomicU64 = AtomicU64::new(1);

/// One instance in the active chain.
pub struct ActiveView {
    pub(crate) id: ViewId,
    pub(crate) view: Box<dyn View>,
}

impl ActiveView {
    pub const fn id(&self) -> ViewId {
        self.id
    }

    pub fn view(&self) -> &dyn View {
        self.view.as_ref()
    }
}

impl fmt::Debug for ActiveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActiveView").field(&self.id).finish()
    }
}

/// A navigable UI.
///
/// Navigations take `&mut Ui`, so two attempts on one UI never interleave.
pub struct Ui {
    pub(crate) id: u64,
    pub(crate) generation: u64,
    pub(crate) chain: Vec<ActiveView>,
    pub(crate) location: Option<Location>,
    pub(crate) parameters: RouteParameters,
    pub(crate) history: Vec<Location>,
    pub(crate) before_leave: ListenerList<BeforeLeaveListener>,
    pub(crate) before_enter: ListenerList<BeforeEnterListener>,
    pub(crate) after_navigation: ListenerList<AfterNavigationListener>,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ui")
            .field("id", &self.id)
            .field("location", &self.location)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl Ui {
    /// A UI that has not navigated yet.
    pub fn new() -> Self {
        Self {
            id: NEXT_UI_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            chain: Vec::new(),
            location: None,
            parameters: RouteParameters::empty(),
            history: Vec::new(),
            before_leave: ListenerList::new(),
            before_enter: ListenerList::new(),
            after_navigation: ListenerList::new(),
        }
    }

    /// The visible location of the last completed navigation.
    pub const fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Route parameters of the last completed navigation.
    pub const fn route_parameters(&self) -> &RouteParameters {
        &self.parameters
    }

    /// View ids of the active chain, outermost layout first.
    pub fn active_chain(&self) -> Vec<ViewId> {
        self.chain.iter().map(|active| active.id).collect()
    }

    /// The active chain, outermost layout first.
    pub fn active_views(&self) -> &[ActiveView] {
        &self.chain
    }

    /// The shown view, innermost in the chain.
    pub fn current_view(&self) -> Option<&dyn View> {
        self.chain.last().map(ActiveView::view)
    }

    /// The first active instance of `T`, searching outermost first.
    pub fn find_view<T: View + 'static>(&self) -> Option<&T> {
        self.chain
            .iter()
            .find_map(|active| downcast_view::<T>(active.view.as_ref()))
    }

    /// Mutable access to the first active instance of `T`.
    pub fn find_view_mut<T: View + 'static>(&mut self) -> Option<&mut T> {
        self.chain
            .iter_mut()
            .find_map(|active| downcast_view_mut::<T>(active.view.as_mut()))
    }

    /// Visible locations of completed navigations, oldest first.
    ///
    /// Back/forward navigations do not add entries, and navigating to the
    /// location already on top does not repeat it.
    pub fn history(&self) -> &[Location] {
        &self.history
    }

    pub(crate) fn record_history(&mut self, location: &Location, trigger: NavigationTrigger) {
        if trigger == NavigationTrigger::History {
            return;
        }
        if self.history.last() != Some(location) {
            self.history.push(location.clone());
        }
    }

    pub(crate) fn begin_attempt(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn add_before_leave_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&mut BeforeLeaveEvent) -> WayfinderResult<()> + Send + Sync + 'static,
    {
        self.before_leave.add(Arc::new(listener))
    }

    pub fn add_before_enter_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&mut BeforeEnterEvent) -> WayfinderResult<()> + Send + Sync + 'static,
    {
        self.before_enter.add(Arc::new(listener))
    }

    pub fn add_after_navigation_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AfterNavigationEvent) + Send + Sync + 'static,
    {
        self.after_navigation.add(Arc::new(listener))
    }

    /// Removes a listener of any kind. Returns `true` if one was removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let leave = self.before_leave.remove(id);
        let enter = self.before_enter.remove(id);
        let after = self.after_navigation.remove(id);
        leave || enter || after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Page {
        visits: u32,
    }

    impl View for Page {}

    #[test]
    fn test_new_ui_is_idle() {
        let ui = Ui::new();
        assert!(ui.location().is_none());
        assert!(ui.active_chain().is_empty());
        assert!(ui.current_view().is_none());
        assert!(ui.history().is_empty());
        assert_ne!(ui.id, Ui::new().id);
    }

    #[test]
    fn test_find_view() {
        let mut ui = Ui::new();
        ui.chain.push(ActiveView {
            id: ViewId::new("Page"),
            view: Box::new(Page::default()),
        });
        ui.find_view_mut::<Page>().unwrap().visits = 3;
        assert_eq!(ui.find_view::<Page>().unwrap().visits, 3);
    }

    #[test]
    fn test_history_skips_repeats_and_back_navigation() {
        let mut ui = Ui::new();
        let a = Location::parse("a").unwrap();
        let b = Location::parse("b").unwrap();
        ui.record_history(&a, NavigationTrigger::Programmatic);
        ui.record_history(&a, NavigationTrigger::RouterLink);
        ui.record_history(&b, NavigationTrigger::History);
        assert_eq!(ui.history(), &[a]);
    }

    #[test]
    fn test_remove_listener_of_any_kind() {
        let ui = Ui::new();
        let id = ui.add_after_navigation_listener(|_| {});
        let other = ui.add_before_leave_listener(|_| Ok(()));
        assert!(ui.remove_listener(id));
        assert!(!ui.remove_listener(id));
        assert!(ui.remove_listener(other));
        assert!(ui.after_navigation.is_empty());
    }

    #[test]
    fn test_generation_advances() {
        let mut ui = Ui::new();
        assert_eq!(ui.begin_attempt(), 1);
        assert_eq!(ui.begin_attempt(), 2);
    }
}

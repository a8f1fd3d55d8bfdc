//! The navigation lifecycle.
//!
//! One attempt runs through these phases:
//!
//! 1. **Leave**: UI before-leave listeners, then the active chain innermost
//!    first. A handler may postpone, which stops the attempt and hands out a
//!    [`ContinueNavigation`].
//! 2. **Resolve** the location. Nothing found is a not-found error.
//! 3. **Enter**: UI before-enter listeners, then the new chain outermost
//!    first. The target receives its URL parameter right before its own
//!    `before_enter`. Forwards and reroutes go back to step 2.
//! 4. **Commit** the chain, reusing instances whose position and view are
//!    unchanged and detaching the rest.
//! 5. **After navigation**: the new chain outermost first, then UI listeners.
//!
//! Errors on the way are shown by the matching error view. Only a failing
//! error view ends the attempt with `Err`.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use http::StatusCode;
use wayfinder_core::logging::navigation_span;
use wayfinder_core::{ErrorType, WayfinderError, WayfinderResult};

use crate::error_handler::ErrorParameter;
use crate::event::{
    AfterNavigationEvent, BeforeEnterEvent, BeforeEvent, BeforeLeaveEvent, NavigationTrigger,
    Redirect, RedirectKind,
};
use crate::location::Location;
use crate::parameters::{RouteParameters, UrlParameter};
use crate::resolver::NavigationState;
use crate::router::Router;
use crate::target::ViewId;
use crate::ui::{ActiveView, BeforeLeaveListener, Ui};
use crate::view::View;

/// A completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationResult {
    /// 200 for a shown route, the error view's status otherwise.
    pub status: StatusCode,
    /// The visible location.
    pub location: Location,
    /// The shown view.
    pub target: ViewId,
    /// Parameters of the shown route.
    pub parameters: RouteParameters,
    /// The kind the error view was chosen for, if an error was shown.
    pub error: Option<ErrorType>,
}

/// How a call to [`Router::navigate`] ended.
#[derive(Debug)]
pub enum NavigationOutcome {
    /// The attempt ran to the end.
    Completed(NavigationResult),
    /// A before-leave handler postponed the attempt.
    Postponed(ContinueNavigation),
}

impl NavigationOutcome {
    /// The status. A postponed navigation reports 200.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Completed(result) => result.status,
            Self::Postponed(_) => StatusCode::OK,
        }
    }

    pub const fn is_postponed(&self) -> bool {
        matches!(self, Self::Postponed(_))
    }

    pub const fn result(&self) -> Option<&NavigationResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Postponed(_) => None,
        }
    }

    pub const fn continuation(&self) -> Option<&ContinueNavigation> {
        match self {
            Self::Completed(_) => None,
            Self::Postponed(continuation) => Some(continuation),
        }
    }
}

#[derive(Clone)]
enum LeaveObserver {
    Listener(Arc<BeforeLeaveListener>),
    View(usize),
}

struct PendingNavigation {
    ui: u64,
    generation: u64,
    location: Location,
    trigger: NavigationTrigger,
    remaining: VecDeque<LeaveObserver>,
}

/// Resumes or cancels a postponed navigation.
///
/// Clones share one pending attempt, which runs at most once. A handle whose
/// UI started a newer navigation since does nothing.
#[derive(Clone, Default)]
pub struct ContinueNavigation {
    pending: Arc<Mutex<Option<PendingNavigation>>>,
}

impl fmt::Debug for ContinueNavigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinueNavigation")
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl ContinueNavigation {
    /// Resumes the postponed attempt on `ui` with the observers that had not
    /// run yet.
    ///
    /// Returns `Ok(None)` if the attempt already resumed, was cancelled, or
    /// became stale.
    pub fn proceed(&self, router: &Router, ui: &mut Ui) -> WayfinderResult<Option<NavigationOutcome>> {
        let Some(pending) = self.take() else {
            return Ok(None);
        };
        if pending.ui != ui.id || pending.generation != ui.generation {
            tracing::debug!(
                location = %pending.location,
                "ignoring stale postponed navigation"
            );
            return Ok(None);
        }
        let span = navigation_span(&pending.location.path(), pending.trigger.as_str());
        let _guard = span.enter();
        tracing::debug!("resuming postponed navigation");
        router
            .leave(ui, pending.location, pending.trigger, pending.remaining)
            .map(Some)
    }

    /// Drops the postponed attempt.
    pub fn cancel(&self) {
        if self.take().is_some() {
            tracing::debug!("postponed navigation cancelled");
        }
    }

    /// Returns `true` while the attempt can still be resumed.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .expect("continuation lock poisoned")
            .is_some()
    }

    fn take(&self) -> Option<PendingNavigation> {
        self.pending.lock().expect("continuation lock poisoned").take()
    }

    fn store(&self, pending: PendingNavigation) {
        *self.pending.lock().expect("continuation lock poisoned") = Some(pending);
    }
}

/// Accepted error view statuses.
fn accepted_status(code: u16) -> Option<StatusCode> {
    match code {
        200 => Some(StatusCode::OK),
        401 => Some(StatusCode::UNAUTHORIZED),
        404 => Some(StatusCode::NOT_FOUND),
        500 => Some(StatusCode::INTERNAL_SERVER_ERROR),
        _ => None,
    }
}

/// Redirect bookkeeping for one attempt.
struct Attempt {
    trigger: NavigationTrigger,
    visible: Location,
    current: Location,
    visited: Vec<String>,
    hops: usize,
    max_hops: usize,
}

impl Attempt {
    fn new(location: Location, trigger: NavigationTrigger, max_hops: usize) -> Self {
        Self {
            trigger,
            visited: vec![location.path_with_query_parameters()],
            visible: location.clone(),
            current: location,
            hops: 0,
            max_hops,
        }
    }

    fn go_to(&mut self, kind: RedirectKind, location: Location) -> WayfinderResult<()> {
        self.hops += 1;
        let key = location.path_with_query_parameters();
        if self.visited.contains(&key) {
            let mut trail = self.visited.clone();
            trail.push(key);
            return Err(WayfinderError::RedirectLoop(trail.join(" -> ")));
        }
        if self.hops > self.max_hops {
            return Err(WayfinderError::RedirectLoop(format!(
                "more than {} redirects starting at '{}'",
                self.max_hops, self.visited[0]
            )));
        }
        tracing::debug!(kind = ?kind, to = %location, "following redirect");
        self.visited.push(key);
        if kind == RedirectKind::Forward {
            self.visible = location.clone();
        }
        self.current = location;
        Ok(())
    }
}

enum Slot {
    Reused(usize),
    Created(Box<dyn View>),
}

fn slot_view<'a>(
    chain: &'a mut [ActiveView],
    slot: &'a mut Slot,
) -> Option<&'a mut (dyn View + 'static)> {
    match slot {
        Slot::Reused(index) => chain.get_mut(*index).map(|active| active.view.as_mut()),
        Slot::Created(view) => Some(view.as_mut()),
    }
}

enum EnterOutcome {
    Entered(Vec<Slot>),
    Redirect(Redirect),
}

fn observer_failed(location: &Location, err: WayfinderError) -> WayfinderError {
    WayfinderError::NavigationFailed {
        location: location.path(),
        message: err.to_string(),
        source: Box::new(err),
    }
}

fn handler_failed(view: ViewId, err: WayfinderError) -> WayfinderError {
    WayfinderError::ErrorHandlerFailed {
        message: format!("error view '{view}' failed: {err}"),
        source: Some(Box::new(err)),
    }
}

impl Router {
    pub(crate) fn run(
        &self,
        ui: &mut Ui,
        location: Location,
        trigger: NavigationTrigger,
    ) -> WayfinderResult<NavigationOutcome> {
        ui.begin_attempt();
        let span = navigation_span(&location.path(), trigger.as_str());
        let _guard = span.enter();

        let mut observers: VecDeque<LeaveObserver> = ui
            .before_leave
            .snapshot()
            .into_iter()
            .map(LeaveObserver::Listener)
            .collect();
        observers.extend(
            ui.chain
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, active)| active.view.capabilities().handles_leave())
                .map(|(index, _)| LeaveObserver::View(index)),
        );
        self.leave(ui, location, trigger, observers)
    }

    pub(crate) fn leave(
        &self,
        ui: &mut Ui,
        location: Location,
        trigger: NavigationTrigger,
        mut observers: VecDeque<LeaveObserver>,
    ) -> WayfinderResult<NavigationOutcome> {
        let mut attempt = Attempt::new(location.clone(), trigger, self.settings.max_redirects);
        let continuation = ContinueNavigation::default();
        let mut event = BeforeLeaveEvent::new(BeforeEvent::new(location.clone(), trigger), continuation.clone());

        while let Some(observer) = observers.pop_front() {
            let result = match &observer {
                LeaveObserver::Listener(listener) => listener(&mut event),
                LeaveObserver::View(index) => match ui.chain.get_mut(*index) {
                    Some(active) => active.view.before_leave(&mut event),
                    None => Ok(()),
                },
            };
            if let Err(err) = result {
                return self.render_error(ui, &attempt, observer_failed(&location, err));
            }
            if event.is_postponed() {
                continuation.store(PendingNavigation {
                    ui: ui.id,
                    generation: ui.generation,
                    location: location.clone(),
                    trigger,
                    remaining: observers,
                });
                tracing::debug!("navigation postponed");
                return Ok(NavigationOutcome::Postponed(continuation));
            }
            match event.take_redirect() {
                Ok(None) => {}
                Ok(Some(redirect)) => {
                    if let Err(err) = self.follow(&mut attempt, redirect) {
                        return self.render_error(ui, &attempt, err);
                    }
                    break;
                }
                Err(err) => return self.render_error(ui, &attempt, err),
            }
        }
        self.enter_loop(ui, attempt)
    }

    fn follow(&self, attempt: &mut Attempt, redirect: Redirect) -> WayfinderResult<()> {
        let location = self.destination_location(redirect.destination)?;
        attempt.go_to(redirect.kind, location)
    }

    fn enter_loop(&self, ui: &mut Ui, mut attempt: Attempt) -> WayfinderResult<NavigationOutcome> {
        loop {
            let (state, parameter) = match self.resolve_attempt(&mut attempt) {
                Ok(resolved) => resolved,
                Err(err) => return self.render_error(ui, &attempt, err),
            };
            match self.enter(ui, &attempt, &state, parameter) {
                Ok(EnterOutcome::Entered(slots)) => {
                    let chain = state.target().chain();
                    self.commit(ui, slots, &chain);
                    self.after_navigation(ui, &attempt, chain, state.parameters().clone());
                    return Ok(NavigationOutcome::Completed(NavigationResult {
                        status: StatusCode::OK,
                        location: attempt.visible,
                        target: state.view(),
                        parameters: state.parameters().clone(),
                        error: None,
                    }));
                }
                Ok(EnterOutcome::Redirect(redirect)) => {
                    if let Err(err) = self.follow(&mut attempt, redirect) {
                        return self.render_error(ui, &attempt, err);
                    }
                }
                Err(err) => return self.render_error(ui, &attempt, err),
            }
        }
    }

    fn resolve_attempt(
        &self,
        attempt: &mut Attempt,
    ) -> WayfinderResult<(NavigationState, Option<UrlParameter>)> {
        let registry = self.registry.as_ref();
        let mut state = self.resolver.resolve(registry, &attempt.current);
        if state.is_none() && self.settings.toggle_trailing_slash {
            if let Some(toggled) = attempt.current.toggle_trailing_slash() {
                if let Some(found) = self.resolver.resolve(registry, &toggled) {
                    attempt.go_to(RedirectKind::Forward, toggled)?;
                    state = Some(found);
                }
            }
        }
        let Some(state) = state else {
            let path = attempt.current.path();
            tracing::warn!(path = %path, "no route found");
            return Err(WayfinderError::RouteNotFound {
                diagnostics: registry.explain(&attempt.current),
                path,
            });
        };
        tracing::debug!(template = %state.template(), view = %state.view(), "route resolved");
        let parameter = state.url_parameter()?;
        Ok((state, parameter))
    }

    /// Creates or reuses an instance for every view of `chain`.
    fn prepare_chain(&self, ui: &Ui, chain: &[ViewId]) -> WayfinderResult<Vec<Slot>> {
        chain
            .iter()
            .enumerate()
            .map(|(position, id)| match ui.chain.get(position) {
                Some(active) if active.id == *id => Ok(Slot::Reused(position)),
                _ => self.instantiator.create(*id).map(Slot::Created),
            })
            .collect()
    }

    fn enter(
        &self,
        ui: &mut Ui,
        attempt: &Attempt,
        state: &NavigationState,
        parameter: Option<UrlParameter>,
    ) -> WayfinderResult<EnterOutcome> {
        let location = &attempt.current;
        let chain = state.target().chain();
        let mut slots = self
            .prepare_chain(ui, &chain)
            .map_err(|err| observer_failed(location, err))?;

        let layouts = chain[..chain.len() - 1].to_vec();
        let mut event = BeforeEnterEvent::new(
            BeforeEvent::new(location.clone(), attempt.trigger),
            state.view(),
            layouts,
            state.parameters().clone(),
        );

        for listener in ui.before_enter.snapshot() {
            listener(&mut event).map_err(|err| observer_failed(location, err))?;
            if let Some(redirect) = event.take_redirect()? {
                return Ok(EnterOutcome::Redirect(redirect));
            }
        }

        let target_position = slots.len() - 1;
        let mut parameter = Some(parameter);
        for (position, slot) in slots.iter_mut().enumerate() {
            let Some(view) = slot_view(&mut ui.chain, slot) else {
                continue;
            };
            let capabilities = view.capabilities();
            if position == target_position && capabilities.handles_parameter() {
                if let Some(parameter) = parameter.take() {
                    view.set_parameter(&mut event, parameter)
                        .map_err(|err| observer_failed(location, err))?;
                    if let Some(redirect) = event.take_redirect()? {
                        return Ok(EnterOutcome::Redirect(redirect));
                    }
                }
            }
            if capabilities.handles_enter() {
                view.before_enter(&mut event)
                    .map_err(|err| observer_failed(location, err))?;
                if let Some(redirect) = event.take_redirect()? {
                    return Ok(EnterOutcome::Redirect(redirect));
                }
            }
        }
        Ok(EnterOutcome::Entered(slots))
    }

    /// Makes `slots` the active chain and detaches instances not reused.
    fn commit(&self, ui: &mut Ui, slots: Vec<Slot>, chain: &[ViewId]) {
        let mut previous: Vec<Option<ActiveView>> = ui.chain.drain(..).map(Some).collect();
        let mut next = Vec::with_capacity(slots.len());
        for (slot, id) in slots.into_iter().zip(chain) {
            match slot {
                Slot::Reused(index) => {
                    if let Some(active) = previous.get_mut(index).and_then(Option::take) {
                        next.push(active);
                    }
                }
                Slot::Created(view) => next.push(ActiveView { id: *id, view }),
            }
        }
        for mut stale in previous.into_iter().flatten() {
            stale.view.detach();
        }
        ui.chain = next;
    }

    fn after_navigation(
        &self,
        ui: &mut Ui,
        attempt: &Attempt,
        chain: Vec<ViewId>,
        parameters: RouteParameters,
    ) {
        let event = AfterNavigationEvent::new(
            attempt.visible.clone(),
            attempt.trigger,
            chain,
            parameters.clone(),
        );
        for active in &mut ui.chain {
            if active.view.capabilities().handles_after_navigation() {
                active.view.after_navigation(&event);
            }
        }
        for listener in ui.after_navigation.snapshot() {
            listener(&event);
        }
        ui.record_history(&attempt.visible, attempt.trigger);
        ui.location = Some(attempt.visible.clone());
        ui.parameters = parameters;
    }

    /// Shows the error view for `error`. An invalid status is escalated once.
    fn render_error(
        &self,
        ui: &mut Ui,
        attempt: &Attempt,
        error: WayfinderError,
    ) -> WayfinderResult<NavigationOutcome> {
        if error.is_fatal() {
            return Err(error);
        }
        match self.show_error(ui, attempt, error) {
            Err(invalid @ WayfinderError::InvalidStatusCode { .. }) => {
                match self.show_error(ui, attempt, invalid) {
                    Err(again @ WayfinderError::InvalidStatusCode { .. }) => {
                        Err(WayfinderError::ErrorHandlerFailed {
                            message: "error views returned invalid status codes twice".to_string(),
                            source: Some(Box::new(again)),
                        })
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    fn show_error(
        &self,
        ui: &mut Ui,
        attempt: &Attempt,
        error: WayfinderError,
    ) -> WayfinderResult<NavigationOutcome> {
        let Some(target) = self.registry.error_target(&error) else {
            return Err(WayfinderError::ErrorHandlerFailed {
                message: format!("no error view handles '{}'", error.error_type()),
                source: Some(Box::new(error)),
            });
        };
        let view_id = target.view();
        tracing::debug!(kind = %target.kind(), view = %view_id, error = %error, "showing error view");

        let chain = target.chain();
        let mut slots = self
            .prepare_chain(ui, &chain)
            .map_err(|err| handler_failed(view_id, err))?;
        let location = attempt.current.clone();
        let fallback_status = error.status_code();
        let parameter = ErrorParameter::new(
            target.kind(),
            error,
            location.clone(),
            self.settings.verbose_errors(),
        );
        let event = BeforeEnterEvent::new(
            BeforeEvent::new(location, attempt.trigger),
            view_id,
            chain[..chain.len() - 1].to_vec(),
            RouteParameters::empty(),
        );

        let view = match slots.last_mut() {
            Some(slot) => slot_view(&mut ui.chain, slot),
            None => None,
        };
        let code = match view {
            Some(view) if view.capabilities().handles_error_parameter() => view
                .set_error_parameter(&event, &parameter)
                .map_err(|err| handler_failed(view_id, err))?,
            _ => fallback_status,
        };
        let Some(status) = accepted_status(code) else {
            tracing::error!(view = %view_id, status = code, "error view returned an invalid status");
            return Err(WayfinderError::InvalidStatusCode {
                view: view_id.to_string(),
                status: code,
            });
        };

        self.commit(ui, slots, &chain);
        self.after_navigation(ui, attempt, chain, RouteParameters::empty());
        Ok(NavigationOutcome::Completed(NavigationResult {
            status,
            location: attempt.visible.clone(),
            target: view_id,
            parameters: RouteParameters::empty(),
            error: Some(target.kind()),
        }))
    }
}

//! Built-in error views.
//!
//! Each view keeps the text it would render. Outside production mode the text
//! is followed by detail lines: near-miss route diagnostics for not-found
//! errors, the causing error chain for everything else.

use wayfinder_core::WayfinderResult;

use crate::error_handler::ErrorParameter;
use crate::event::BeforeEnterEvent;
use crate::target::ViewId;
use crate::view::{Capabilities, View};

/// Rendered text of an error view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorPage {
    /// The headline shown in every mode.
    pub message: String,
    /// Extra lines shown outside production mode.
    pub details: Vec<String>,
}

impl ErrorPage {
    /// The full text, one line per entry.
    pub fn text(&self) -> String {
        std::iter::once(self.message.as_str())
            .chain(self.details.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Shown when no route matches. Status 404.
#[derive(Debug, Clone, Default)]
pub struct RouteNotFoundView {
    page: ErrorPage,
}

impl RouteNotFoundView {
    pub const ID: ViewId = ViewId::new("wayfinder::RouteNotFoundView");

    pub const fn page(&self) -> &ErrorPage {
        &self.page
    }
}

impl View for RouteNotFoundView {
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE.handles_error()
    }

    fn set_error_parameter(
        &mut self,
        _event: &BeforeEnterEvent,
        parameter: &ErrorParameter,
    ) -> WayfinderResult<u16> {
        let path = parameter.location().path();
        self.page.message = format!("Could not navigate to '{path}'");
        self.page.details.clear();
        if parameter.is_verbose() {
            self.page.details.push(format!("Reason: {}", parameter.message()));
            let diagnostics = parameter.diagnostics();
            if !diagnostics.is_empty() {
                self.page.details.push("Routes that did not match:".to_string());
                self.page
                    .details
                    .extend(diagnostics.iter().map(|line| format!("  {line}")));
            }
        }
        Ok(404)
    }
}

/// Shown when access is denied. Status 401.
#[derive(Debug, Clone, Default)]
pub struct AccessDeniedView {
    page: ErrorPage,
}

impl AccessDeniedView {
    pub const ID: ViewId = ViewId::new("wayfinder::AccessDeniedView");

    pub const fn page(&self) -> &ErrorPage {
        &self.page
    }
}

impl View for AccessDeniedView {
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE.handles_error()
    }

    fn set_error_parameter(
        &mut self,
        _event: &BeforeEnterEvent,
        parameter: &ErrorParameter,
    ) -> WayfinderResult<u16> {
        self.page.message = format!("Access to '{}' is denied", parameter.location().path());
        self.page.details.clear();
        if parameter.is_verbose() {
            self.page.details.push(format!("Reason: {}", parameter.message()));
        }
        Ok(401)
    }
}

/// Shown for every error without a more specific handler. Status 500.
#[derive(Debug, Clone, Default)]
pub struct InternalServerErrorView {
    page: ErrorPage,
}

impl InternalServerErrorView {
    pub const ID: ViewId = ViewId::new("wayfinder::InternalServerErrorView");

    pub const fn page(&self) -> &ErrorPage {
        &self.page
    }
}

impl View for InternalServerErrorView {
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE.handles_error()
    }

    fn set_error_parameter(
        &mut self,
        _event: &BeforeEnterEvent,
        parameter: &ErrorParameter,
    ) -> WayfinderResult<u16> {
        let path = parameter.location().path();
        tracing::error!(
            location = %path,
            kind = %parameter.error().error_type(),
            error = %parameter.error(),
            "navigation failed"
        );
        self.page.message =
            format!("There was an error while trying to navigate to '{path}'");
        self.page.details.clear();
        if parameter.is_verbose() {
            self.page.details.extend(
                parameter
                    .causes()
                    .into_iter()
                    .enumerate()
                    .map(|(depth, cause)| {
                        if depth == 0 {
                            cause
                        } else {
                            format!("Caused by: {cause}")
                        }
                    }),
            );
        }
        Ok(500)
    }
}

#[cfg(test)]
mod tests {
    use wayfinder_core::{ErrorType, WayfinderError};

    use super::*;
    use crate::event::{BeforeEvent, NavigationTrigger};
    use crate::location::Location;
    use crate::parameters::RouteParameters;

    fn enter_event(location: &Location) -> BeforeEnterEvent {
        BeforeEnterEvent::new(
            BeforeEvent::new(location.clone(), NavigationTrigger::Programmatic),
            RouteNotFoundView::ID,
            Vec::new(),
            RouteParameters::empty(),
        )
    }

    fn not_found(verbose: bool) -> ErrorParameter {
        ErrorParameter::new(
            ErrorType::NOT_FOUND,
            WayfinderError::RouteNotFound {
                path: "usrs".into(),
                diagnostics: vec!["users (Users): segment 'usrs' does not match 'users'".into()],
            },
            Location::parse("usrs").unwrap(),
            verbose,
        )
    }

    #[test]
    fn test_not_found_production_is_minimal() {
        let mut view = RouteNotFoundView::default();
        let param = not_found(false);
        let status = view
            .set_error_parameter(&enter_event(param.location()), &param)
            .unwrap();
        assert_eq!(status, 404);
        assert_eq!(view.page().text(), "Could not navigate to 'usrs'");
    }

    #[test]
    fn test_not_found_verbose_lists_near_misses() {
        let mut view = RouteNotFoundView::default();
        let param = not_found(true);
        view.set_error_parameter(&enter_event(param.location()), &param)
            .unwrap();
        let text = view.page().text();
        assert!(text.contains("Routes that did not match:"));
        assert!(text.contains("segment 'usrs' does not match 'users'"));
    }

    #[test]
    fn test_internal_error_shows_cause_chain_when_verbose() {
        let mut view = InternalServerErrorView::default();
        let location = Location::parse("admin").unwrap();
        let param = ErrorParameter::new(
            ErrorType::EXCEPTION,
            WayfinderError::NavigationFailed {
                location: "admin".into(),
                message: "db down".into(),
                source: Box::new(WayfinderError::InternalServerError("db down".into())),
            },
            location.clone(),
            true,
        );
        let status = view
            .set_error_parameter(&enter_event(&location), &param)
            .unwrap();
        assert_eq!(status, 500);
        assert_eq!(view.page().details.len(), 2);
        assert!(view.page().details[1].starts_with("Caused by: "));
    }

    #[test]
    fn test_access_denied_status() {
        let mut view = AccessDeniedView::default();
        let location = Location::parse("admin").unwrap();
        let param = ErrorParameter::new(
            ErrorType::ACCESS_DENIED,
            WayfinderError::AccessDenied("admins only".into()),
            location.clone(),
            false,
        );
        assert_eq!(
            view.set_error_parameter(&enter_event(&location), &param)
                .unwrap(),
            401
        );
        assert_eq!(view.page().message, "Access to 'admin' is denied");
    }
}

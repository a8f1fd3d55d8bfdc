//! Navigation links that know whether they point at the current location.

use std::fmt;
use std::sync::Arc;

use wayfinder_core::WayfinderResult;

use crate::event::AfterNavigationEvent;
use crate::location::QueryParameters;
use crate::parameters::{RouteParameters, UrlParameter};
use crate::router::Router;
use crate::target::ViewId;

/// Decides whether a link is highlighted after a navigation.
pub type HighlightCondition = Arc<dyn Fn(&RouterLink, &AfterNavigationEvent) -> bool + Send + Sync>;

/// Built-in highlight conditions.
pub mod highlight {
    use std::sync::Arc;

    use super::HighlightCondition;

    /// Highlights when the visible path equals the link's path.
    pub fn same_location() -> HighlightCondition {
        Arc::new(|link, event| event.location().path() == link.path())
    }

    /// Highlights when the link's path is a segment prefix of the visible
    /// path. A link to the root only matches the root.
    pub fn location_prefix() -> HighlightCondition {
        Arc::new(|link, event| {
            let location = event.location();
            if link.path().is_empty() {
                return location.is_root();
            }
            let current = location.segments();
            let wanted: Vec<&str> = link.path().split('/').collect();
            current.len() >= wanted.len()
                && current.iter().zip(&wanted).all(|(have, want)| have == want)
        })
    }

    pub fn always() -> HighlightCondition {
        Arc::new(|_, _| true)
    }

    pub fn never() -> HighlightCondition {
        Arc::new(|_, _| false)
    }
}

/// A link to a route, with optional query parameters and highlighting.
///
/// # Examples
///
/// ```
/// use wayfinder_router::{QueryParameters, RouterLink};
///
/// let link = RouterLink::new("users", "Users")
///     .with_query_parameters(QueryParameters::simple([("page", "2")]));
/// assert_eq!(link.href(), "users?page=2");
/// assert!(!link.is_highlighted());
/// ```
#[derive(Clone)]
pub struct RouterLink {
    path: String,
    text: String,
    query: QueryParameters,
    condition: HighlightCondition,
    highlighted: bool,
}

impl fmt::Debug for RouterLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterLink")
            .field("href", &self.href())
            .field("text", &self.text)
            .field("highlighted", &self.highlighted)
            .finish_non_exhaustive()
    }
}

impl RouterLink {
    /// A link to `path`, highlighted on the same location.
    ///
    /// A leading `/` is dropped; a trailing one is kept, since it names an
    /// empty final segment.
    pub fn new(path: impl AsRef<str>, text: impl Into<String>) -> Self {
        let path = path.as_ref();
        Self {
            path: path.strip_prefix('/').unwrap_or(path).to_string(),
            text: text.into(),
            query: QueryParameters::empty(),
            condition: highlight::same_location(),
            highlighted: false,
        }
    }

    /// A link to the URL of `view`.
    pub fn to_view(router: &Router, view: ViewId, text: impl Into<String>) -> WayfinderResult<Self> {
        Ok(Self::new(router.url(view)?, text))
    }

    /// A link to `view` with route parameters.
    pub fn to_view_with_parameters(
        router: &Router,
        view: ViewId,
        parameters: &RouteParameters,
        text: impl Into<String>,
    ) -> WayfinderResult<Self> {
        Ok(Self::new(router.url_with_parameters(view, parameters)?, text))
    }

    /// A link to `view` with its typed URL parameter.
    pub fn to_view_with_parameter(
        router: &Router,
        view: ViewId,
        parameter: &UrlParameter,
        text: impl Into<String>,
    ) -> WayfinderResult<Self> {
        Ok(Self::new(router.url_with_parameter(view, parameter)?, text))
    }

    #[must_use]
    pub fn with_query_parameters(mut self, query: QueryParameters) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_highlight_condition(mut self, condition: HighlightCondition) -> Self {
        self.condition = condition;
        self
    }

    /// The path, without query parameters.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path followed by the query string, if any.
    pub fn href(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query.query_string())
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn query_parameters(&self) -> &QueryParameters {
        &self.query
    }

    pub const fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Re-evaluates the highlight condition. Returns the new state.
    pub fn after_navigation(&mut self, event: &AfterNavigationEvent) -> bool {
        let condition = Arc::clone(&self.condition);
        self.highlighted = condition(self, event);
        self.highlighted
    }
}

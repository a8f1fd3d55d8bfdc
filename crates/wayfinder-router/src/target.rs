//! View identifiers and resolved route targets.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::parameters::UrlParameterSpec;

/// Identifies a view type.
///
/// Ids are compared by name, so two ids built from the same name refer to the
/// same view. [`ViewId::of`] derives the name from a Rust type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(&'static str);

impl ViewId {
    /// Creates an id with an explicit name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Creates the id of the Rust type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(std::any::type_name::<T>())
    }

    /// Returns the full name.
    pub const fn name(&self) -> &'static str {
        self.0
    }

    /// Returns the name without any module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.0.split('<').next().unwrap_or(self.0);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl fmt::Debug for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewId({})", self.0)
    }
}

impl Serialize for ViewId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A view together with the layouts it renders inside.
///
/// `parents` is flattened at registration time, innermost layout first and
/// outermost last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    view: ViewId,
    parents: Vec<ViewId>,
    url_parameter: Option<UrlParameterSpec>,
}

impl RouteTarget {
    /// A target rendered without layouts.
    pub const fn new(view: ViewId) -> Self {
        Self {
            view,
            parents: Vec::new(),
            url_parameter: None,
        }
    }

    /// Sets the layout chain, innermost first.
    #[must_use]
    pub fn with_parents(mut self, parents: Vec<ViewId>) -> Self {
        self.parents = parents;
        self
    }

    /// Declares the typed URL parameter this view accepts.
    #[must_use]
    pub const fn with_url_parameter(mut self, spec: UrlParameterSpec) -> Self {
        self.url_parameter = Some(spec);
        self
    }

    /// The target view.
    pub const fn view(&self) -> ViewId {
        self.view
    }

    /// Parent layouts, innermost first.
    pub fn parents(&self) -> &[ViewId] {
        &self.parents
    }

    /// The declared URL parameter contract.
    pub const fn url_parameter(&self) -> Option<&UrlParameterSpec> {
        self.url_parameter.as_ref()
    }

    /// The full chain, outermost layout first and the view last.
    pub fn chain(&self) -> Vec<ViewId> {
        self.parents
            .iter()
            .rev()
            .copied()
            .chain(std::iter::once(self.view))
            .collect()
    }
}

/// Public description of one registered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteData {
    /// The path the route was registered under.
    pub path: String,
    /// The canonical template matched against locations.
    pub template: String,
    /// The target view.
    pub view: ViewId,
    /// Layouts, innermost first.
    pub parents: Vec<ViewId>,
    /// The typed URL parameter, if any.
    pub url_parameter: Option<UrlParameterSpec>,
}

impl RouteData {
    /// The outermost layout, if any.
    pub fn outermost_parent(&self) -> Option<ViewId> {
        self.parents.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dashboard;

    #[test]
    fn test_view_id_of_type() {
        let id = ViewId::of::<Dashboard>();
        assert!(id.name().ends_with("Dashboard"));
        assert_eq!(id.short_name(), "Dashboard");
        assert_eq!(id, ViewId::of::<Dashboard>());
        assert_eq!(id.to_string(), "Dashboard");
    }

    #[test]
    fn test_view_id_named() {
        let id = ViewId::new("app::views::Home");
        assert_eq!(id.short_name(), "Home");
        assert_eq!(ViewId::new("Plain").short_name(), "Plain");
    }

    #[test]
    fn test_chain_outermost_first() {
        let target = RouteTarget::new(ViewId::new("Page"))
            .with_parents(vec![ViewId::new("Inner"), ViewId::new("Outer")]);
        assert_eq!(
            target.chain(),
            vec![ViewId::new("Outer"), ViewId::new("Inner"), ViewId::new("Page")]
        );
        assert_eq!(target.view(), ViewId::new("Page"));
    }

    #[test]
    fn test_route_data_serializes_names() {
        let data = RouteData {
            path: "users".into(),
            template: "users/:___url_parameter(^[+-]?[0-8]?[0-9]{1,9}$)".into(),
            view: ViewId::new("app::Users"),
            parents: vec![ViewId::new("app::Shell")],
            url_parameter: Some(UrlParameterSpec::required(crate::parameters::UrlParameterType::Int)),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["view"], "app::Users");
        assert_eq!(json["parents"][0], "app::Shell");
        assert_eq!(json["url_parameter"]["kind"], "Int");
        assert_eq!(json["url_parameter"]["arity"], "Required");
    }
}

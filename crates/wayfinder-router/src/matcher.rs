//! The route tree: best-match lookup over every registered template.
//!
//! Templates are stored as a tree keyed by canonical segment text. At each
//! node a location segment is tried against, in order:
//!
//! 1. the static child with the same text,
//! 2. required parameter children, in registration order,
//! 3. optional parameter children binding the segment,
//! 4. optional parameter children skipped,
//! 5. wildcard children, which take every remaining segment.
//!
//! The first branch that reaches a target wins, so an exact static route beats
//! a parameterized one and earlier registrations beat later ones.

use std::sync::Arc;

use wayfinder_core::{WayfinderError, WayfinderResult};

use crate::location::Location;
use crate::parameters::{ParameterArity, RouteParameters};
use crate::target::{RouteData, RouteTarget, ViewId};
use crate::template::{ParameterSpec, RouteTemplate, SegmentSpec};

/// One registered route: the path it was registered under, its full template,
/// and its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    path: String,
    template: RouteTemplate,
    target: Arc<RouteTarget>,
}

impl RouteEntry {
    /// Builds an entry, appending the target's URL parameter segment.
    pub fn new(path: &str, target: RouteTarget) -> WayfinderResult<Self> {
        let base = RouteTemplate::parse(path)?;
        let template = match target.url_parameter() {
            Some(spec) => base.with_url_parameter(spec)?,
            None => base,
        };
        Ok(Self {
            path: normalize_path(path),
            template,
            target: Arc::new(target),
        })
    }

    /// The path as registered, without surrounding slashes.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The full template, including any URL parameter segment.
    pub const fn template(&self) -> &RouteTemplate {
        &self.template
    }

    /// The route target.
    pub fn target(&self) -> &Arc<RouteTarget> {
        &self.target
    }

    /// The target view.
    pub fn view(&self) -> ViewId {
        self.target.view()
    }

    /// Describes this entry for listings and listeners.
    pub fn data(&self) -> RouteData {
        RouteData {
            path: self.path.clone(),
            template: self.template.to_string(),
            view: self.view(),
            parents: self.target.parents().to_vec(),
            url_parameter: self.target.url_parameter().copied(),
        }
    }
}

/// Strips surrounding slashes from a registered path.
pub fn normalize_path(path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.strip_suffix('/').unwrap_or(path).to_string()
}

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// The matched entry.
    pub entry: &'a Arc<RouteEntry>,
    /// Parameters extracted from the location.
    pub parameters: RouteParameters,
}

/// Best-match lookup over a set of templates.
#[derive(Debug, Clone, Default)]
pub struct RouteMatcher {
    root: Node,
}

impl RouteMatcher {
    /// Creates an empty matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a matcher from entries, in registration order.
    pub fn from_entries<I>(entries: I) -> WayfinderResult<Self>
    where
        I: IntoIterator<Item = Arc<RouteEntry>>,
    {
        let mut matcher = Self::new();
        for entry in entries {
            matcher.insert(&entry)?;
        }
        Ok(matcher)
    }

    /// Adds an entry.
    ///
    /// Fails if the template is already registered, or if an optional tail
    /// would make a location ambiguous between two different views.
    pub fn insert(&mut self, entry: &Arc<RouteEntry>) -> WayfinderResult<()> {
        let result = self.root.insert(entry.template.segments(), entry);
        if result.is_err() {
            self.root.prune();
        }
        result
    }

    /// Removes the entry registered for `template`, optionally only if it
    /// targets `view`. Returns the removed entry.
    pub fn remove(
        &mut self,
        template: &RouteTemplate,
        view: Option<ViewId>,
    ) -> Option<Arc<RouteEntry>> {
        self.root.remove(template.segments(), view)
    }

    /// Finds the best entry for location segments.
    pub fn find(&self, segments: &[&str]) -> Option<RouteMatch<'_>> {
        let mut bound = Vec::new();
        let entry = self.root.find(segments, &mut bound)?;
        let parameters = RouteParameters::new(bound).ok()?;
        Some(RouteMatch { entry, parameters })
    }

    /// Finds the best entry for a location.
    pub fn find_location(&self, location: &Location) -> Option<RouteMatch<'_>> {
        self.find(&location.route_segments())
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    key: String,
    parameter: Option<ParameterSpec>,
    leaf: Option<Arc<RouteEntry>>,
    statics: Vec<Node>,
    required: Vec<Node>,
    optional: Vec<Node>,
    wildcard: Vec<Node>,
}

impl Node {
    fn for_segment(spec: &SegmentSpec) -> Self {
        Self {
            key: spec.key(),
            parameter: spec.parameter().cloned(),
            ..Self::default()
        }
    }

    fn bucket_mut(&mut self, spec: &SegmentSpec) -> &mut Vec<Self> {
        match spec.parameter().map(ParameterSpec::arity) {
            None => &mut self.statics,
            Some(ParameterArity::Required) => &mut self.required,
            Some(ParameterArity::Optional) => &mut self.optional,
            Some(ParameterArity::Wildcard) => &mut self.wildcard,
        }
    }

    fn children(&self) -> impl Iterator<Item = &Self> {
        self.statics
            .iter()
            .chain(&self.required)
            .chain(&self.optional)
            .chain(&self.wildcard)
    }

    fn is_empty(&self) -> bool {
        self.leaf.is_none() && self.children().all(Self::is_empty)
    }

    fn prune(&mut self) {
        for bucket in [
            &mut self.statics,
            &mut self.required,
            &mut self.optional,
            &mut self.wildcard,
        ] {
            for child in bucket.iter_mut() {
                child.prune();
            }
            bucket.retain(|child| !child.is_empty());
        }
    }

    fn insert(&mut self, specs: &[SegmentSpec], entry: &Arc<RouteEntry>) -> WayfinderResult<()> {
        let Some((spec, rest)) = specs.split_first() else {
            return self.set_leaf(entry);
        };
        let optional_tail = rest.is_empty()
            && spec
                .parameter()
                .is_some_and(|p| p.arity() == ParameterArity::Optional);
        if optional_tail {
            if let Some(existing) = self.leaf.as_ref().filter(|e| e.view() != entry.view()) {
                return Err(ambiguous_optional(existing, entry));
            }
        }
        let key = spec.key();
        let bucket = self.bucket_mut(spec);
        let index = match bucket.iter().position(|child| child.key == key) {
            Some(index) => index,
            None => {
                bucket.push(Self::for_segment(spec));
                bucket.len() - 1
            }
        };
        bucket[index].insert(rest, entry)
    }

    fn set_leaf(&mut self, entry: &Arc<RouteEntry>) -> WayfinderResult<()> {
        if let Some(existing) = &self.leaf {
            return Err(WayfinderError::AmbiguousRoute(format!(
                "'{}' and '{}' are both registered for route '{}'",
                existing.view(),
                entry.view(),
                entry.template
            )));
        }
        let conflicting = self
            .optional
            .iter()
            .filter_map(|child| child.leaf.as_ref())
            .find(|other| other.view() != entry.view());
        if let Some(other) = conflicting {
            return Err(ambiguous_optional(entry, other));
        }
        self.leaf = Some(Arc::clone(entry));
        Ok(())
    }

    fn remove(&mut self, specs: &[SegmentSpec], view: Option<ViewId>) -> Option<Arc<RouteEntry>> {
        let Some((spec, rest)) = specs.split_first() else {
            let matches = self
                .leaf
                .as_ref()
                .is_some_and(|leaf| view.map_or(true, |v| leaf.view() == v));
            return if matches { self.leaf.take() } else { None };
        };
        let key = spec.key();
        let bucket = self.bucket_mut(spec);
        let index = bucket.iter().position(|child| child.key == key)?;
        let removed = bucket[index].remove(rest, view);
        if bucket[index].is_empty() {
            bucket.remove(index);
        }
        removed
    }

    fn accepts(&self, segment: &str) -> bool {
        self.parameter.as_ref().map_or(false, |p| p.accepts(segment))
    }

    fn parameter_name(&self) -> String {
        self.parameter
            .as_ref()
            .map(|p| p.name().to_string())
            .unwrap_or_default()
    }

    fn find<'a>(
        &'a self,
        segments: &[&str],
        bound: &mut Vec<(String, String)>,
    ) -> Option<&'a Arc<RouteEntry>> {
        let Some((head, rest)) = segments.split_first() else {
            return self.leaf.as_ref().or_else(|| self.skip_optional_tail());
        };

        if let Some(child) = self.statics.iter().find(|child| child.key == *head) {
            if let Some(found) = child.find(rest, bound) {
                return Some(found);
            }
        }
        for child in self.required.iter().chain(&self.optional) {
            if let Some(found) = child.bind(head, rest, bound) {
                return Some(found);
            }
        }
        for child in &self.optional {
            let mark = bound.len();
            if let Some(found) = child.find(segments, bound) {
                return Some(found);
            }
            bound.truncate(mark);
        }
        for child in &self.wildcard {
            if let Some(leaf) = child.leaf.as_ref() {
                if segments.iter().all(|segment| child.accepts(segment)) {
                    bound.push((child.parameter_name(), segments.join("/")));
                    return Some(leaf);
                }
            }
        }
        None
    }

    fn bind<'a>(
        &'a self,
        head: &str,
        rest: &[&str],
        bound: &mut Vec<(String, String)>,
    ) -> Option<&'a Arc<RouteEntry>> {
        if !self.accepts(head) {
            return None;
        }
        bound.push((self.parameter_name(), head.to_string()));
        let found = self.find(rest, bound);
        if found.is_none() {
            bound.pop();
        }
        found
    }

    /// With no segments left, a target is still reachable through optional
    /// parameters left unbound or an empty wildcard.
    fn skip_optional_tail(&self) -> Option<&Arc<RouteEntry>> {
        self.optional
            .iter()
            .find_map(|child| child.leaf.as_ref())
            .or_else(|| {
                self.optional
                    .iter()
                    .find_map(Self::skip_optional_tail)
            })
            .or_else(|| self.wildcard.iter().find_map(|child| child.leaf.as_ref()))
    }
}

fn ambiguous_optional(exact: &RouteEntry, optional: &RouteEntry) -> WayfinderError {
    WayfinderError::AmbiguousRoute(format!(
        "'{}' is registered for '{}' and '{}' for '{}'; the optional parameter makes them ambiguous",
        exact.view(),
        exact.template,
        optional.view(),
        optional.template
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{UrlParameterSpec, UrlParameterType};

    const A: ViewId = ViewId::new("A");
    const B: ViewId = ViewId::new("B");
    const C: ViewId = ViewId::new("C");

    fn entry(path: &str, view: ViewId) -> Arc<RouteEntry> {
        Arc::new(RouteEntry::new(path, RouteTarget::new(view)).unwrap())
    }

    fn matcher(routes: &[(&str, ViewId)]) -> RouteMatcher {
        RouteMatcher::from_entries(routes.iter().map(|(p, v)| entry(p, *v))).unwrap()
    }

    fn lookup(m: &RouteMatcher, path: &str) -> Option<(ViewId, RouteParameters)> {
        let location = Location::parse(path).unwrap();
        m.find_location(&location)
            .map(|found| (found.entry.view(), found.parameters))
    }

    fn params(pairs: &[(&str, &str)]) -> RouteParameters {
        RouteParameters::new(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_static_beats_parameter_regardless_of_order() {
        let m = matcher(&[("users/:id", A), ("users/new", B)]);
        assert_eq!(lookup(&m, "users/new").unwrap().0, B);
        assert_eq!(lookup(&m, "users/7"), Some((A, params(&[("id", "7")]))));
    }

    #[test]
    fn test_earliest_parameter_wins() {
        let m = matcher(&[("items/:first", A), ("items/:second", B)]);
        assert_eq!(lookup(&m, "items/x"), Some((A, params(&[("first", "x")]))));
    }

    #[test]
    fn test_constraint_falls_through_to_next_candidate() {
        let m = matcher(&[("items/:id(\\d+)", A), ("items/:slug", B)]);
        assert_eq!(lookup(&m, "items/12").unwrap().0, A);
        assert_eq!(lookup(&m, "items/abc").unwrap().0, B);
    }

    #[test]
    fn test_backtracks_out_of_dead_static_branch() {
        let m = matcher(&[("a/b/c", A), ("a/:x/d", B)]);
        assert_eq!(lookup(&m, "a/b/d"), Some((B, params(&[("x", "b")]))));
    }

    #[test]
    fn test_required_before_optional_before_wildcard() {
        let m = matcher(&[("x/:rest*", C), ("x/:opt?", B), ("x/:req", A)]);
        assert_eq!(lookup(&m, "x/1").unwrap().0, A);
        assert_eq!(lookup(&m, "x").unwrap().0, B);
        assert_eq!(lookup(&m, "x/1/2").unwrap().0, C);
    }

    #[test]
    fn test_optional_skip_reaches_deeper_static() {
        let m = matcher(&[(":lang?/about", A)]);
        assert_eq!(lookup(&m, "about"), Some((A, RouteParameters::empty())));
        assert_eq!(lookup(&m, "fi/about"), Some((A, params(&[("lang", "fi")]))));
    }

    #[test]
    fn test_sibling_optional_binds_before_any_skip() {
        let m = matcher(&[("o/:a?/x", A), ("o/:b?", B)]);
        assert_eq!(lookup(&m, "o/x"), Some((B, params(&[("b", "x")]))));
        assert_eq!(lookup(&m, "o/1/x"), Some((A, params(&[("a", "1")]))));
    }

    #[test]
    fn test_wildcard_keeps_empty_segments() {
        let m = matcher(&[("wild/:p*", A)]);
        assert_eq!(
            lookup(&m, "wild//two/three"),
            Some((A, params(&[("p", "/two/three")])))
        );
        assert_eq!(lookup(&m, "wild"), Some((A, RouteParameters::empty())));
        assert_eq!(lookup(&m, "wild/"), Some((A, params(&[("p", "")]))));
    }

    #[test]
    fn test_root_route() {
        let m = matcher(&[("", A), ("a", B)]);
        assert_eq!(lookup(&m, "").unwrap().0, A);
        assert_eq!(lookup(&m, "/").unwrap().0, A);
        assert!(lookup(&m, "a/").is_none());
    }

    #[test]
    fn test_aliases_for_same_view_are_not_ambiguous() {
        let m = matcher(&[("route", A), ("route/:p?", A)]);
        assert_eq!(lookup(&m, "route"), Some((A, RouteParameters::empty())));
        assert_eq!(lookup(&m, "route/1"), Some((A, params(&[("p", "1")]))));
        assert!(lookup(&m, "route/1/2").is_none());
    }

    #[test]
    fn test_optional_tail_against_other_view_is_ambiguous() {
        let mut m = matcher(&[("route", A)]);
        let err = m.insert(&entry("route/:p?", B)).unwrap_err();
        assert!(matches!(err, WayfinderError::AmbiguousRoute(_)));

        let mut m = matcher(&[("route/:p?", B)]);
        assert!(m.insert(&entry("route", A)).is_err());
    }

    #[test]
    fn test_failed_insert_leaves_no_dangling_nodes() {
        let mut m = matcher(&[("route", A)]);
        assert!(m.insert(&entry("route/:p?", B)).is_err());
        assert!(m.insert(&entry("route/:p", B)).is_ok());
        assert_eq!(lookup(&m, "route/1").unwrap().0, B);
    }

    #[test]
    fn test_duplicate_template_rejected() {
        let mut m = matcher(&[("a/:id", A)]);
        assert!(m.insert(&entry("a/:id", B)).is_err());
        assert!(m.insert(&entry("a/:id", A)).is_err());
        assert!(m.insert(&entry("a/:other", B)).is_ok());
    }

    #[test]
    fn test_url_parameter_entries_coexist_with_exact() {
        let with_param = Arc::new(
            RouteEntry::new(
                "param",
                RouteTarget::new(B)
                    .with_url_parameter(UrlParameterSpec::required(UrlParameterType::String)),
            )
            .unwrap(),
        );
        let mut m = matcher(&[("param", A)]);
        m.insert(&with_param).unwrap();
        assert_eq!(lookup(&m, "param").unwrap().0, A);
        let (view, found) = lookup(&m, "param/x").unwrap();
        assert_eq!(view, B);
        assert_eq!(found.get(RouteParameters::URL_PARAMETER_NAME), Some("x"));
    }

    #[test]
    fn test_remove_prunes_and_respects_view() {
        let mut m = matcher(&[("a/b", A), ("a/:x", B)]);
        let template = RouteTemplate::parse("a/b").unwrap();
        assert!(m.remove(&template, Some(B)).is_none());
        assert_eq!(m.remove(&template, Some(A)).unwrap().view(), A);
        assert_eq!(lookup(&m, "a/b").unwrap().0, B);
        assert!(m.remove(&RouteTemplate::parse("a/:x").unwrap(), None).is_some());
        assert!(m.is_empty());
    }

    #[test]
    fn test_entry_data() {
        let e = RouteEntry::new(
            "/users/",
            RouteTarget::new(A).with_parents(vec![B, C]),
        )
        .unwrap();
        let data = e.data();
        assert_eq!(data.path, "users");
        assert_eq!(data.template, "users");
        assert_eq!(data.outermost_parent(), Some(C));
    }
}

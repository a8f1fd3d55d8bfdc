//! Route template parsing, single-template matching, and URL formatting.
//!
//! Template syntax, one specifier per `/`-separated segment:
//!
//! | Segment | Meaning |
//! |---|---|
//! | `users` | static text |
//! | `:id` | required parameter |
//! | `:tab?` | optional parameter |
//! | `:path*` | wildcard, every remaining segment |
//! | `:id(\d+)` | parameter whose text must fully match the regex |
//!
//! A modifier and a constraint combine as `:id?(\d+)`. At most one wildcard is
//! allowed and it must be the last segment.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use wayfinder_core::{WayfinderError, WayfinderResult};

use crate::parameters::{ParameterArity, RouteParameters, UrlParameterSpec};

static PARAMETER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("parameter name regex is valid")
});

/// A compiled full-match regex constraint.
#[derive(Clone)]
pub struct Constraint {
    source: String,
    regex: Regex,
}

impl Constraint {
    fn compile(source: &str, template: &str) -> WayfinderResult<Self> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
            WayfinderError::InvalidTemplate {
                template: template.to_string(),
                reason: format!("invalid regex '{source}': {e}"),
            }
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The regex as written in the template.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns `true` if `value` fully matches.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constraint").field(&self.source).finish()
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Constraint {}

/// A named parameter segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    name: String,
    arity: ParameterArity,
    constraint: Option<Constraint>,
}

impl ParameterSpec {
    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many segments this parameter consumes.
    pub const fn arity(&self) -> ParameterArity {
        self.arity
    }

    /// The regex constraint, if any.
    pub const fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    /// Returns `true` if a single segment value is acceptable.
    pub fn accepts(&self, value: &str) -> bool {
        self.constraint.as_ref().map_or(true, |c| c.is_match(value))
    }
}

impl fmt::Display for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.name)?;
        match self.arity {
            ParameterArity::Required => {}
            ParameterArity::Optional => f.write_str("?")?,
            ParameterArity::Wildcard => f.write_str("*")?,
        }
        if let Some(constraint) = &self.constraint {
            write!(f, "({})", constraint.source)?;
        }
        Ok(())
    }
}

/// One segment of a route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentSpec {
    /// Literal text.
    Static(String),
    /// A named parameter.
    Parameter(ParameterSpec),
}

impl SegmentSpec {
    /// The canonical text of this segment, used as its identity in the route tree.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Returns the parameter spec, if this is a parameter.
    pub const fn parameter(&self) -> Option<&ParameterSpec> {
        match self {
            Self::Static(_) => None,
            Self::Parameter(spec) => Some(spec),
        }
    }
}

impl fmt::Display for SegmentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(text) => f.write_str(text),
            Self::Parameter(spec) => spec.fmt(f),
        }
    }
}

/// A parsed route template.
///
/// # Examples
///
/// ```
/// use wayfinder_router::RouteTemplate;
///
/// let template = RouteTemplate::parse("/files/:id(\\d+)/:rest*").unwrap();
/// assert_eq!(template.to_string(), "files/:id(\\d+)/:rest*");
///
/// let params = template.match_segments(&["files", "7", "a", "", "b"]).unwrap();
/// assert_eq!(params.get("rest"), Some("a//b"));
/// assert!(template.match_segments(&["files", "x"]).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    segments: Vec<SegmentSpec>,
}

impl RouteTemplate {
    /// Parses a template. Leading and trailing slashes are ignored.
    pub fn parse(template: &str) -> WayfinderResult<Self> {
        let trimmed = template.strip_prefix('/').unwrap_or(template);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Ok(Self {
                segments: Vec::new(),
            });
        }

        let invalid = |reason: String| WayfinderError::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut names = HashSet::new();
        let raw_segments = split_segments(trimmed).map_err(invalid)?;
        let count = raw_segments.len();
        for (index, raw) in raw_segments.into_iter().enumerate() {
            if raw.is_empty() {
                return Err(invalid("templates cannot contain empty segments".to_string()));
            }
            let Some(body) = raw.strip_prefix(':') else {
                segments.push(SegmentSpec::Static(raw.to_string()));
                continue;
            };
            let spec = parse_parameter(body, template)?;
            if spec.arity == ParameterArity::Wildcard && index + 1 != count {
                return Err(invalid(format!(
                    "wildcard parameter '{}' must be the last segment",
                    spec.name
                )));
            }
            if !names.insert(spec.name.clone()) {
                return Err(invalid(format!("parameter '{}' appears twice", spec.name)));
            }
            segments.push(SegmentSpec::Parameter(spec));
        }
        Ok(Self { segments })
    }

    /// Returns the segment specifiers.
    pub fn segments(&self) -> &[SegmentSpec] {
        &self.segments
    }

    /// Returns `true` if the template has no parameters.
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, SegmentSpec::Static(_)))
    }

    /// Returns the parameter specs in template order.
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.segments.iter().filter_map(SegmentSpec::parameter)
    }

    /// Returns `true` if the template ends in a wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.parameters()
            .any(|p| p.arity == ParameterArity::Wildcard)
    }

    /// Returns the leading static segments joined with `/`.
    pub fn base_path(&self) -> String {
        self.segments
            .iter()
            .map_while(|s| match s {
                SegmentSpec::Static(text) => Some(text.as_str()),
                SegmentSpec::Parameter(_) => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Returns this template with a view's URL parameter segment appended.
    pub fn with_url_parameter(&self, spec: &UrlParameterSpec) -> WayfinderResult<Self> {
        if self.has_wildcard() {
            return Err(WayfinderError::InvalidTemplate {
                template: self.to_string(),
                reason: "a URL parameter cannot follow a wildcard parameter".to_string(),
            });
        }
        let path = self.to_string();
        let joined = if path.is_empty() {
            spec.template_segment()
        } else {
            format!("{path}/{}", spec.template_segment())
        };
        Self::parse(&joined)
    }

    /// Matches this template alone against location segments.
    ///
    /// Optional parameters first try to bind the segment, then to be skipped.
    pub fn match_segments(&self, segments: &[&str]) -> Option<RouteParameters> {
        let mut bound = Vec::new();
        if match_from(&self.segments, segments, &mut bound) {
            RouteParameters::new(bound).ok()
        } else {
            None
        }
    }

    /// Explains why `segments` do not match, for not-found diagnostics.
    /// Returns `None` if they do match.
    pub fn explain_mismatch(&self, segments: &[&str]) -> Option<String> {
        if self.match_segments(segments).is_some() {
            return None;
        }
        let mut remaining = segments;
        for spec in &self.segments {
            match spec {
                SegmentSpec::Static(text) => match remaining.split_first() {
                    Some((head, tail)) if head == text => remaining = tail,
                    Some((head, _)) => {
                        return Some(format!("segment '{head}' does not match '{text}'"))
                    }
                    None => return Some(format!("missing segment '{text}'")),
                },
                SegmentSpec::Parameter(param) => match (param.arity, remaining.split_first()) {
                    (ParameterArity::Wildcard, _) => {
                        let rejected = remaining.iter().find(|s| !param.accepts(s));
                        return Some(rejected.map_or_else(
                            || "optional parameters could not be bound".to_string(),
                            |s| format!("segment '{s}' is rejected by the constraint of '{param}'"),
                        ));
                    }
                    (_, Some((head, tail))) if param.accepts(head) => remaining = tail,
                    (ParameterArity::Optional, _) => {}
                    (ParameterArity::Required, Some((head, _))) => {
                        return Some(format!(
                            "segment '{head}' is rejected by the constraint of '{param}'"
                        ))
                    }
                    (ParameterArity::Required, None) => {
                        return Some(format!("missing value for required parameter '{param}'"))
                    }
                },
            }
        }
        if remaining.is_empty() {
            Some("optional parameters could not be bound".to_string())
        } else {
            Some(format!("{} unexpected trailing segment(s)", remaining.len()))
        }
    }

    /// Builds the path for `parameters`.
    ///
    /// Fails when a required parameter is missing, a value does not satisfy
    /// its constraint, a value contains characters that would change the
    /// path structure, or a parameter is not used by the template.
    pub fn format_url(&self, parameters: &RouteParameters) -> WayfinderResult<String> {
        let mut parts: Vec<&str> = Vec::new();
        let mut used = 0;
        for spec in &self.segments {
            let param = match spec {
                SegmentSpec::Static(text) => {
                    parts.push(text);
                    continue;
                }
                SegmentSpec::Parameter(param) => param,
            };
            let Some(value) = parameters.get(&param.name) else {
                if param.arity == ParameterArity::Required {
                    return Err(WayfinderError::InvalidParameter(format!(
                        "template '{self}' requires parameter '{}'",
                        param.name
                    )));
                }
                continue;
            };
            used += 1;
            if param.arity == ParameterArity::Wildcard {
                for piece in value.split('/') {
                    check_value(param, piece)?;
                    parts.push(piece);
                }
            } else {
                if value.contains('/') {
                    return Err(WayfinderError::InvalidParameter(format!(
                        "value '{value}' for parameter '{}' contains '/'; encode it first",
                        param.name
                    )));
                }
                check_value(param, value)?;
                parts.push(value);
            }
        }
        if used != parameters.len() {
            let unused: Vec<_> = parameters
                .names()
                .filter(|name| !self.parameters().any(|p| p.name == *name))
                .collect();
            return Err(WayfinderError::InvalidParameter(format!(
                "parameters [{}] are not used by template '{self}'",
                unused.join(", ")
            )));
        }
        Ok(parts.join("/"))
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            segment.fmt(f)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for RouteTemplate {
    type Err = WayfinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn check_value(param: &ParameterSpec, value: &str) -> WayfinderResult<()> {
    if value.contains(['?', '#']) || value == ".." {
        return Err(WayfinderError::InvalidParameter(format!(
            "value '{value}' for parameter '{}' is not a valid path segment",
            param.name
        )));
    }
    if !param.accepts(value) {
        return Err(WayfinderError::InvalidParameter(format!(
            "value '{value}' does not match the constraint of parameter '{param}'"
        )));
    }
    Ok(())
}

fn match_from(specs: &[SegmentSpec], segments: &[&str], bound: &mut Vec<(String, String)>) -> bool {
    let Some((spec, rest)) = specs.split_first() else {
        return segments.is_empty();
    };
    match spec {
        SegmentSpec::Static(text) => match segments.split_first() {
            Some((head, tail)) if head == text => match_from(rest, tail, bound),
            _ => false,
        },
        SegmentSpec::Parameter(param) => match param.arity {
            ParameterArity::Wildcard => {
                if !segments.iter().all(|s| param.accepts(s)) {
                    return false;
                }
                if !segments.is_empty() {
                    bound.push((param.name.clone(), segments.join("/")));
                }
                true
            }
            arity => {
                if let Some((head, tail)) = segments.split_first() {
                    if param.accepts(head) {
                        bound.push((param.name.clone(), (*head).to_string()));
                        if match_from(rest, tail, bound) {
                            return true;
                        }
                        bound.pop();
                    }
                }
                arity == ParameterArity::Optional && match_from(rest, segments, bound)
            }
        },
    }
}

/// Splits on `/` outside of parenthesised regex constraints.
fn split_segments(template: &str) -> Result<Vec<&str>, String> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in template.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ')'".to_string())?;
            }
            '/' if depth == 0 => {
                segments.push(&template[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced '('".to_string());
    }
    segments.push(&template[start..]);
    Ok(segments)
}

fn parse_parameter(body: &str, template: &str) -> WayfinderResult<ParameterSpec> {
    let invalid = |reason: String| WayfinderError::InvalidTemplate {
        template: template.to_string(),
        reason,
    };
    let name = PARAMETER_NAME
        .find(body)
        .map(|m| m.as_str())
        .ok_or_else(|| invalid(format!("missing parameter name in ':{body}'")))?;
    let mut rest = &body[name.len()..];

    let mut arity = take_modifier(&mut rest);
    let mut constraint = None;
    if let Some(inner) = rest.strip_prefix('(') {
        let close = inner
            .rfind(')')
            .ok_or_else(|| invalid(format!("unclosed constraint in ':{body}'")))?;
        constraint = Some(Constraint::compile(&inner[..close], template)?);
        rest = &inner[close + 1..];
        if arity.is_none() {
            arity = take_modifier(&mut rest);
        }
    }
    if !rest.is_empty() {
        return Err(invalid(format!("unexpected '{rest}' after parameter '{name}'")));
    }
    Ok(ParameterSpec {
        name: name.to_string(),
        arity: arity.unwrap_or(ParameterArity::Required),
        constraint,
    })
}

fn take_modifier(rest: &mut &str) -> Option<ParameterArity> {
    let arity = match rest.chars().next()? {
        '?' => ParameterArity::Optional,
        '*' => ParameterArity::Wildcard,
        _ => return None,
    };
    *rest = &rest[1..];
    Some(arity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::UrlParameterType;

    fn params(pairs: &[(&str, &str)]) -> RouteParameters {
        RouteParameters::new(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_parse_canonical_form() {
        let template = RouteTemplate::parse("/a/:b/:c?/:d*").unwrap();
        assert_eq!(template.to_string(), "a/:b/:c?/:d*");
        assert_eq!(template.segments().len(), 4);
        assert_eq!(template.base_path(), "a");
        assert!(!template.is_static());
        assert!(template.has_wildcard());
    }

    #[test]
    fn test_parse_root() {
        let template = RouteTemplate::parse("").unwrap();
        assert!(template.segments().is_empty());
        assert!(template.is_static());
        assert_eq!(RouteTemplate::parse("/").unwrap(), template);
    }

    #[test]
    fn test_parse_constraint_with_slash_and_modifier_positions() {
        let a = RouteTemplate::parse(":id?(\\d+)").unwrap();
        let b = RouteTemplate::parse(":id(\\d+)?").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), ":id?(\\d+)");
        let slash = RouteTemplate::parse("x/:p(a/b|c)").unwrap();
        assert_eq!(slash.segments().len(), 2);
        assert!(slash.match_segments(&["x", "c"]).is_some());
    }

    #[test]
    fn test_parse_errors() {
        for bad in [
            "a//b",
            "a/:*",
            "a/:p*/b",
            "a/:p/:p",
            "a/:p(",
            "a/:p)",
            "a/:p([)",
            "a/:p?x",
        ] {
            assert!(
                matches!(RouteTemplate::parse(bad), Err(WayfinderError::InvalidTemplate { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_match_static() {
        let template = RouteTemplate::parse("a/b").unwrap();
        assert_eq!(template.match_segments(&["a", "b"]), Some(RouteParameters::empty()));
        assert!(template.match_segments(&["a"]).is_none());
        assert!(template.match_segments(&["a", "b", ""]).is_none());
    }

    #[test]
    fn test_match_optional_bind_then_skip() {
        let template = RouteTemplate::parse(":a?/:b").unwrap();
        assert_eq!(template.match_segments(&["x"]), Some(params(&[("b", "x")])));
        assert_eq!(
            template.match_segments(&["x", "y"]),
            Some(params(&[("a", "x"), ("b", "y")]))
        );
    }

    #[test]
    fn test_match_optional_empty_value() {
        let template = RouteTemplate::parse("route/:p?").unwrap();
        assert_eq!(template.match_segments(&["route", ""]), Some(params(&[("p", "")])));
        assert_eq!(template.match_segments(&["route"]), Some(RouteParameters::empty()));
        assert!(template.match_segments(&["route", "1", "2"]).is_none());
    }

    #[test]
    fn test_match_wildcard_preserves_empty_segments() {
        let template = RouteTemplate::parse("wild/:p*").unwrap();
        assert_eq!(
            template.match_segments(&["wild", "", "two", "three"]),
            Some(params(&[("p", "/two/three")]))
        );
        assert_eq!(template.match_segments(&["wild"]), Some(RouteParameters::empty()));
    }

    #[test]
    fn test_match_constraint_is_full_match() {
        let template = RouteTemplate::parse("n/:id(\\d+)").unwrap();
        assert!(template.match_segments(&["n", "12"]).is_some());
        assert!(template.match_segments(&["n", "12a"]).is_none());
        let wildcard = RouteTemplate::parse("w/:rest*([a-z]+)").unwrap();
        assert!(wildcard.match_segments(&["w", "a", "b"]).is_some());
        assert!(wildcard.match_segments(&["w", "a", "1"]).is_none());
    }

    #[test]
    fn test_explain_mismatch() {
        let template = RouteTemplate::parse("users/:id(\\d+)").unwrap();
        assert!(template.explain_mismatch(&["users", "1"]).is_none());
        assert_eq!(
            template.explain_mismatch(&["posts", "1"]).unwrap(),
            "segment 'posts' does not match 'users'"
        );
        assert!(template
            .explain_mismatch(&["users", "abc"])
            .unwrap()
            .contains("rejected by the constraint"));
        assert!(template
            .explain_mismatch(&["users"])
            .unwrap()
            .contains("missing value"));
        assert_eq!(
            template.explain_mismatch(&["users", "1", "x"]).unwrap(),
            "1 unexpected trailing segment(s)"
        );
    }

    #[test]
    fn test_format_url() {
        let template = RouteTemplate::parse("a/:req/:opt?/:rest*").unwrap();
        assert_eq!(template.format_url(&params(&[("req", "1")])).unwrap(), "a/1");
        assert_eq!(
            template
                .format_url(&params(&[("req", "1"), ("opt", "2"), ("rest", "x//y")]))
                .unwrap(),
            "a/1/2/x//y"
        );
        assert_eq!(
            template.format_url(&params(&[("req", "1"), ("rest", "")])).unwrap(),
            "a/1/"
        );
    }

    #[test]
    fn test_format_url_errors() {
        let template = RouteTemplate::parse("a/:id(\\d+)").unwrap();
        assert!(template.format_url(&RouteParameters::empty()).is_err());
        assert!(template.format_url(&params(&[("id", "x")])).is_err());
        assert!(template.format_url(&params(&[("id", "1/2")])).is_err());
        assert!(template.format_url(&params(&[("id", "1"), ("extra", "2")])).is_err());
        let wildcard = RouteTemplate::parse("w/:rest*").unwrap();
        assert!(wildcard.format_url(&params(&[("rest", "a?b")])).is_err());
        assert!(wildcard.format_url(&params(&[("rest", "a/../b")])).is_err());
    }

    #[test]
    fn test_with_url_parameter() {
        let template = RouteTemplate::parse("param").unwrap();
        let with = template
            .with_url_parameter(&UrlParameterSpec::required(UrlParameterType::String))
            .unwrap();
        assert_eq!(with.to_string(), "param/:___url_parameter");
        let root = RouteTemplate::parse("").unwrap();
        let with_root = root
            .with_url_parameter(&UrlParameterSpec::optional(UrlParameterType::Int))
            .unwrap();
        assert!(with_root.match_segments(&["12"]).is_some());
        assert!(with_root.match_segments(&["x"]).is_none());
        let wild = RouteTemplate::parse("w/:p*").unwrap();
        assert!(wild
            .with_url_parameter(&UrlParameterSpec::required(UrlParameterType::String))
            .is_err());
    }
}

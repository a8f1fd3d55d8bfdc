//! Parsed navigation locations.
//!
//! A [`Location`] is a `/`-separated path split into segments, plus
//! [`QueryParameters`] and an optional fragment. Parsing rejects `..`
//! segments, so a location can never climb above the application root.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use wayfinder_core::utils::MultiValueDict;
use wayfinder_core::{WayfinderError, WayfinderResult};

/// Characters escaped in query string names and values.
const QUERY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?');

/// Immutable query parameters: each name maps to an ordered list of values.
///
/// # Examples
///
/// ```
/// use wayfinder_router::QueryParameters;
///
/// let params = QueryParameters::parse("tag=a&tag=b&q=hello%20world&flag");
/// assert_eq!(params.values("tag"), vec!["a", "b"]);
/// assert_eq!(params.single("q"), Some("hello world"));
/// assert_eq!(params.single("flag"), Some(""));
/// assert_eq!(params.query_string(), "tag=a&tag=b&q=hello%20world&flag");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    data: MultiValueDict<String, String>,
}

impl QueryParameters {
    /// Returns an empty set of query parameters.
    pub const fn empty() -> Self {
        Self {
            data: MultiValueDict::new(),
        }
    }

    /// Parses a query string (without the leading `?`), percent-decoding
    /// names and values. `+` is kept literally.
    pub fn parse(query: &str) -> Self {
        let data = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode(name), decode(value))
            })
            .collect();
        Self { data }
    }

    /// Builds parameters holding one value per name.
    pub fn simple<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut data = MultiValueDict::new();
        for (name, value) in pairs {
            data.set(name.into(), value.into());
        }
        Self { data }
    }

    /// Builds parameters from names mapped to full value lists.
    pub fn full<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: Into<String>,
    {
        let mut data = MultiValueDict::new();
        for (name, values) in pairs {
            data.set_list(name.into(), values);
        }
        Self { data }
    }

    /// Returns every value for `name`, in order. Empty when absent.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.data
            .get_list(&name.to_string())
            .map(|values| values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns the first value for `name`.
    pub fn single(&self, name: &str) -> Option<&str> {
        self.data.first(&name.to_string()).map(String::as_str)
    }

    /// Returns the parameter names in first-appearance order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a copy with `name` replaced by the given values.
    #[must_use]
    pub fn with(&self, name: impl Into<String>, values: Vec<String>) -> Self {
        let mut data = self.data.clone();
        data.set_list(name.into(), values);
        Self { data }
    }

    /// Returns a copy with `name` removed.
    #[must_use]
    pub fn without(&self, name: &str) -> Self {
        let mut data = self.data.clone();
        data.remove(&name.to_string());
        Self { data }
    }

    /// Serializes back to a query string, percent-encoding names and values.
    /// A value-less flag is written without `=`.
    pub fn query_string(&self) -> String {
        let mut parts = Vec::new();
        for (name, values) in &self.data {
            for value in values {
                if value.is_empty() {
                    parts.push(encode(name));
                } else {
                    parts.push(format!("{}={}", encode(name), encode(value)));
                }
            }
        }
        parts.join("&")
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_ENCODE_SET).to_string()
}

/// A navigable location: path segments, query parameters, and fragment.
///
/// A leading `/` is optional and stripped. A trailing `/` produces a final
/// empty segment, so `users/` and `users` are different locations.
///
/// # Examples
///
/// ```
/// use wayfinder_router::Location;
///
/// let location = Location::parse("/users/42/?tab=posts#top").unwrap();
/// assert_eq!(location.path(), "users/42/");
/// assert_eq!(location.segments(), &["users", "42", ""]);
/// assert_eq!(location.query_parameters().single("tab"), Some("posts"));
/// assert_eq!(location.fragment(), Some("top"));
/// assert_eq!(location.to_string(), "users/42/?tab=posts#top");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    segments: Vec<String>,
    query: QueryParameters,
    fragment: Option<String>,
}

impl Location {
    /// Parses `path[?query][#fragment]`.
    pub fn parse(location: &str) -> WayfinderResult<Self> {
        let (rest, fragment) = match location.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (location, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, QueryParameters::parse(query)),
            None => (rest, QueryParameters::empty()),
        };
        let mut parsed = Self::new(path, query)?;
        parsed.fragment = fragment;
        Ok(parsed)
    }

    /// Builds a location from a bare path and query parameters.
    pub fn new(path: &str, query: QueryParameters) -> WayfinderResult<Self> {
        if path.contains('?') || path.contains('#') {
            return Err(WayfinderError::InvalidLocation(format!(
                "path '{path}' must not contain a query string or fragment"
            )));
        }
        let path = path.strip_prefix('/').unwrap_or(path);
        let segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if segments.iter().any(|segment| segment == "..") {
            return Err(WayfinderError::InvalidLocation(format!(
                "relative path '{path}' cannot contain '..' segments"
            )));
        }
        if segments.len() > 1 && segments[0].is_empty() {
            return Err(WayfinderError::InvalidLocation(format!(
                "path '/{path}' starts with an empty segment"
            )));
        }
        Ok(Self {
            segments,
            query,
            fragment: None,
        })
    }

    /// Builds a location from already split segments.
    pub fn from_segments<I, S>(segments: I) -> WayfinderResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("/");
        Self::new(&joined, QueryParameters::empty())
    }

    /// The root location.
    pub fn root() -> Self {
        Self {
            segments: vec![String::new()],
            query: QueryParameters::empty(),
            fragment: None,
        }
    }

    /// Returns the path segments. The root location has a single empty segment.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the segments routes are matched against: empty for the root.
    pub fn route_segments(&self) -> Vec<&str> {
        if self.is_root() {
            Vec::new()
        } else {
            self.segments.iter().map(String::as_str).collect()
        }
    }

    /// Returns `true` for the empty path.
    pub fn is_root(&self) -> bool {
        self.segments.len() == 1 && self.segments[0].is_empty()
    }

    /// Returns the path without a leading slash, query, or fragment.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// Returns the first path segment.
    pub fn first_segment(&self) -> &str {
        self.segments.first().map_or("", String::as_str)
    }

    /// Returns the location made of every segment after the first, if any.
    pub fn sub_location(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[1..].to_vec(),
            query: self.query.clone(),
            fragment: self.fragment.clone(),
        })
    }

    /// Returns the query parameters.
    pub const fn query_parameters(&self) -> &QueryParameters {
        &self.query
    }

    /// Returns the fragment, without `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Returns a copy carrying different query parameters.
    #[must_use]
    pub fn with_query_parameters(&self, query: QueryParameters) -> Self {
        Self {
            query,
            ..self.clone()
        }
    }

    /// Returns a copy carrying a different fragment.
    #[must_use]
    pub fn with_fragment(&self, fragment: Option<String>) -> Self {
        Self {
            fragment,
            ..self.clone()
        }
    }

    /// Returns `path?query`, omitting `?` when there are no parameters.
    pub fn path_with_query_parameters(&self) -> String {
        let path = self.path();
        if self.query.is_empty() {
            path
        } else {
            format!("{path}?{}", self.query.query_string())
        }
    }

    /// Returns a copy with a trailing slash added, or removed if present.
    /// The root location has no toggled form.
    pub fn toggle_trailing_slash(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let mut segments = self.segments.clone();
        if segments.last().is_some_and(String::is_empty) {
            segments.pop();
        } else {
            segments.push(String::new());
        }
        Some(Self {
            segments,
            ..self.clone()
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path_with_query_parameters())?;
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Location {
    type Err = WayfinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

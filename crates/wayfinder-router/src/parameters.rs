//! Route parameters and typed URL parameters.
//!
//! [`RouteParameters`] holds the raw strings extracted by the matcher.
//! Views that accept a single typed parameter declare a [`UrlParameterSpec`]
//! at registration and receive a converted [`UrlParameter`] before they are
//! entered.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use wayfinder_core::{WayfinderError, WayfinderResult};

/// Immutable set of named route parameter values.
///
/// # Examples
///
/// ```
/// use wayfinder_router::RouteParameters;
///
/// let params = RouteParameters::new([("id", "42"), ("path", "docs//intro")]).unwrap();
/// assert_eq!(params.get_int("id").unwrap(), Some(42));
/// assert_eq!(params.get_wildcard("path"), vec!["docs", "", "intro"]);
/// assert!(RouteParameters::new([("id", "1"), ("id", "2")]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParameters {
    values: BTreeMap<String, String>,
}

impl RouteParameters {
    /// Name under which a view's typed URL parameter travels.
    pub const URL_PARAMETER_NAME: &'static str = "___url_parameter";

    /// Returns an empty parameter set.
    pub const fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Builds parameters from pairs. A repeated name is an error.
    pub fn new<I, K, V>(pairs: I) -> WayfinderResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = BTreeMap::new();
        for (name, value) in pairs {
            let name = name.into();
            if values.contains_key(&name) {
                return Err(WayfinderError::InvalidParameter(format!(
                    "parameter '{name}' is defined more than once"
                )));
            }
            values.insert(name, value.into());
        }
        Ok(Self { values })
    }

    /// Builds the parameters carrying a view's typed URL parameter.
    pub fn for_url_parameter(parameter: &UrlParameter) -> Self {
        let mut values = BTreeMap::new();
        values.insert(Self::URL_PARAMETER_NAME.to_string(), parameter.to_string());
        Self { values }
    }

    /// Returns the raw value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the value for `name` as an `i32`.
    pub fn get_int(&self, name: &str) -> WayfinderResult<Option<i32>> {
        self.get(name).map(|raw| parse_number(name, raw)).transpose()
    }

    /// Returns the value for `name` as an `i64`.
    pub fn get_long(&self, name: &str) -> WayfinderResult<Option<i64>> {
        self.get(name).map(|raw| parse_number(name, raw)).transpose()
    }

    /// Returns a wildcard value split on `/`, keeping empty pieces.
    /// An absent parameter gives an empty list.
    pub fn get_wildcard(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|raw| raw.split('/').map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Returns the parameter names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> WayfinderResult<T>
where
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e| {
        WayfinderError::InvalidParameter(format!(
            "parameter '{name}' value '{raw}' is not a valid number: {e}"
        ))
    })
}

impl fmt::Display for RouteParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

/// The value type a view's URL parameter is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UrlParameterType {
    /// Any text.
    String,
    /// A 32-bit signed integer.
    Int,
    /// A 64-bit signed integer.
    Long,
    /// `true` or `false`, case-insensitive.
    Bool,
}

impl UrlParameterType {
    /// Regex restricting which segments can be converted to this type.
    pub const fn constraint(self) -> Option<&'static str> {
        match self {
            Self::String => None,
            Self::Int => Some("[+-]?[0-8]?[0-9]{1,9}"),
            Self::Long => Some("[+-]?[0-8]?[0-9]{1,18}"),
            Self::Bool => Some("(?i:true|false)"),
        }
    }
}

/// How many segments a URL parameter takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterArity {
    /// Exactly one segment.
    Required,
    /// Zero or one segment.
    Optional,
    /// Every remaining segment.
    Wildcard,
}

/// The URL parameter contract a view declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UrlParameterSpec {
    /// Target type.
    pub kind: UrlParameterType,
    /// Number of segments consumed.
    pub arity: ParameterArity,
}

impl UrlParameterSpec {
    /// A required parameter of `kind`.
    pub const fn required(kind: UrlParameterType) -> Self {
        Self {
            kind,
            arity: ParameterArity::Required,
        }
    }

    /// An optional parameter of `kind`.
    pub const fn optional(kind: UrlParameterType) -> Self {
        Self {
            kind,
            arity: ParameterArity::Optional,
        }
    }

    /// A wildcard parameter. Only text wildcards resolve.
    pub const fn wildcard(kind: UrlParameterType) -> Self {
        Self {
            kind,
            arity: ParameterArity::Wildcard,
        }
    }

    /// The template segment appended to a route path for this contract.
    pub fn template_segment(&self) -> String {
        let modifier = match self.arity {
            ParameterArity::Required => "",
            ParameterArity::Optional => "?",
            ParameterArity::Wildcard => "*",
        };
        match self.kind.constraint() {
            Some(regex) if self.arity != ParameterArity::Wildcard => {
                format!(":{}{modifier}({regex})", RouteParameters::URL_PARAMETER_NAME)
            }
            _ => format!(":{}{modifier}", RouteParameters::URL_PARAMETER_NAME),
        }
    }

    /// Converts the extracted raw value into a typed parameter.
    ///
    /// `None` means the optional parameter was absent. Conversion failures
    /// and non-text wildcards are not-found conditions.
    pub fn convert(&self, raw: Option<&str>) -> WayfinderResult<Option<UrlParameter>> {
        if self.arity == ParameterArity::Wildcard && self.kind != UrlParameterType::String {
            return Err(WayfinderError::NotFound(format!(
                "wildcard parameters must be text, not {:?}",
                self.kind
            )));
        }
        let raw = match (raw, self.arity) {
            (Some(raw), _) => raw,
            (None, ParameterArity::Wildcard) => "",
            (None, ParameterArity::Optional) => return Ok(None),
            (None, ParameterArity::Required) => {
                return Err(WayfinderError::NotFound(
                    "required URL parameter is missing".to_string(),
                ))
            }
        };
        let invalid = |e: &dyn fmt::Display| {
            WayfinderError::NotFound(format!(
                "URL parameter '{raw}' cannot be converted to {:?}: {e}",
                self.kind
            ))
        };
        let value = match self.kind {
            UrlParameterType::String => UrlParameter::Text(raw.to_string()),
            UrlParameterType::Int => UrlParameter::Int(raw.parse().map_err(|e| invalid(&e))?),
            UrlParameterType::Long => UrlParameter::Long(raw.parse().map_err(|e| invalid(&e))?),
            UrlParameterType::Bool => {
                UrlParameter::Bool(raw.to_lowercase().parse().map_err(|e| invalid(&e))?)
            }
        };
        Ok(Some(value))
    }
}

/// A converted URL parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlParameter {
    /// Text, including joined wildcard values.
    Text(String),
    /// A 32-bit integer.
    Int(i32),
    /// A 64-bit integer.
    Long(i64),
    /// A boolean.
    Bool(bool),
}

impl UrlParameter {
    /// Returns the text value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for UrlParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
            Self::Long(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for UrlParameter {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for UrlParameter {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for UrlParameter {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for UrlParameter {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<bool> for UrlParameter {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

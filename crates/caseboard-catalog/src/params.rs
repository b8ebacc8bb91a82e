//! Parameter values for template rendering.

use std::collections::BTreeMap;
use std::fmt;

/// A single template parameter value. Substituted into the query text via
/// its display form, with no quoting.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Float(x) => write!(f, "{x:?}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<&String> for ParamValue {
    fn from(s: &String) -> Self {
        ParamValue::Str(s.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Int(n)
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

/// Parameter mapping passed to the renderer. Keyed by declared parameter
/// name; ordering is irrelevant to validation but kept sorted for
/// deterministic error output.
pub type Params = BTreeMap<String, ParamValue>;

/// Build a [`Params`] map from `name = value` pairs.
///
/// ```
/// use caseboard_catalog::params;
///
/// let p = params! { version = "v1", pos_x = 10.5 };
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => { $crate::Params::new() };
    ($($key:ident = $value:expr),+ $(,)?) => {{
        let mut map = $crate::Params::new();
        $(
            map.insert(
                stringify!($key).to_string(),
                $crate::ParamValue::from($value),
            );
        )+
        map
    }};
}

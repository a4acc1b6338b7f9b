//! Format descriptors
//!
//! A format token inside a placeholder is either a bare name (`uppercase`) or
//! a name followed by options (`currency(code: EUR; compact: true)`). Parsing
//! turns the token into a [`FormatDescriptor`] that formatters and the
//! missing-format handler receive.

use std::fmt;

use serde_json::Value;

use crate::options::Options;

/// Name of the synthetic descriptor used to coerce a non-text result to text
pub const FALLBACK_FORMAT: &str = "fallback";

/// A literal option value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOptionValue {
    Bool(bool),
    Text(String),
}

impl FormatOptionValue {
    fn from_raw(raw: &str) -> Self {
        match raw {
            "true" => FormatOptionValue::Bool(true),
            "false" => FormatOptionValue::Bool(false),
            _ => FormatOptionValue::Text(raw.to_string()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormatOptionValue::Bool(value) => Some(*value),
            FormatOptionValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormatOptionValue::Text(value) => Some(value),
            FormatOptionValue::Bool(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            FormatOptionValue::Bool(value) => Value::Bool(*value),
            FormatOptionValue::Text(value) => Value::String(value.clone()),
        }
    }
}

impl fmt::Display for FormatOptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatOptionValue::Bool(value) => write!(f, "{}", value),
            FormatOptionValue::Text(value) => write!(f, "{}", value),
        }
    }
}

/// One step of a format chain: a formatter name and its ordered options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub name: String,
    pub options: Vec<(String, FormatOptionValue)>,
}

impl FormatDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        FormatDescriptor {
            name: name.into(),
            options: Vec::new(),
        }
    }

    /// The descriptor handed to the missing-format handler for final coercion
    pub fn fallback() -> Self {
        FormatDescriptor::new(FALLBACK_FORMAT)
    }

    pub fn option(&self, key: &str) -> Option<&FormatOptionValue> {
        self.options
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

/// Parse a raw format token such as `name` or `name(opt:val;...)`.
///
/// The options body is the text between the first `(` and the last `)`. It is
/// split on the options separator; each piece is split on the first option
/// value separator only, so values may contain further separators. `true` and
/// `false` become booleans. Repeated keys keep their first value.
pub fn parse_format(token: &str, options: &Options) -> FormatDescriptor {
    let token = token.trim();
    let Some(open) = token.find('(') else {
        return FormatDescriptor::new(token);
    };

    let name = token[..open].trim();
    let rest = &token[open + 1..];
    let body = match rest.rfind(')') {
        Some(close) => &rest[..close],
        None => rest,
    }
    .trim();

    let mut descriptor = FormatDescriptor::new(name);
    for piece in body
        .split(options.options_separator())
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
    {
        let (key, raw_value) = match piece.split_once(options.option_value_separator()) {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (piece, ""),
        };
        if descriptor.option(key).is_some() {
            continue;
        }
        descriptor
            .options
            .push((key.to_string(), FormatOptionValue::from_raw(raw_value)));
    }
    descriptor
}

/// Render a value as display text. Strings are used verbatim.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

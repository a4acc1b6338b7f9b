//! Built-in formatters
//!
//! Register them on an `Options` value with [`with_builtin_formatters`]:
//!
//! ```ignore
//! let options = with_builtin_formatters(Options::base());
//! // "Hello, {{name, default(value: guest), capitalize}}"
//! ```

use serde_json::Value;

use crate::format::{FormatDescriptor, stringify};
use crate::options::{FormatResult, Options};

pub fn uppercase(
    value: Option<&Value>,
    _descriptor: &FormatDescriptor,
    _locale: &str,
    _options: &Options,
) -> FormatResult {
    Ok(value.map(|value| Value::String(stringify(value).to_uppercase())))
}

pub fn lowercase(
    value: Option<&Value>,
    _descriptor: &FormatDescriptor,
    _locale: &str,
    _options: &Options,
) -> FormatResult {
    Ok(value.map(|value| Value::String(stringify(value).to_lowercase())))
}

/// Upper-case the first character only
pub fn capitalize(
    value: Option<&Value>,
    _descriptor: &FormatDescriptor,
    _locale: &str,
    _options: &Options,
) -> FormatResult {
    Ok(value.map(|value| {
        let text = stringify(value);
        let mut chars = text.chars();
        let capitalized = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        Value::String(capitalized)
    }))
}

/// Supply the `value` option when nothing came before in the chain
pub fn default_value(
    value: Option<&Value>,
    descriptor: &FormatDescriptor,
    _locale: &str,
    _options: &Options,
) -> FormatResult {
    match value {
        Some(value) => Ok(Some(value.clone())),
        None => Ok(descriptor.option("value").map(|option| option.to_value())),
    }
}

/// Register `uppercase`, `lowercase`, `capitalize` and `default`
pub fn with_builtin_formatters(options: Options) -> Options {
    options
        .with_formatter("uppercase", uppercase)
        .with_formatter("lowercase", lowercase)
        .with_formatter("capitalize", capitalize)
        .with_formatter("default", default_value)
}

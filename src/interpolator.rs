//! Interpolation of `{{...}}` placeholders
//!
//! Each placeholder body is `path[, format, format...]`. The path is walked
//! through the variable mapping with the key separator, the resulting value
//! (or nothing) is piped through the format chain, and the text replaces the
//! placeholder. Plain placeholders are escaped; dash-prefixed ones are not.

use serde_json::Value;
#[cfg(debug_assertions)]
use tracing::warn;

use crate::error::{InterpolationError, TranslationError, TranslationResult};
use crate::format::{FormatDescriptor, parse_format, stringify};
use crate::matchers::{InterpolationKind, Matchers};
use crate::options::{Options, Variables};

/// The translation lookup a template belongs to.
///
/// Handlers receive the namespace and key of the enclosing lookup; the
/// resolvers never derive them from the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupContext<'a> {
    pub locale: &'a str,
    pub namespace: &'a str,
    pub key: &'a str,
}

impl<'a> LookupContext<'a> {
    pub fn new(locale: &'a str) -> Self {
        LookupContext {
            locale,
            namespace: "",
            key: "",
        }
    }

    pub fn with_key(mut self, namespace: &'a str, key: &'a str) -> Self {
        self.namespace = namespace;
        self.key = key;
        self
    }
}

/// Replace every interpolation placeholder in `template`.
///
/// Fails with [`TranslationError::Interpolation`] when a placeholder yields
/// no text and no `translationFailedHandler` is configured.
pub fn interpolate(
    locale: &str,
    template: &str,
    variables: &Variables,
    options: &Options,
) -> TranslationResult<String> {
    interpolate_with_context(&LookupContext::new(locale), template, variables, options)
}

/// [`interpolate`] on behalf of a known (namespace, key) lookup
pub fn interpolate_with_context(
    context: &LookupContext<'_>,
    template: &str,
    variables: &Variables,
    options: &Options,
) -> TranslationResult<String> {
    let matchers = Matchers::compile(options)?;
    let mut output = String::with_capacity(template.len());
    let mut last = 0;

    for (whole, body, kind) in matchers.interpolations(template) {
        output.push_str(&template[last..whole.start()]);

        let (path, formats) = split_body(body, options);
        let value = lookup_variable(path, variables, options.key_separator());
        let replacement = match apply_formats(value, &formats, context.locale, options) {
            Some(text) => match kind {
                InterpolationKind::Escaped => options.escape(&text),
                InterpolationKind::Unescaped => text,
            },
            None => {
                let error = TranslationError::from(InterpolationError {
                    matched: whole.as_str().to_string(),
                    variable: path.to_string(),
                    locale: context.locale.to_string(),
                });
                match &options.translation_failed_handler {
                    Some(handler) => handler(
                        context.locale,
                        context.namespace,
                        context.key,
                        variables,
                        options,
                        &error,
                    ),
                    None => return Err(error),
                }
            }
        };

        output.push_str(&replacement);
        last = whole.end();
    }

    output.push_str(&template[last..]);
    Ok(output)
}

/// Split a placeholder body into the trimmed variable path and its formats
fn split_body<'b>(body: &'b str, options: &Options) -> (&'b str, Vec<FormatDescriptor>) {
    let mut segments = body.split(options.interpolation_separator());
    let path = segments.next().unwrap_or_default().trim();
    let formats = segments
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| parse_format(segment, options))
        .collect();
    (path, formats)
}

/// Walk `path` through the variable mapping.
///
/// Every segment must index into an object. An empty path, a missing
/// segment, a non-object along the way, or a `null` leaf all give `None`.
pub fn lookup_variable(path: &str, variables: &Variables, key_separator: &str) -> Option<Value> {
    if path.is_empty() {
        return None;
    }
    let mut segments = path.split(key_separator);
    let mut current = variables.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current.clone())
    }
}

/// Run a format chain over `value`.
///
/// Each descriptor is looked up in the formatter registry, falling back to
/// the missing-format handler, or skipped when neither exists. A formatter
/// returning nothing does not stop the chain. A formatter error is discarded
/// and the previous value carried forward. A non-text result is coerced
/// through the missing-format handler with the `fallback` descriptor, or
/// stringified directly.
pub fn apply_formats(
    value: Option<Value>,
    formats: &[FormatDescriptor],
    locale: &str,
    options: &Options,
) -> Option<String> {
    let mut current = value.filter(|value| !value.is_null());

    for descriptor in formats {
        let Some(formatter) = options
            .formatter(&descriptor.name)
            .or(options.missing_format_handler.as_ref())
        else {
            continue;
        };

        match formatter(current.as_ref(), descriptor, locale, options) {
            Ok(next) => current = next.filter(|value| !value.is_null()),
            Err(_error) => {
                #[cfg(debug_assertions)]
                warn!(
                    format = %descriptor.name,
                    locale,
                    "Formatter failed, keeping previous value: {}",
                    _error
                );
            }
        }
    }

    match current? {
        Value::String(text) => Some(text),
        other => {
            let coerced = options
                .missing_format_handler
                .as_ref()
                .and_then(|handler| {
                    handler(Some(&other), &FormatDescriptor::fallback(), locale, options).ok()
                })
                .flatten()
                .filter(|value| !value.is_null());
            Some(stringify(coerced.as_ref().unwrap_or(&other)))
        }
    }
}

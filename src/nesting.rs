//! Nesting of `$t(key)` placeholders
//!
//! A nesting placeholder names another key, optionally followed by the
//! nesting separator and a JSON object of extra variables:
//! `$t(key, {"count": 2})`. The regex locates the key; the variables block
//! is then read with a JSON stream parser so parentheses inside JSON strings
//! do not end the placeholder early. Keys get no such treatment: the key
//! ends at the first nesting suffix, so `$t(a (b), {"x": 1})` looks up
//! `a (b` and leaves the rest of the text in place.
//!
//! A call is all-or-nothing: if any nested key fails, the whole template
//! fails. Nested `translate` calls are counted per thread and refused past
//! `maxNestingDepth`, which turns key cycles into a [`NestingError`].

use std::cell::Cell;

use serde::de::Error as _;
use serde_json::{Deserializer, Value};

use crate::error::{NestingError, NestingFailure, TranslationError, TranslationResult};
use crate::interpolator::LookupContext;
use crate::matchers::{Matchers, NESTING_BLOCK_GROUP};
use crate::options::{Options, Variables};

thread_local! {
    static NESTING_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Holds one level of nesting depth for as long as it lives
struct DepthGuard;

impl DepthGuard {
    fn enter(limit: usize) -> Option<Self> {
        NESTING_DEPTH.with(|depth| {
            if depth.get() >= limit {
                None
            } else {
                depth.set(depth.get() + 1);
                Some(DepthGuard)
            }
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        NESTING_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Replace every nesting placeholder in `template` with the result of
/// `translate(key, locale, variables, options)`.
///
/// `translate` returns `Ok(None)` when the key cannot be resolved, which
/// fails the whole call with [`TranslationError::Nesting`].
pub fn nest<F>(
    locale: &str,
    template: &str,
    translate: F,
    variables: &Variables,
    options: &Options,
) -> TranslationResult<String>
where
    F: Fn(&str, &str, &Variables, &Options) -> TranslationResult<Option<String>>,
{
    nest_with_context(
        &LookupContext::new(locale),
        template,
        translate,
        variables,
        options,
    )
}

/// [`nest`] on behalf of a known (namespace, key) lookup.
///
/// Recoverable failures go to the `translationFailedHandler` when one is
/// configured, and its text stands in for the whole template.
pub fn nest_with_context<F>(
    context: &LookupContext<'_>,
    template: &str,
    translate: F,
    variables: &Variables,
    options: &Options,
) -> TranslationResult<String>
where
    F: Fn(&str, &str, &Variables, &Options) -> TranslationResult<Option<String>>,
{
    match resolve(context.locale, template, &translate, variables, options) {
        Err(error) if error.is_recoverable() => match &options.translation_failed_handler {
            Some(handler) => Ok(handler(
                context.locale,
                context.namespace,
                context.key,
                variables,
                options,
                &error,
            )),
            None => Err(error),
        },
        other => other,
    }
}

fn resolve<F>(
    locale: &str,
    template: &str,
    translate: &F,
    variables: &Variables,
    options: &Options,
) -> TranslationResult<String>
where
    F: Fn(&str, &str, &Variables, &Options) -> TranslationResult<Option<String>>,
{
    let matchers = Matchers::compile(options)?;
    let mut output = String::with_capacity(template.len());
    let mut last = 0;
    let mut position = 0;

    while position <= template.len() {
        let Some(caps) = matchers.nesting.captures_at(template, position) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let key = caps.name("key").map_or("", |key| key.as_str()).trim();

        let (end, nested) = match caps.get(NESTING_BLOCK_GROUP) {
            None => (whole.end(), None),
            Some(block) => {
                let start = block.start() + options.nesting_separator().len();
                let (end, parsed) = read_variables(template, whole, start, options)?;
                (end, Some(parsed))
            }
        };
        let matched = &template[whole.start()..end];

        let failure = |reason| NestingError {
            matched: matched.to_string(),
            key: key.to_string(),
            locale: locale.to_string(),
            reason,
        };

        if key.is_empty() {
            return Err(failure(NestingFailure::MissingKey).into());
        }

        // Scoped to this match only: a fresh copy every time.
        let scoped;
        let call_variables = match nested {
            Some(parsed) => {
                let mut merged = variables.clone();
                merged.extend(parsed);
                scoped = merged;
                &scoped
            }
            None => variables,
        };

        let limit = options.max_nesting_depth();
        let translated = {
            let Some(_guard) = DepthGuard::enter(limit) else {
                return Err(failure(NestingFailure::DepthExceeded { limit }).into());
            };
            translate(key, locale, call_variables, options)?
        };
        let Some(translated) = translated else {
            return Err(failure(NestingFailure::KeyNotFound).into());
        };

        output.push_str(&template[last..whole.start()]);
        output.push_str(&translated);
        last = end;
        position = if end > whole.start() {
            end
        } else {
            next_char_boundary(template, end)
        };
    }

    output.push_str(&template[last..]);
    Ok(output)
}

/// Read the JSON object that starts at `from` and the suffix after it.
///
/// Returns the end of the whole placeholder and the parsed object.
fn read_variables(
    template: &str,
    whole: regex::Match<'_>,
    from: usize,
    options: &Options,
) -> TranslationResult<(usize, Variables)> {
    let rest = &template[from..];
    let json_start = from + (rest.len() - rest.trim_start().len());

    let mut stream = Deserializer::from_str(&template[json_start..]).into_iter::<Value>();
    let invalid = |source: serde_json::Error| TranslationError::NestingVariables {
        matched: whole.as_str().to_string(),
        source,
    };

    // Anything but an object may still be a second block: that is the
    // structural error, not a parse error.
    let unparsed = |source: serde_json::Error| {
        if has_second_block(&template[json_start..], options) {
            TranslationError::MalformedNesting {
                matched: whole.as_str().to_string(),
            }
        } else {
            invalid(source)
        }
    };

    let parsed = match stream.next() {
        Some(Ok(Value::Object(map))) => map,
        Some(Ok(_)) => {
            return Err(unparsed(serde_json::Error::custom(
                "nesting variables must be a JSON object",
            )));
        }
        Some(Err(error)) => return Err(unparsed(error)),
        None => {
            return Err(unparsed(serde_json::Error::custom(
                "expected a JSON object after the nesting separator",
            )));
        }
    };

    let after_json = json_start + stream.byte_offset();
    let tail = &template[after_json..];
    let tail_start = after_json + (tail.len() - tail.trim_start().len());
    let tail = &template[tail_start..];

    if tail.starts_with(options.nesting_separator()) {
        let end = tail
            .find(options.nesting_suffix())
            .map_or(template.len(), |offset| {
                tail_start + offset + options.nesting_suffix().len()
            });
        return Err(TranslationError::MalformedNesting {
            matched: template[whole.start()..end].to_string(),
        });
    }
    if tail.starts_with(options.nesting_suffix()) {
        return Ok((tail_start + options.nesting_suffix().len(), parsed));
    }
    Err(invalid(serde_json::Error::custom(
        "unexpected text after nesting variables",
    )))
}

/// Whether the nesting separator shows up outside JSON strings and brackets
/// before the nesting suffix does.
fn has_second_block(text: &str, options: &Options) -> bool {
    let separator = options.nesting_separator();
    let suffix = options.nesting_suffix();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if depth == 0 {
            let rest = &text[index..];
            if rest.starts_with(suffix) {
                return false;
            }
            if rest.starts_with(separator) {
                return true;
            }
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    text[index..]
        .chars()
        .next()
        .map_or(text.len() + 1, |ch| index + ch.len_utf8())
}

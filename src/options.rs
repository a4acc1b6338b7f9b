//! Resolution options
//!
//! `Options` is an immutable value describing delimiters, separators, the
//! formatter registry and the optional handlers. Every field is optional so
//! that call-site options can be layered over library defaults with
//! [`Options::merge`]; the accessors fall back to the base literals on their
//! own, so a partially filled `Options` is usable as-is.
//!
//! Equality and hashing are structural. Function-typed fields compare by
//! identity (`Arc::ptr_eq`), which lets callers reuse or memoize options by
//! equality.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FormatError, TranslationError};
use crate::escape::escape;
use crate::format::FormatDescriptor;

/// Variable mapping supplied by the caller
pub type Variables = serde_json::Map<String, Value>;

/// What a formatter returns: a new value, nothing, or an error to be swallowed
pub type FormatResult = Result<Option<Value>, FormatError>;

/// `formatter(value, descriptor, locale, options)`
pub type ValueFormatter =
    Arc<dyn Fn(Option<&Value>, &FormatDescriptor, &str, &Options) -> FormatResult + Send + Sync>;

/// `missingKeyHandler(locale, namespace, key, variables, options)`
pub type MissingKeyHandler =
    Arc<dyn Fn(&str, &str, &str, &Variables, &Options) -> Option<String> + Send + Sync>;

/// `translationFailedHandler(locale, namespace, key, variables, options, error)`
pub type TranslationFailedHandler = Arc<
    dyn Fn(&str, &str, &str, &Variables, &Options, &TranslationError) -> String + Send + Sync,
>;

/// `escapeHandler(text)`
pub type EscapeHandler = Arc<dyn Fn(&str) -> String + Send + Sync>;

pub const DEFAULT_NAMESPACE_SEPARATOR: &str = ":";
pub const DEFAULT_CONTEXT_SEPARATOR: &str = "_";
pub const DEFAULT_PLURAL_SEPARATOR: &str = "_";
pub const DEFAULT_KEY_SEPARATOR: &str = ".";
pub const DEFAULT_PLURAL_SUFFIX: &str = "plural";
pub const DEFAULT_INTERPOLATION_PREFIX: &str = "{{";
pub const DEFAULT_INTERPOLATION_SUFFIX: &str = "}}";
pub const DEFAULT_INTERPOLATION_SEPARATOR: &str = ",";
pub const DEFAULT_NESTING_PREFIX: &str = "$t(";
pub const DEFAULT_NESTING_SUFFIX: &str = ")";
pub const DEFAULT_NESTING_SEPARATOR: &str = ",";
pub const DEFAULT_OPTIONS_SEPARATOR: &str = ";";
pub const DEFAULT_OPTION_VALUE_SEPARATOR: &str = ":";
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

/// Order in which a template passes through the two resolvers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pipeline {
    /// Resolve `$t(...)` first, then `{{...}}` over the combined result
    #[default]
    NestThenInterpolate,
    InterpolateThenNest,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub namespace_separator: Option<String>,
    pub context_separator: Option<String>,
    pub plural_separator: Option<String>,
    pub key_separator: Option<String>,
    pub plural_suffix: Option<String>,
    pub interpolation_prefix: Option<String>,
    pub interpolation_suffix: Option<String>,
    pub interpolation_separator: Option<String>,
    pub nesting_prefix: Option<String>,
    pub nesting_suffix: Option<String>,
    pub nesting_separator: Option<String>,
    pub options_separator: Option<String>,
    pub option_value_separator: Option<String>,
    pub pipeline: Option<Pipeline>,
    pub max_nesting_depth: Option<usize>,

    /// Formatter registry, keyed by format name
    #[serde(skip)]
    pub formats: BTreeMap<String, ValueFormatter>,
    #[serde(skip)]
    pub missing_format_handler: Option<ValueFormatter>,
    #[serde(skip)]
    pub missing_key_handler: Option<MissingKeyHandler>,
    #[serde(skip)]
    pub translation_failed_handler: Option<TranslationFailedHandler>,
    #[serde(skip)]
    pub escape_handler: Option<EscapeHandler>,
}

fn pick<T: Clone>(over: &Option<T>, base: &Option<T>) -> Option<T> {
    over.as_ref().or(base.as_ref()).cloned()
}

/// Separators must never be empty: an empty override keeps the base value
fn pick_separator(over: &Option<String>, base: &Option<String>) -> Option<String> {
    let over = over.as_ref().filter(|separator| !separator.is_empty());
    over.or(base.as_ref()).cloned()
}

fn separator<'a>(value: &'a Option<String>, default: &'static str) -> &'a str {
    value
        .as_deref()
        .filter(|separator| !separator.is_empty())
        .unwrap_or(default)
}

impl Options {
    /// Empty options: every field falls back to its default
    pub fn new() -> Self {
        Self::default()
    }

    /// The library defaults with every delimiter filled in
    pub fn base() -> Self {
        Options {
            namespace_separator: Some(DEFAULT_NAMESPACE_SEPARATOR.to_string()),
            context_separator: Some(DEFAULT_CONTEXT_SEPARATOR.to_string()),
            plural_separator: Some(DEFAULT_PLURAL_SEPARATOR.to_string()),
            key_separator: Some(DEFAULT_KEY_SEPARATOR.to_string()),
            plural_suffix: Some(DEFAULT_PLURAL_SUFFIX.to_string()),
            interpolation_prefix: Some(DEFAULT_INTERPOLATION_PREFIX.to_string()),
            interpolation_suffix: Some(DEFAULT_INTERPOLATION_SUFFIX.to_string()),
            interpolation_separator: Some(DEFAULT_INTERPOLATION_SEPARATOR.to_string()),
            nesting_prefix: Some(DEFAULT_NESTING_PREFIX.to_string()),
            nesting_suffix: Some(DEFAULT_NESTING_SUFFIX.to_string()),
            nesting_separator: Some(DEFAULT_NESTING_SEPARATOR.to_string()),
            options_separator: Some(DEFAULT_OPTIONS_SEPARATOR.to_string()),
            option_value_separator: Some(DEFAULT_OPTION_VALUE_SEPARATOR.to_string()),
            pipeline: Some(Pipeline::default()),
            max_nesting_depth: Some(DEFAULT_MAX_NESTING_DEPTH),
            ..Default::default()
        }
    }

    /// Layer `other` over `self`, field by field.
    ///
    /// A field set in `other` wins; an absent one keeps `self`'s value, and
    /// so does an empty separator.
    /// Formatter registries are united by name, `other` winning on clashes.
    pub fn merge(&self, other: &Options) -> Options {
        let mut formats = self.formats.clone();
        for (name, formatter) in &other.formats {
            formats.insert(name.clone(), formatter.clone());
        }

        Options {
            namespace_separator: pick_separator(
                &other.namespace_separator,
                &self.namespace_separator,
            ),
            context_separator: pick_separator(&other.context_separator, &self.context_separator),
            plural_separator: pick_separator(&other.plural_separator, &self.plural_separator),
            key_separator: pick_separator(&other.key_separator, &self.key_separator),
            plural_suffix: pick(&other.plural_suffix, &self.plural_suffix),
            interpolation_prefix: pick(&other.interpolation_prefix, &self.interpolation_prefix),
            interpolation_suffix: pick(&other.interpolation_suffix, &self.interpolation_suffix),
            interpolation_separator: pick_separator(
                &other.interpolation_separator,
                &self.interpolation_separator,
            ),
            nesting_prefix: pick(&other.nesting_prefix, &self.nesting_prefix),
            nesting_suffix: pick(&other.nesting_suffix, &self.nesting_suffix),
            nesting_separator: pick_separator(&other.nesting_separator, &self.nesting_separator),
            options_separator: pick_separator(&other.options_separator, &self.options_separator),
            option_value_separator: pick_separator(
                &other.option_value_separator,
                &self.option_value_separator,
            ),
            pipeline: pick(&other.pipeline, &self.pipeline),
            max_nesting_depth: pick(&other.max_nesting_depth, &self.max_nesting_depth),
            formats,
            missing_format_handler: pick(
                &other.missing_format_handler,
                &self.missing_format_handler,
            ),
            missing_key_handler: pick(&other.missing_key_handler, &self.missing_key_handler),
            translation_failed_handler: pick(
                &other.translation_failed_handler,
                &self.translation_failed_handler,
            ),
            escape_handler: pick(&other.escape_handler, &self.escape_handler),
        }
    }

    /// `self` layered over [`Options::base`]
    pub fn with_defaults(self) -> Self {
        Options::base().merge(&self)
    }

    pub fn with_formatter<F>(mut self, name: impl Into<String>, formatter: F) -> Self
    where
        F: Fn(Option<&Value>, &FormatDescriptor, &str, &Options) -> FormatResult
            + Send
            + Sync
            + 'static,
    {
        self.formats.insert(name.into(), Arc::new(formatter));
        self
    }

    pub fn with_missing_format_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Option<&Value>, &FormatDescriptor, &str, &Options) -> FormatResult
            + Send
            + Sync
            + 'static,
    {
        self.missing_format_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_missing_key_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &str, &str, &Variables, &Options) -> Option<String> + Send + Sync + 'static,
    {
        self.missing_key_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_translation_failed_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &str, &str, &Variables, &Options, &TranslationError) -> String
            + Send
            + Sync
            + 'static,
    {
        self.translation_failed_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_escape_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.escape_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = Some(depth);
        self
    }

    pub fn namespace_separator(&self) -> &str {
        separator(&self.namespace_separator, DEFAULT_NAMESPACE_SEPARATOR)
    }

    pub fn context_separator(&self) -> &str {
        separator(&self.context_separator, DEFAULT_CONTEXT_SEPARATOR)
    }

    pub fn plural_separator(&self) -> &str {
        separator(&self.plural_separator, DEFAULT_PLURAL_SEPARATOR)
    }

    pub fn key_separator(&self) -> &str {
        separator(&self.key_separator, DEFAULT_KEY_SEPARATOR)
    }

    pub fn plural_suffix(&self) -> &str {
        self.plural_suffix.as_deref().unwrap_or(DEFAULT_PLURAL_SUFFIX)
    }

    pub fn interpolation_prefix(&self) -> &str {
        self.interpolation_prefix
            .as_deref()
            .unwrap_or(DEFAULT_INTERPOLATION_PREFIX)
    }

    pub fn interpolation_suffix(&self) -> &str {
        self.interpolation_suffix
            .as_deref()
            .unwrap_or(DEFAULT_INTERPOLATION_SUFFIX)
    }

    pub fn interpolation_separator(&self) -> &str {
        separator(&self.interpolation_separator, DEFAULT_INTERPOLATION_SEPARATOR)
    }

    pub fn nesting_prefix(&self) -> &str {
        self.nesting_prefix
            .as_deref()
            .unwrap_or(DEFAULT_NESTING_PREFIX)
    }

    pub fn nesting_suffix(&self) -> &str {
        self.nesting_suffix
            .as_deref()
            .unwrap_or(DEFAULT_NESTING_SUFFIX)
    }

    pub fn nesting_separator(&self) -> &str {
        separator(&self.nesting_separator, DEFAULT_NESTING_SEPARATOR)
    }

    pub fn options_separator(&self) -> &str {
        separator(&self.options_separator, DEFAULT_OPTIONS_SEPARATOR)
    }

    pub fn option_value_separator(&self) -> &str {
        separator(&self.option_value_separator, DEFAULT_OPTION_VALUE_SEPARATOR)
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline.unwrap_or_default()
    }

    pub fn max_nesting_depth(&self) -> usize {
        self.max_nesting_depth.unwrap_or(DEFAULT_MAX_NESTING_DEPTH)
    }

    pub fn formatter(&self, name: &str) -> Option<&ValueFormatter> {
        self.formats.get(name)
    }

    /// Escape text with the configured handler, or HTML-entity escaping
    pub fn escape(&self, text: &str) -> String {
        match &self.escape_handler {
            Some(handler) => handler(text),
            None => escape(text),
        }
    }
}

fn same_function<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

fn function_address<T: ?Sized>(function: &Arc<T>) -> usize {
    Arc::as_ptr(function) as *const () as usize
}

impl PartialEq for Options {
    fn eq(&self, other: &Self) -> bool {
        self.namespace_separator == other.namespace_separator
            && self.context_separator == other.context_separator
            && self.plural_separator == other.plural_separator
            && self.key_separator == other.key_separator
            && self.plural_suffix == other.plural_suffix
            && self.interpolation_prefix == other.interpolation_prefix
            && self.interpolation_suffix == other.interpolation_suffix
            && self.interpolation_separator == other.interpolation_separator
            && self.nesting_prefix == other.nesting_prefix
            && self.nesting_suffix == other.nesting_suffix
            && self.nesting_separator == other.nesting_separator
            && self.options_separator == other.options_separator
            && self.option_value_separator == other.option_value_separator
            && self.pipeline == other.pipeline
            && self.max_nesting_depth == other.max_nesting_depth
            && self.formats.len() == other.formats.len()
            && self
                .formats
                .iter()
                .zip(other.formats.iter())
                .all(|((a_name, a), (b_name, b))| a_name == b_name && Arc::ptr_eq(a, b))
            && same_function(&self.missing_format_handler, &other.missing_format_handler)
            && same_function(&self.missing_key_handler, &other.missing_key_handler)
            && same_function(
                &self.translation_failed_handler,
                &other.translation_failed_handler,
            )
            && same_function(&self.escape_handler, &other.escape_handler)
    }
}

impl Eq for Options {}

impl Hash for Options {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace_separator.hash(state);
        self.context_separator.hash(state);
        self.plural_separator.hash(state);
        self.key_separator.hash(state);
        self.plural_suffix.hash(state);
        self.interpolation_prefix.hash(state);
        self.interpolation_suffix.hash(state);
        self.interpolation_separator.hash(state);
        self.nesting_prefix.hash(state);
        self.nesting_suffix.hash(state);
        self.nesting_separator.hash(state);
        self.options_separator.hash(state);
        self.option_value_separator.hash(state);
        self.pipeline.hash(state);
        self.max_nesting_depth.hash(state);
        for (name, formatter) in &self.formats {
            name.hash(state);
            function_address(formatter).hash(state);
        }
        self.missing_format_handler
            .as_ref()
            .map(function_address)
            .hash(state);
        self.missing_key_handler
            .as_ref()
            .map(function_address)
            .hash(state);
        self.translation_failed_handler
            .as_ref()
            .map(function_address)
            .hash(state);
        self.escape_handler.as_ref().map(function_address).hash(state);
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("namespace_separator", &self.namespace_separator)
            .field("context_separator", &self.context_separator)
            .field("plural_separator", &self.plural_separator)
            .field("key_separator", &self.key_separator)
            .field("plural_suffix", &self.plural_suffix)
            .field("interpolation_prefix", &self.interpolation_prefix)
            .field("interpolation_suffix", &self.interpolation_suffix)
            .field("interpolation_separator", &self.interpolation_separator)
            .field("nesting_prefix", &self.nesting_prefix)
            .field("nesting_suffix", &self.nesting_suffix)
            .field("nesting_separator", &self.nesting_separator)
            .field("options_separator", &self.options_separator)
            .field("option_value_separator", &self.option_value_separator)
            .field("pipeline", &self.pipeline)
            .field("max_nesting_depth", &self.max_nesting_depth)
            .field("formats", &self.formats.keys().collect::<Vec<_>>())
            .field(
                "missing_format_handler",
                &self.missing_format_handler.is_some(),
            )
            .field("missing_key_handler", &self.missing_key_handler.is_some())
            .field(
                "translation_failed_handler",
                &self.translation_failed_handler.is_some(),
            )
            .field("escape_handler", &self.escape_handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(options: &Options) -> u64 {
        let mut hasher = DefaultHasher::new();
        options.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_base_defaults() {
        let base = Options::base();
        assert_eq!(base.namespace_separator(), ":");
        assert_eq!(base.context_separator(), "_");
        assert_eq!(base.plural_separator(), "_");
        assert_eq!(base.key_separator(), ".");
        assert_eq!(base.plural_suffix(), "plural");
        assert_eq!(base.interpolation_prefix(), "{{");
        assert_eq!(base.interpolation_suffix(), "}}");
        assert_eq!(base.interpolation_separator(), ",");
        assert_eq!(base.nesting_prefix(), "$t(");
        assert_eq!(base.nesting_suffix(), ")");
        assert_eq!(base.nesting_separator(), ",");
        assert_eq!(base.options_separator(), ";");
        assert_eq!(base.option_value_separator(), ":");
        assert_eq!(base.pipeline(), Pipeline::NestThenInterpolate);
        assert_eq!(base.max_nesting_depth(), DEFAULT_MAX_NESTING_DEPTH);
    }

    #[test]
    fn test_empty_options_fall_back() {
        let options = Options::new();
        assert_eq!(options.interpolation_prefix(), "{{");
        assert_eq!(options.nesting_prefix(), "$t(");
        assert_ne!(options, Options::base());
    }

    #[test]
    fn test_merge_override_wins_field_by_field() {
        let overrides = Options {
            interpolation_prefix: Some("[[".to_string()),
            interpolation_suffix: Some("]]".to_string()),
            ..Default::default()
        };
        let merged = Options::base().merge(&overrides);

        assert_eq!(merged.interpolation_prefix(), "[[");
        assert_eq!(merged.interpolation_suffix(), "]]");
        assert_eq!(merged.nesting_prefix(), "$t(");
        assert_eq!(merged.key_separator(), ".");
    }

    #[test]
    fn test_merge_ignores_empty_separators() {
        let overrides = Options {
            key_separator: Some(String::new()),
            nesting_separator: Some(String::new()),
            interpolation_prefix: Some(String::new()),
            ..Default::default()
        };
        let merged = Options::base().merge(&overrides);

        assert_eq!(merged.key_separator.as_deref(), Some("."));
        assert_eq!(merged.nesting_separator.as_deref(), Some(","));
        // Empty delimiters stay legal
        assert_eq!(merged.interpolation_prefix.as_deref(), Some(""));

        let options = Options::base().merge(&Options {
            key_separator: Some(String::new()),
            ..Default::default()
        });
        let mut variables = Variables::new();
        variables.insert("a".to_string(), Value::String("A".to_string()));
        assert_eq!(
            crate::interpolator::interpolate("en", "{{a}}", &variables, &options).unwrap(),
            "A"
        );
    }

    #[test]
    fn test_empty_separator_accessor_falls_back() {
        let options = Options {
            options_separator: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(options.options_separator(), ";");
    }

    #[test]
    fn test_merge_with_empty_override_is_identity() {
        let base = Options::base().with_formatter("upper", |v, _, _, _| Ok(v.cloned()));
        assert_eq!(base.merge(&Options::new()), base);
    }

    #[test]
    fn test_merge_unites_formatters() {
        let base = Options::base()
            .with_formatter("a", |v, _, _, _| Ok(v.cloned()))
            .with_formatter("b", |v, _, _, _| Ok(v.cloned()));
        let overrides = Options::new().with_formatter("b", |_, _, _, _| Ok(None));
        let merged = base.merge(&overrides);

        assert_eq!(merged.formats.len(), 2);
        assert!(Arc::ptr_eq(&merged.formats["a"], &base.formats["a"]));
        assert!(Arc::ptr_eq(&merged.formats["b"], &overrides.formats["b"]));
    }

    #[test]
    fn test_equality_compares_handlers_by_identity() {
        let options = Options::base().with_escape_handler(|text| text.to_string());
        let clone = options.clone();
        assert_eq!(options, clone);
        assert_eq!(hash_of(&options), hash_of(&clone));

        let other = Options::base().with_escape_handler(|text| text.to_string());
        assert_ne!(options, other);
    }

    #[test]
    fn test_with_defaults() {
        let options = Options {
            nesting_prefix: Some("@(".to_string()),
            ..Default::default()
        }
        .with_defaults();
        assert_eq!(options.nesting_prefix.as_deref(), Some("@("));
        assert_eq!(options.nesting_suffix.as_deref(), Some(")"));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let options: Options = serde_json::from_str(
            r#"{"interpolationPrefix": "%{", "interpolationSuffix": "}", "pipeline": "interpolate-then-nest", "maxNestingDepth": 4}"#,
        )
        .unwrap();
        assert_eq!(options.interpolation_prefix(), "%{");
        assert_eq!(options.interpolation_suffix(), "}");
        assert_eq!(options.pipeline(), Pipeline::InterpolateThenNest);
        assert_eq!(options.max_nesting_depth(), 4);
        assert_eq!(options.nesting_prefix, None);
    }

    #[test]
    fn test_escape_uses_handler() {
        assert_eq!(Options::new().escape("<b>"), "&lt;b&gt;");
        let options = Options::new().with_escape_handler(|text| text.to_uppercase());
        assert_eq!(options.escape("<b>"), "<B>");
    }
}

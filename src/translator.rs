//! Key lookup and template rendering
//!
//! [`Translator`] owns a [`ResourceStore`] and resolves a key in three steps:
//! split off the namespace, build the candidate keys (context and plural
//! variants first, the bare key last), and walk the locale chain until one
//! candidate is found. The hit is then rendered through the configured
//! pipeline, with `$t(...)` placeholders calling back into the translator.
//!
//! # Example
//!
//! ```ignore
//! let translator = Translator::new(store).with_fallback_locale("en");
//! let text = translator.t("common:greeting", "fr", &variables, &Options::base());
//! ```

use icu_locale::Locale;
use icu_plurals::{PluralCategory, PluralRuleType, PluralRules};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TranslationResult;
use crate::interpolator::{LookupContext, interpolate_with_context};
use crate::nesting::nest_with_context;
use crate::options::{Options, Pipeline, Variables};
use crate::resource_store::ResourceStore;

pub const DEFAULT_NAMESPACE: &str = "translation";

const CATEGORY_NAMES: [(PluralCategory, &str); 6] = [
    (PluralCategory::Zero, "zero"),
    (PluralCategory::One, "one"),
    (PluralCategory::Two, "two"),
    (PluralCategory::Few, "few"),
    (PluralCategory::Many, "many"),
    (PluralCategory::Other, "other"),
];

#[derive(Debug, Clone)]
pub struct Translator {
    store: ResourceStore,
    default_namespace: String,
    fallback_locale: Option<String>,
}

impl Translator {
    pub fn new(store: ResourceStore) -> Self {
        Translator {
            store,
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            fallback_locale: None,
        }
    }

    pub fn with_default_namespace(mut self, namespace: &str) -> Self {
        self.default_namespace = namespace.to_string();
        self
    }

    /// Locale tried after the requested one and its language
    pub fn with_fallback_locale(mut self, locale: &str) -> Self {
        self.fallback_locale = Some(locale.to_string());
        self
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ResourceStore {
        &mut self.store
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Resolve and render `key`.
    ///
    /// Returns `Ok(None)` when no candidate key exists in any locale of the
    /// chain and no `missingKeyHandler` is configured.
    pub fn translate(
        &self,
        key: &str,
        locale: &str,
        variables: &Variables,
        options: &Options,
    ) -> TranslationResult<Option<String>> {
        self.translate_in(&self.default_namespace, key, locale, variables, options)
    }

    /// Like [`Translator::translate`], but never fails: a missing key or a
    /// resolution error yields the key itself.
    pub fn t(&self, key: &str, locale: &str, variables: &Variables, options: &Options) -> String {
        match self.translate(key, locale, variables, options) {
            Ok(Some(text)) => text,
            Ok(None) => {
                warn!("No translation found for '{}' in locale '{}'", key, locale);
                key.to_string()
            }
            Err(error) => {
                warn!("Failed to translate '{}' in locale '{}': {}", key, locale, error);
                key.to_string()
            }
        }
    }

    /// Run `template` through the configured pipeline.
    ///
    /// `namespace` and `key` identify the lookup the template came from.
    /// Unqualified nested keys resolve in `namespace`.
    pub fn render(
        &self,
        locale: &str,
        namespace: &str,
        key: &str,
        template: &str,
        variables: &Variables,
        options: &Options,
    ) -> TranslationResult<String> {
        let context = LookupContext::new(locale).with_key(namespace, key);
        let translate = |nested_key: &str,
                         nested_locale: &str,
                         nested_variables: &Variables,
                         nested_options: &Options| {
            self.translate_in(
                namespace,
                nested_key,
                nested_locale,
                nested_variables,
                nested_options,
            )
        };

        match options.pipeline() {
            Pipeline::NestThenInterpolate => {
                let nested = nest_with_context(&context, template, translate, variables, options)?;
                interpolate_with_context(&context, &nested, variables, options)
            }
            Pipeline::InterpolateThenNest => {
                let interpolated =
                    interpolate_with_context(&context, template, variables, options)?;
                nest_with_context(&context, &interpolated, translate, variables, options)
            }
        }
    }

    fn translate_in(
        &self,
        default_namespace: &str,
        key: &str,
        locale: &str,
        variables: &Variables,
        options: &Options,
    ) -> TranslationResult<Option<String>> {
        let (namespace, key) = key
            .split_once(options.namespace_separator())
            .unwrap_or((default_namespace, key));

        for candidate_locale in self.locale_chain(locale) {
            let candidates = candidate_keys(key, candidate_locale, variables, options);
            for candidate in &candidates {
                let Some(template) =
                    self.store
                        .retrieve(candidate_locale, namespace, candidate, options.key_separator())
                else {
                    continue;
                };
                if candidate_locale != locale {
                    debug!(
                        "Fallback: using '{}' from locale '{}' (requested: '{}')",
                        candidate, candidate_locale, locale
                    );
                }
                return self
                    .render(locale, namespace, key, template, variables, options)
                    .map(Some);
            }
        }

        debug!(
            "No translation for '{}' in namespace '{}' for locale '{}'",
            key, namespace, locale
        );
        Ok(options
            .missing_key_handler
            .as_ref()
            .and_then(|handler| handler(locale, namespace, key, variables, options)))
    }

    /// Requested locale, its language, then the fallback locale
    fn locale_chain<'a>(&'a self, locale: &'a str) -> Vec<&'a str> {
        let mut chain = vec![locale];
        if let Some((language, _)) = locale.split_once(['-', '_']) {
            chain.push(language);
        }
        if let Some(fallback) = &self.fallback_locale {
            chain.push(fallback.as_str());
        }
        let mut unique = Vec::with_capacity(chain.len());
        for locale in chain {
            if !unique.contains(&locale) {
                unique.push(locale);
            }
        }
        unique
    }
}

/// Lookup keys for `key`, most specific first
fn candidate_keys(
    key: &str,
    locale: &str,
    variables: &Variables,
    options: &Options,
) -> Vec<String> {
    let mut bases = Vec::with_capacity(2);
    if let Some(context) = variables.get("context").and_then(Value::as_str) {
        bases.push(format!("{}{}{}", key, options.context_separator(), context));
    }
    bases.push(key.to_string());

    let category = variables
        .get("count")
        .filter(|count| count.is_number())
        .map(|count| plural_category(locale, count));

    let mut candidates = Vec::new();
    for base in bases {
        if let Some(category) = category {
            let separator = options.plural_separator();
            candidates.push(format!("{}{}{}", base, separator, category));
            if category != "one" {
                candidates.push(format!("{}{}{}", base, separator, options.plural_suffix()));
            }
        }
        candidates.push(base);
    }
    candidates
}

/// CLDR cardinal category name for a numeric count
fn plural_category(locale_str: &str, count: &Value) -> &'static str {
    let Some(number) = count
        .as_u64()
        .or_else(|| count.as_i64().map(i64::unsigned_abs))
    else {
        // Fractions are "other" in every locale we look up keys for
        return "other";
    };
    let Ok(number) = usize::try_from(number) else {
        return "other";
    };

    let category = match plural_rules(locale_str) {
        Some(rules) => rules.category_for(number),
        None if number == 1 => PluralCategory::One,
        None => PluralCategory::Other,
    };
    CATEGORY_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == category)
        .map_or("other", |(_, name)| *name)
}

fn plural_rules(locale_str: &str) -> Option<PluralRules> {
    let locale: Locale = match locale_str.parse() {
        Ok(locale) => locale,
        Err(e) => {
            debug!("Failed to parse locale '{}': {}", locale_str, e);
            return None;
        }
    };

    match PluralRules::try_new(locale.into(), PluralRuleType::Cardinal.into()) {
        Ok(rules) => Some(rules),
        Err(e) => {
            debug!("Failed to create PluralRules for locale '{}': {}", locale_str, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NestingFailure, TranslationError};
    use serde_json::json;

    fn vars(value: Value) -> Variables {
        match value {
            Value::Object(map) => map,
            _ => panic!("variables must be an object"),
        }
    }

    fn translator() -> Translator {
        let mut store = ResourceStore::new();
        store
            .add_namespace(
                "en",
                "translation",
                json!({
                    "greeting": "Hello, {{name}}!",
                    "intro": "$t(greeting) Welcome.",
                    "item_one": "one item",
                    "item_other": "{{count}} items",
                    "apple": "an apple",
                    "apple_plural": "{{count}} apples",
                    "friend": "A friend",
                    "friend_male": "A boyfriend",
                    "friend_male_one": "A boyfriend",
                    "friend_male_other": "{{count}} boyfriends",
                    "only_en": "English only",
                    "loop_a": "$t(loop_b)",
                    "loop_b": "$t(loop_a)",
                    "nav": {"home": "Home"}
                }),
            )
            .add_namespace(
                "en",
                "common",
                json!({"ok": "OK", "button": "[$t(ok)]", "cross": "$t(translation:nav.home)"}),
            )
            .add_namespace("en-GB", "translation", json!({"colour": "colour"}))
            .add_namespace("fr", "translation", json!({"greeting": "Bonjour, {{name}} !"}))
            .add_namespace(
                "ru",
                "translation",
                json!({
                    "file_one": "{{count}} файл",
                    "file_few": "{{count}} файла",
                    "file_many": "{{count}} файлов"
                }),
            );
        Translator::new(store)
    }

    fn translate(
        translator: &Translator,
        key: &str,
        locale: &str,
        variables: Value,
    ) -> Option<String> {
        translator
            .translate(key, locale, &vars(variables), &Options::base())
            .unwrap()
    }

    #[test]
    fn test_simple_lookup_and_interpolation() {
        let translator = translator();
        assert_eq!(
            translate(&translator, "greeting", "en", json!({"name": "Ada"})).as_deref(),
            Some("Hello, Ada!")
        );
        assert_eq!(
            translate(&translator, "nav.home", "en", json!({})).as_deref(),
            Some("Home")
        );
    }

    #[test]
    fn test_namespaces() {
        let translator = translator();
        assert_eq!(
            translate(&translator, "common:ok", "en", json!({})).as_deref(),
            Some("OK")
        );
        // Unqualified nested keys stay in the enclosing namespace
        assert_eq!(
            translate(&translator, "common:button", "en", json!({})).as_deref(),
            Some("[OK]")
        );
        assert_eq!(
            translate(&translator, "common:cross", "en", json!({})).as_deref(),
            Some("Home")
        );
        assert_eq!(translate(&translator, "ok", "en", json!({})), None);

        let translator = translator.with_default_namespace("common");
        assert_eq!(translator.default_namespace(), "common");
        assert_eq!(translate(&translator, "ok", "en", json!({})).as_deref(), Some("OK"));
    }

    #[test]
    fn test_nesting_then_interpolation() {
        let translator = translator();
        assert_eq!(
            translate(&translator, "intro", "en", json!({"name": "Ada"})).as_deref(),
            Some("Hello, Ada! Welcome.")
        );
    }

    #[test]
    fn test_plural_categories() {
        let translator = translator();
        assert_eq!(
            translate(&translator, "item", "en", json!({"count": 1})).as_deref(),
            Some("one item")
        );
        assert_eq!(
            translate(&translator, "item", "en", json!({"count": 5})).as_deref(),
            Some("5 items")
        );
        assert_eq!(
            translate(&translator, "item", "en", json!({"count": 0})).as_deref(),
            Some("0 items")
        );
        assert_eq!(
            translate(&translator, "item", "en", json!({"count": 1.5})).as_deref(),
            Some("1.5 items")
        );
    }

    #[test]
    fn test_plural_suffix_fallback() {
        let translator = translator();
        assert_eq!(
            translate(&translator, "apple", "en", json!({"count": 1})).as_deref(),
            Some("an apple")
        );
        assert_eq!(
            translate(&translator, "apple", "en", json!({"count": 3})).as_deref(),
            Some("3 apples")
        );
    }

    #[test]
    fn test_plural_categories_follow_locale_rules() {
        let translator = translator();
        assert_eq!(
            translate(&translator, "file", "ru", json!({"count": 1})).as_deref(),
            Some("1 файл")
        );
        assert_eq!(
            translate(&translator, "file", "ru", json!({"count": 3})).as_deref(),
            Some("3 файла")
        );
        assert_eq!(
            translate(&translator, "file", "ru", json!({"count": 5})).as_deref(),
            Some("5 файлов")
        );
    }

    #[test]
    fn test_context_variants() {
        let translator = translator();
        assert_eq!(
            translate(&translator, "friend", "en", json!({"context": "male"})).as_deref(),
            Some("A boyfriend")
        );
        assert_eq!(
            translate(&translator, "friend", "en", json!({"context": "female"})).as_deref(),
            Some("A friend")
        );
        assert_eq!(
            translate(&translator, "friend", "en", json!({"context": "male", "count": 2}))
                .as_deref(),
            Some("2 boyfriends")
        );
    }

    #[test]
    fn test_candidate_key_order() {
        let variables = vars(json!({"context": "male", "count": 2}));
        assert_eq!(
            candidate_keys("friend", "en", &variables, &Options::base()),
            vec![
                "friend_male_other",
                "friend_male_plural",
                "friend_male",
                "friend_other",
                "friend_plural",
                "friend",
            ]
        );
        assert_eq!(
            candidate_keys("friend", "en", &Variables::new(), &Options::base()),
            vec!["friend"]
        );
    }

    #[test]
    fn test_locale_chain() {
        let translator = translator().with_fallback_locale("en");
        assert_eq!(translator.locale_chain("en-GB"), vec!["en-GB", "en"]);
        assert_eq!(translator.locale_chain("pt_BR"), vec!["pt_BR", "pt", "en"]);
        assert_eq!(translator.locale_chain("fr"), vec!["fr", "en"]);

        assert_eq!(
            translate(&translator, "colour", "en-GB", json!({})).as_deref(),
            Some("colour")
        );
        assert_eq!(
            translate(&translator, "only_en", "en-GB", json!({})).as_deref(),
            Some("English only")
        );
        assert_eq!(
            translate(&translator, "greeting", "fr-CA", json!({"name": "Ada"})).as_deref(),
            Some("Bonjour, Ada !")
        );
        assert_eq!(
            translate(&translator, "only_en", "fr", json!({})).as_deref(),
            Some("English only")
        );
    }

    #[test]
    fn test_missing_key() {
        let translator = translator();
        assert_eq!(translate(&translator, "nope", "en", json!({})), None);
        assert_eq!(translate(&translator, "only_en", "fr", json!({})), None);
        assert_eq!(
            translator.t("nope", "en", &Variables::new(), &Options::base()),
            "nope"
        );
    }

    #[test]
    fn test_missing_key_handler() {
        let translator = translator();
        let options = Options::base().with_missing_key_handler(|locale, namespace, key, _, _| {
            Some(format!("[{}:{}:{}]", locale, namespace, key))
        });
        assert_eq!(
            translator
                .translate("common:nope", "de", &Variables::new(), &options)
                .unwrap()
                .as_deref(),
            Some("[de:common:nope]")
        );
    }

    #[test]
    fn test_key_cycle_is_refused() {
        let translator = translator();
        let options = Options::base().with_max_nesting_depth(8);
        match translator.translate("loop_a", "en", &Variables::new(), &options) {
            Err(TranslationError::Nesting(error)) => {
                assert_eq!(error.reason, NestingFailure::DepthExceeded { limit: 8 });
            }
            other => panic!("Expected depth error, got {:?}", other),
        }
        assert_eq!(translator.t("loop_a", "en", &Variables::new(), &options), "loop_a");
    }

    #[test]
    fn test_interpolate_then_nest_pipeline() {
        let mut store = ResourceStore::new();
        store.add_namespace(
            "en",
            "translation",
            json!({"pick": "$t({{target}})", "yes": "Yes"}),
        );
        let translator = Translator::new(store);
        let variables = vars(json!({"target": "yes"}));

        let options = Options::base().with_pipeline(Pipeline::InterpolateThenNest);
        assert_eq!(
            translator
                .translate("pick", "en", &variables, &options)
                .unwrap()
                .as_deref(),
            Some("Yes")
        );

        // Nesting first looks up the literal "{{target}}" key
        assert!(matches!(
            translator.translate("pick", "en", &variables, &Options::base()),
            Err(TranslationError::Nesting(_))
        ));
    }

    #[test]
    fn test_render_reports_lookup_to_handlers() {
        let translator = translator();
        let options = Options::base().with_translation_failed_handler(
            |locale, namespace, key, _, _, _| format!("<{}|{}|{}>", locale, namespace, key),
        );
        assert_eq!(
            translator
                .translate("greeting", "en", &Variables::new(), &options)
                .unwrap()
                .as_deref(),
            Some("Hello, <en|translation|greeting>!")
        );
    }
}

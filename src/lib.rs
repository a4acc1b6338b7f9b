//! i18next-style template resolution
//!
//! A template is a translation string that may contain two kinds of
//! placeholders:
//!
//! - interpolations, `{{name}}` or `{{- name}}` (unescaped), optionally
//!   followed by a chain of formats: `{{price, currency(EUR), uppercase}}`
//! - nestings, `$t(key)` or `$t(key, {"count": 2})`, replaced by the
//!   translation of another key
//!
//! Every delimiter and separator is configurable through [`Options`].
//! [`interpolate`] and [`nest`] work on a single template; [`Translator`]
//! adds key lookup over a [`ResourceStore`] with namespaces, plurals,
//! context variants and locale fallback.
//!
//! ```ignore
//! use banana_i18next::{Options, ResourceStore, Translator, Variables};
//! use serde_json::json;
//!
//! let mut store = ResourceStore::new();
//! store.add_namespace("en", "translation", json!({
//!     "greeting": "Hello, {{name}}!",
//!     "intro": "$t(greeting) Welcome back."
//! }));
//!
//! let mut variables = Variables::new();
//! variables.insert("name".to_string(), json!("Ada"));
//!
//! let translator = Translator::new(store);
//! assert_eq!(
//!     translator.t("intro", "en", &variables, &Options::base()),
//!     "Hello, Ada! Welcome back."
//! );
//! ```

pub mod data_source;
pub mod error;
pub mod escape;
pub mod format;
pub mod formatters;
pub mod interpolator;
pub mod loader;
pub mod matchers;
pub mod nesting;
pub mod options;
pub mod resource_store;
pub mod translator;

pub use data_source::{
    DirectoryDataSource, HttpDataSource, LocalizationDataSource, MemoryDataSource,
    NamespaceBundles,
};
pub use error::{
    FormatError, InterpolationError, LoadError, NestingError, NestingFailure, TranslationError,
    TranslationResult,
};
pub use escape::escape;
pub use format::{FormatDescriptor, FormatOptionValue, parse_format};
pub use formatters::with_builtin_formatters;
pub use interpolator::{LookupContext, interpolate, interpolate_with_context};
pub use loader::{load_namespace_from_file, load_store_from_dir};
pub use matchers::Matchers;
pub use nesting::{nest, nest_with_context};
pub use options::{Options, Pipeline, Variables};
pub use resource_store::ResourceStore;
pub use translator::Translator;

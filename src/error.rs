/// Error types for template resolution and catalog loading
use std::path::PathBuf;
use thiserror::Error;

/// A placeholder could not produce any text.
///
/// Raised when the variable path of an interpolation cannot be resolved and
/// no formatter in its chain synthesized a value either.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot interpolate '{matched}' for locale '{locale}': variable '{variable}' has no value")]
pub struct InterpolationError {
    /// The raw placeholder text, delimiters included (e.g. `{{user.name}}`)
    pub matched: String,
    /// The trimmed variable path (may be empty)
    pub variable: String,
    pub locale: String,
}

/// Why a nesting placeholder failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NestingFailure {
    #[error("nesting key is empty")]
    MissingKey,
    #[error("nested key could not be translated")]
    KeyNotFound,
    #[error("nesting depth limit of {limit} reached")]
    DepthExceeded { limit: usize },
}

/// A nesting placeholder could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: '{matched}' (key '{key}', locale '{locale}')")]
pub struct NestingError {
    /// The raw nesting text, delimiters included (e.g. `$t(common:ok)`)
    pub matched: String,
    pub key: String,
    pub locale: String,
    pub reason: NestingFailure,
}

/// Errors produced while resolving a template
#[derive(Debug, Error)]
pub enum TranslationError {
    /// Recoverable: a placeholder produced no value
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    /// Recoverable: a nested key was empty, missing or too deep
    #[error(transparent)]
    Nesting(#[from] NestingError),

    /// More than one variables block follows a nesting key
    #[error("malformed nesting '{matched}': only one variables block may follow the key")]
    MalformedNesting { matched: String },

    /// The variables block of a nesting placeholder is not a JSON object
    #[error("invalid variables in nesting '{matched}': {source}")]
    NestingVariables {
        matched: String,
        #[source]
        source: serde_json::Error,
    },

    /// A delimiter produced a pattern the regex engine rejected
    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl TranslationError {
    /// Whether a `translationFailedHandler` may intercept this error.
    ///
    /// Structural and variable-parse errors point at a broken catalog and
    /// always propagate.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TranslationError::Interpolation(_) | TranslationError::Nesting(_)
        )
    }
}

/// Result type for resolver operations
pub type TranslationResult<T> = Result<T, TranslationError>;

/// Error returned by a formatter.
///
/// Formatter errors never abort a render; the format chain discards them and
/// carries on with the previous value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FormatError(pub String);

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        FormatError(message.into())
    }
}

/// Errors from loading translation catalogs
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON from '{origin}': {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid catalog '{0}': root must be an object")]
    InvalidRoot(String),

    #[error("path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("request to '{url}' failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to '{url}' returned status {status}")]
    Status { url: String, status: u16 },
}

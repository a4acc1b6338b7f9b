use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::resource_store::ResourceStore;

/// Parse the contents of one namespace file
///
/// The JSON should have the following structure:
/// ```json
/// {
///     "@metadata": { ... },  // Ignored
///     "greeting": "Hello, {{name}}!",
///     "nav": { "home": "Home" }
/// }
/// ```
///
/// `origin` names the file or URL in error messages.
pub fn parse_namespace(content: &str, origin: &str) -> Result<Value, LoadError> {
    let json: Value = serde_json::from_str(content).map_err(|source| LoadError::Json {
        origin: origin.to_string(),
        source,
    })?;

    let Value::Object(mut object) = json else {
        return Err(LoadError::InvalidRoot(origin.to_string()));
    };

    // Skip metadata
    object.retain(|key, _| !key.starts_with('@'));
    Ok(Value::Object(object))
}

/// Load one namespace from a single JSON file
///
/// # Errors
/// - File not found
/// - Invalid JSON
/// - Root is not an object
pub fn load_namespace_from_file(path: &Path) -> Result<Value, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_namespace(&content, &path.display().to_string())
}

/// Load all catalogs from a directory
///
/// Expects one sub-directory per locale, holding one `*.json` file per
/// namespace. The file stem is the namespace name:
/// `locales/en/common.json` -> locale `"en"`, namespace `"common"`.
///
/// # Errors
/// - Directory not found
/// - File read/parse errors
pub fn load_store_from_dir(dir: &Path) -> Result<ResourceStore, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }

    let mut store = ResourceStore::new();
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let locale_dir = entry.path();
        if !locale_dir.is_dir() {
            continue;
        }
        let Some(locale) = locale_dir.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        for (namespace, resources) in load_locale_dir(&locale_dir)? {
            store.add_resources(locale, &namespace, resources);
        }
    }

    if store.locales().is_empty() {
        tracing::warn!("No locale directories found in {}", dir.display());
    }

    Ok(store)
}

/// Load every `<namespace>.json` file of one locale directory
pub(crate) fn load_locale_dir(dir: &Path) -> Result<Vec<(String, Value)>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut namespaces = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        // Only process JSON files
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(namespace) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        namespaces.push((namespace.to_string(), load_namespace_from_file(&path)?));
    }
    Ok(namespaces)
}

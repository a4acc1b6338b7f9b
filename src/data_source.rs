//! Translation data sources
//!
//! A [`LocalizationDataSource`] produces the namespaces of one locale, so a
//! [`ResourceStore`](crate::resource_store::ResourceStore) can be filled from
//! disk, over HTTP or from memory without knowing where the catalogs live.
//!
//! # Example
//!
//! ```ignore
//! use banana_i18next::{DirectoryDataSource, ResourceStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = DirectoryDataSource::new("locales");
//!     let mut store = ResourceStore::new();
//!     store.load_locale(&source, "en").await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LoadError;
use crate::loader::parse_namespace;

/// Namespace name to catalog tree
pub type NamespaceBundles = HashMap<String, Value>;

/// Where translation catalogs come from
///
/// All methods are async to support I/O-bound sources like network requests.
#[async_trait]
pub trait LocalizationDataSource: Send + Sync {
    /// Load every namespace available for `locale`
    ///
    /// A locale the source knows nothing about yields an empty map, not an
    /// error.
    async fn load(&self, locale: &str) -> Result<NamespaceBundles, LoadError>;

    /// Name used in log lines
    fn source_name(&self) -> &str;
}

/// Reads `<root>/<locale>/<namespace>.json`
#[derive(Debug, Clone)]
pub struct DirectoryDataSource {
    root: PathBuf,
}

impl DirectoryDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl LocalizationDataSource for DirectoryDataSource {
    async fn load(&self, locale: &str) -> Result<NamespaceBundles, LoadError> {
        let dir = self.root.join(locale);
        let mut bundles = NamespaceBundles::new();
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            tracing::debug!("No directory for locale {} in {}", locale, self.root.display());
            return Ok(bundles);
        }

        let io_error = |source| LoadError::Io {
            path: dir.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(io_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(namespace) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
            let resources = parse_namespace(&content, &path.display().to_string())?;
            bundles.insert(namespace.to_string(), resources);
        }
        Ok(bundles)
    }

    fn source_name(&self) -> &str {
        "directory"
    }
}

/// Fetches `<base_url>/<locale>/<namespace>.json` for a fixed namespace list
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: reqwest::Client,
    base_url: String,
    namespaces: Vec<String>,
}

impl HttpDataSource {
    pub fn new(base_url: impl Into<String>, namespaces: Vec<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, namespaces)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        namespaces: Vec<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            namespaces,
        }
    }

    fn url(&self, locale: &str, namespace: &str) -> String {
        format!("{}/{}/{}.json", self.base_url, locale, namespace)
    }
}

#[async_trait]
impl LocalizationDataSource for HttpDataSource {
    async fn load(&self, locale: &str) -> Result<NamespaceBundles, LoadError> {
        let mut bundles = NamespaceBundles::new();
        for namespace in &self.namespaces {
            let url = self.url(locale, namespace);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|source| LoadError::Http {
                    url: url.clone(),
                    source,
                })?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                tracing::debug!("No {} namespace for locale {} at {}", namespace, locale, url);
                continue;
            }
            if !status.is_success() {
                return Err(LoadError::Status {
                    url,
                    status: status.as_u16(),
                });
            }

            let body = response.text().await.map_err(|source| LoadError::Http {
                url: url.clone(),
                source,
            })?;
            bundles.insert(namespace.clone(), parse_namespace(&body, &url)?);
        }
        Ok(bundles)
    }

    fn source_name(&self) -> &str {
        "http"
    }
}

/// Fixed in-memory catalogs, keyed by locale
#[derive(Debug, Clone, Default)]
pub struct MemoryDataSource {
    locales: HashMap<String, NamespaceBundles>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, locale: &str, namespace: &str, resources: Value) -> Self {
        self.locales
            .entry(locale.to_string())
            .or_default()
            .insert(namespace.to_string(), resources);
        self
    }
}

#[async_trait]
impl LocalizationDataSource for MemoryDataSource {
    async fn load(&self, locale: &str) -> Result<NamespaceBundles, LoadError> {
        Ok(self.locales.get(locale).cloned().unwrap_or_default())
    }

    fn source_name(&self) -> &str {
        "memory"
    }
}

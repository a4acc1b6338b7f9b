use std::collections::HashMap;

use serde_json::Value;

use crate::data_source::LocalizationDataSource;
use crate::error::LoadError;

/// Translation catalogs, keyed by locale and then by namespace.
///
/// Each namespace holds a JSON object tree; keys are looked up by walking
/// that tree with the key separator.
// e.g. data["en"]["common"] = {"greeting": "Hello", "nav": {"home": "Home"}}
//      data["fr"]["common"] = {"greeting": "Bonjour"}
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceStore {
    data: HashMap<String, HashMap<String, Value>>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resources of one namespace, replacing what was there
    pub fn add_namespace(&mut self, locale: &str, namespace: &str, resources: Value) -> &mut Self {
        self.data
            .entry(locale.to_string())
            .or_default()
            .insert(namespace.to_string(), resources);
        self
    }

    /// Deep-merge resources into a namespace; incoming leaves win
    pub fn add_resources(&mut self, locale: &str, namespace: &str, resources: Value) -> &mut Self {
        let namespaces = self.data.entry(locale.to_string()).or_default();
        match namespaces.get_mut(namespace) {
            Some(existing) => deep_merge(existing, resources),
            None => {
                namespaces.insert(namespace.to_string(), resources);
            }
        }
        self
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.data.contains_key(locale)
    }

    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.data.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    pub fn namespaces(&self, locale: &str) -> Vec<&str> {
        let mut namespaces: Vec<&str> = self
            .data
            .get(locale)
            .map(|namespaces| namespaces.keys().map(String::as_str).collect())
            .unwrap_or_default();
        namespaces.sort_unstable();
        namespaces
    }

    /// Look up a key path. Only string leaves resolve.
    pub fn retrieve(
        &self,
        locale: &str,
        namespace: &str,
        key: &str,
        key_separator: &str,
    ) -> Option<&str> {
        let mut current = self.data.get(locale)?.get(namespace)?;
        for segment in key.split(key_separator) {
            current = current.as_object()?.get(segment)?;
        }
        current.as_str()
    }

    /// Load every namespace a data source provides for `locale`
    pub async fn load_locale(
        &mut self,
        source: &dyn LocalizationDataSource,
        locale: &str,
    ) -> Result<&mut Self, LoadError> {
        let bundles = source.load(locale).await?;
        tracing::debug!(
            source = source.source_name(),
            locale,
            namespaces = bundles.len(),
            "Loaded translations"
        );
        for (namespace, resources) in bundles {
            self.add_resources(locale, &namespace, resources);
        }
        Ok(self)
    }
}

fn deep_merge(target: &mut Value, incoming: Value) {
    match incoming {
        Value::Object(incoming) if target.is_object() => {
            if let Some(target) = target.as_object_mut() {
                for (key, value) in incoming {
                    match target.get_mut(&key) {
                        Some(existing) => deep_merge(existing, value),
                        None => {
                            target.insert(key, value);
                        }
                    }
                }
            }
        }
        incoming => *target = incoming,
    }
}

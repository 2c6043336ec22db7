//! Configuration lookups
//!
//! Views read their settings from a nested key-value store addressed with
//! dotted keys such as `view.options.view_suffix`. Plugins get their own
//! namespace under `{plugin_alias}.{plugin}.`, and any key missing there
//! falls back to the global key.
//!
//! # Example
//!
//! ```rust
//! use tessera_view::ConfigStore;
//!
//! let config = ConfigStore::from_toml_str(r#"
//!     [view]
//!     handler = "tera"
//!
//!     [view.options]
//!     view_suffix = "tera"
//!
//!     [plugin.shop.view]
//!     handler = "minijinja"
//! "#).unwrap();
//!
//! assert_eq!(config.get("view.handler").and_then(|v| v.as_str()), Some("tera"));
//! assert_eq!(
//!     config.plugin_get("shop", "view.handler").and_then(|v| v.as_str()),
//!     Some("minijinja")
//! );
//! ```

use crate::error::{Result, ViewError};
use crate::request::RenderDescriptor;
use crate::vars::Vars;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Namespace used for plugin configuration when `app.plugin_alias` is unset
pub const DEFAULT_PLUGIN_ALIAS: &str = "plugin";

/// Suffix appended to template names when `view.options.view_suffix` is unset
pub const DEFAULT_VIEW_SUFFIX: &str = "html";

/// Nested, string-keyed configuration store
#[derive(Debug, Clone)]
pub struct ConfigStore {
    root: Value,
}

impl ConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Wrap an existing JSON object
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(ViewError::config("configuration root must be a table"));
        }
        Ok(Self { root: value })
    }

    /// Parse TOML text
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let value: Value = toml::from_str(source)?;
        Self::from_value(value)
    }

    /// Read and parse a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ViewError::io(path, e))?;
        Self::from_toml_str(&source)
    }

    /// Look up a dotted key
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.root, |current, part| current.as_object()?.get(part))
    }

    /// Look up a dotted key and deserialize it
    ///
    /// A missing key or an explicit `null` yields `Ok(None)`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        deserialize_at(key, self.get(key))
    }

    /// Set a dotted key, creating intermediate tables as needed
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let (parents, last) = match key.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, key),
        };

        let mut current = &mut self.root;
        for part in parents.into_iter().flat_map(|p| p.split('.')) {
            current = ensure_object(current)
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        ensure_object(current).insert(last.to_string(), value.into());
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Namespace under which plugin configuration lives (`app.plugin_alias`)
    pub fn plugin_alias(&self) -> &str {
        self.get("app.plugin_alias")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PLUGIN_ALIAS)
    }

    /// Key as it would be spelled inside the plugin namespace
    pub fn scoped_key(&self, plugin: &str, key: &str) -> String {
        if plugin.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}.{}", self.plugin_alias(), plugin, key)
        }
    }

    /// Look up a key for a plugin, falling back to the global key
    pub fn plugin_get(&self, plugin: &str, key: &str) -> Option<&Value> {
        if !plugin.is_empty() {
            if let Some(value) = self.get(&self.scoped_key(plugin, key)) {
                return Some(value);
            }
        }
        self.get(key)
    }

    /// Typed variant of [`plugin_get`](Self::plugin_get)
    pub fn plugin_get_as<T: DeserializeOwned>(&self, plugin: &str, key: &str) -> Result<Option<T>> {
        deserialize_at(key, self.plugin_get(plugin, key))
    }

    /// Look up a table for a plugin, overlaying the plugin's keys on the global table
    ///
    /// Nested tables merge key by key, so every dotted key below `key` falls
    /// back to its global value. Any other plugin value replaces the global one.
    pub fn plugin_table(&self, plugin: &str, key: &str) -> Option<Value> {
        let global = self.get(key);
        let scoped = if plugin.is_empty() {
            None
        } else {
            self.get(&self.scoped_key(plugin, key))
        };

        match (global, scoped) {
            (Some(global), Some(scoped)) => {
                let mut merged = global.clone();
                overlay(&mut merged, scoped);
                Some(merged)
            }
            (global, scoped) => scoped.or(global).cloned(),
        }
    }

    /// The `view.options` table for a plugin, with defaults filled in
    pub fn view_options(&self, plugin: &str) -> Result<ViewOptions> {
        let key = "view.options";
        Ok(deserialize_at::<ViewOptions>(key, self.plugin_table(plugin, key).as_ref())?
            .unwrap_or_default())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("replaced with an object above"),
    }
}

fn overlay(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match target.get_mut(key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, incoming) => *target = incoming.clone(),
    }
}

fn deserialize_at<T: DeserializeOwned>(key: &str, value: Option<&Value>) -> Result<Option<T>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| ViewError::config(format!("{}: {}", key, e))),
    }
}

/// Typed view of the `view.options` table
///
/// Engine-specific keys are ignored by adapters that do not understand them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    /// File suffix appended to template names
    pub view_suffix: String,
    /// Default variables, overridden by assigned and explicit variables
    pub vars: Vars,
    /// Templates rendered before the main template (raw engine)
    pub pre_renders: Vec<RenderDescriptor>,
    /// Templates rendered after the main template (raw engine)
    pub post_renders: Vec<RenderDescriptor>,
    /// Force HTML auto-escaping on or off; `None` keeps the engine default
    pub autoescape: Option<bool>,
    /// Fail on undefined variables (minijinja, handlebars)
    pub strict: bool,
    /// Reload all templates before each render (tera)
    pub auto_reload: bool,
    /// Remove the first newline after a block tag (minijinja)
    pub trim_blocks: bool,
    /// Re-read templates from disk on every render (handlebars)
    pub dev_mode: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            view_suffix: DEFAULT_VIEW_SUFFIX.to_string(),
            vars: Vars::new(),
            pre_renders: Vec::new(),
            post_renders: Vec::new(),
            autoescape: None,
            strict: false,
            auto_reload: false,
            trim_blocks: false,
            dev_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested_key() {
        let config = ConfigStore::from_value(json!({
            "view": { "options": { "view_suffix": "tpl" } }
        }))
        .unwrap();

        assert_eq!(config.get("view.options.view_suffix"), Some(&json!("tpl")));
        assert!(config.get("view.options.missing").is_none());
        assert!(config.get("view.options.view_suffix.deeper").is_none());
    }

    #[test]
    fn test_root_must_be_object() {
        assert!(ConfigStore::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_set_creates_tables() {
        let mut config = ConfigStore::new();
        config.set("view.options.view_suffix", "twig");
        config.set("view.handler", "tera");

        assert_eq!(config.get("view.options.view_suffix"), Some(&json!("twig")));
        assert_eq!(config.get("view.handler"), Some(&json!("tera")));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let config = ConfigStore::new()
            .with("view", "scalar")
            .with("view.handler", "raw");
        assert_eq!(config.get("view.handler"), Some(&json!("raw")));
    }

    #[test]
    fn test_plugin_namespace_and_fallback() {
        let config = ConfigStore::new()
            .with("view.handler", "tera")
            .with("plugin.shop.view.handler", "handlebars");

        assert_eq!(config.plugin_get("shop", "view.handler"), Some(&json!("handlebars")));
        assert_eq!(config.plugin_get("blog", "view.handler"), Some(&json!("tera")));
        assert_eq!(config.plugin_get("", "view.handler"), Some(&json!("tera")));
    }

    #[test]
    fn test_plugin_alias_changes_namespace() {
        let config = ConfigStore::new()
            .with("app.plugin_alias", "addons")
            .with("addons.shop.view.handler", "minijinja");

        assert_eq!(config.scoped_key("shop", "view.handler"), "addons.shop.view.handler");
        assert_eq!(config.plugin_get("shop", "view.handler"), Some(&json!("minijinja")));
    }

    #[test]
    fn test_view_options_defaults() {
        let options = ConfigStore::new().view_options("").unwrap();
        assert_eq!(options.view_suffix, "html");
        assert!(options.pre_renders.is_empty());
        assert!(options.autoescape.is_none());
    }

    #[test]
    fn test_view_options_from_toml() {
        let config = ConfigStore::from_toml_str(
            r#"
            [view.options]
            view_suffix = "tpl"
            strict = true

            [view.options.vars]
            site = "example"

            [[view.options.pre_renders]]
            template = "common/header"
            "#,
        )
        .unwrap();

        let options = config.view_options("").unwrap();
        assert_eq!(options.view_suffix, "tpl");
        assert!(options.strict);
        assert_eq!(options.vars.get("site"), Some(&json!("example")));
        assert_eq!(options.pre_renders.len(), 1);
        assert_eq!(options.pre_renders[0].template, "common/header");
    }

    #[test]
    fn test_plugin_view_options_fall_back_per_key() {
        let config = ConfigStore::new()
            .with("view.options.view_suffix", "tpl")
            .with("view.options.vars.site", "global")
            .with("view.options.pre_renders", json!([{"template": "header"}]))
            .with("plugin.pay.view.options.vars.local", "pay")
            .with("plugin.pay.view.options.strict", true);

        let options = config.view_options("pay").unwrap();
        assert_eq!(options.view_suffix, "tpl");
        assert!(options.strict);
        assert_eq!(options.vars.get("site"), Some(&json!("global")));
        assert_eq!(options.vars.get("local"), Some(&json!("pay")));
        assert_eq!(options.pre_renders.len(), 1);

        let global = config.view_options("").unwrap();
        assert!(!global.strict);
        assert!(global.vars.get("local").is_none());
    }

    #[test]
    fn test_plugin_table_replaces_non_tables() {
        let config = ConfigStore::new()
            .with("view.options.vars.site", "global")
            .with("view.options.pre_renders", json!([{"template": "a"}, {"template": "b"}]))
            .with("plugin.pay.view.options.vars.site", "pay")
            .with("plugin.pay.view.options.pre_renders", json!([{"template": "c"}]));

        assert_eq!(
            config.plugin_table("pay", "view.options"),
            Some(json!({
                "vars": {"site": "pay"},
                "pre_renders": [{"template": "c"}]
            }))
        );
        assert_eq!(config.plugin_table("pay", "view.missing"), None);
    }

    #[test]
    fn test_wrong_shape_is_config_error() {
        let config = ConfigStore::new().with("view.options.strict", "yes please");
        let err = config.view_options("").unwrap_err();
        assert!(matches!(err, ViewError::Config(_)));
    }
}

//! Tera adapter

use super::extension::EngineHandle;
use super::{EngineCache, EngineKind, RenderAdapter, Target, ViewEnv};
use crate::config::ViewOptions;
use crate::context::RequestContext;
use crate::error::Result;
use crate::request::RenderRequest;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tera::Tera;

/// Renders Tera templates, one `Tera` instance per view root
///
/// Each instance loads every `*.{suffix}` file below its root on
/// construction, so `{% extends %}` and `{% include %}` work across the
/// whole view directory. With `view.options.auto_reload` set, templates are
/// reloaded from disk before each render.
#[derive(Debug, Default)]
pub struct TeraRender {
    engines: EngineCache<RwLock<Tera>>,
}

impl TeraRender {
    /// Create the adapter with an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Engines built so far
    pub fn engines(&self) -> &EngineCache<RwLock<Tera>> {
        &self.engines
    }

    fn build(env: &ViewEnv, plugin: &str, root: &Path, options: &ViewOptions) -> Result<Tera> {
        let glob = format!("{}/**/*.{}", root.display(), options.view_suffix);
        let mut tera = Tera::new(&glob)?;

        // tera matches suffixes with `ends_with`, so "" escapes every template
        match options.autoescape {
            Some(true) => tera.autoescape_on(vec![""]),
            Some(false) => tera.autoescape_on(vec![]),
            None => {}
        }
        register_builtin_filters(&mut tera);
        env.extensions
            .apply(&env.config, plugin, EngineHandle::Tera(&mut tera))?;

        tracing::debug!(
            root = %root.display(),
            templates = tera.get_template_names().count(),
            "built tera engine"
        );
        Ok(tera)
    }
}

impl RenderAdapter for TeraRender {
    fn kind(&self) -> EngineKind {
        EngineKind::Tera
    }

    fn render(
        &self,
        env: &ViewEnv,
        ctx: &RequestContext,
        request: &RenderRequest,
    ) -> Result<String> {
        let target = Target::resolve(env, ctx, request)?;
        let engine = self.engines.get_or_try_init(&target.root, || {
            Self::build(env, &target.plugin, &target.root, &target.options).map(RwLock::new)
        })?;

        if target.options.auto_reload {
            let mut tera = engine.write();
            if let Err(e) = tera.full_reload() {
                tracing::warn!("Template reload failed: {}", e);
            }
        }

        let context = tera::Context::from_value(Value::Object(target.vars(ctx, request)))?;
        let tera = engine.read();
        Ok(tera.render(&target.file_name(), &context)?)
    }
}

/// Register built-in template filters
fn register_builtin_filters(tera: &mut Tera) {
    // JSON filter for debugging
    tera.register_filter(
        "json_pretty",
        |value: &tera::Value, _: &HashMap<String, tera::Value>| {
            serde_json::to_string_pretty(value)
                .map(tera::Value::String)
                .map_err(|e| tera::Error::msg(e.to_string()))
        },
    );

    tera.register_filter(
        "truncate_words",
        |value: &tera::Value, args: &HashMap<String, tera::Value>| {
            let s = tera::try_get_value!("truncate_words", "value", String, value);
            let length = match args.get("length") {
                Some(val) => tera::try_get_value!("truncate_words", "length", usize, val),
                None => 50,
            };
            let end = match args.get("end") {
                Some(val) => tera::try_get_value!("truncate_words", "end", String, val),
                None => "...".to_string(),
            };

            let words: Vec<&str> = s.split_whitespace().collect();
            if words.len() <= length {
                Ok(tera::Value::String(s))
            } else {
                Ok(tera::Value::String(format!("{}{}", words[..length].join(" "), end)))
            }
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_words_filter() {
        let mut tera = Tera::default();
        register_builtin_filters(&mut tera);
        tera.add_raw_template("t", "{{ text | truncate_words(length=2) }}")
            .unwrap();

        let mut ctx = tera::Context::new();
        ctx.insert("text", "one two three four");
        assert_eq!(tera.render("t", &ctx).unwrap(), "one two...");
    }

    #[test]
    fn test_json_pretty_filter() {
        let mut tera = Tera::default();
        register_builtin_filters(&mut tera);
        tera.add_raw_template("t", "{{ data | json_pretty | safe }}")
            .unwrap();

        let mut ctx = tera::Context::new();
        ctx.insert("data", &serde_json::json!({"a": 1}));
        assert_eq!(tera.render("t", &ctx).unwrap(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_missing_root_builds_empty_engine() {
        let env = ViewEnv::new(
            crate::path::PathResolver::new("/nonexistent/tessera"),
            crate::config::ConfigStore::new(),
            super::super::ExtensionRegistry::new(),
        );
        let tera = TeraRender::build(
            &env,
            "",
            Path::new("/nonexistent/tessera/app/view"),
            &ViewOptions::default(),
        )
        .unwrap();
        assert_eq!(tera.get_template_names().count(), 0);
    }
}

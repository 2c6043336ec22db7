//! Handlebars adapter

use super::extension::EngineHandle;
use super::{EngineCache, EngineKind, RenderAdapter, Target, ViewEnv};
use crate::config::ViewOptions;
use crate::context::RequestContext;
use crate::error::Result;
use crate::request::RenderRequest;
use handlebars::{DirectorySourceOptions, Handlebars};
use std::path::Path;

/// Renders Handlebars templates, one registry per view root
///
/// Every `*.{suffix}` file below the root is registered on construction
/// under its relative path without the suffix, so `user/profile.html` is
/// both the template `user/profile` and the partial `{{> user/profile}}`.
#[derive(Debug, Default)]
pub struct HandlebarsRender {
    engines: EngineCache<Handlebars<'static>>,
}

impl HandlebarsRender {
    /// Create the adapter with an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Engines built so far
    pub fn engines(&self) -> &EngineCache<Handlebars<'static>> {
        &self.engines
    }

    fn build(
        env: &ViewEnv,
        plugin: &str,
        root: &Path,
        options: &ViewOptions,
    ) -> Result<Handlebars<'static>> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(options.strict);
        registry.set_dev_mode(options.dev_mode);
        if options.autoescape == Some(false) {
            registry.register_escape_fn(handlebars::no_escape);
        }

        if root.is_dir() {
            let mut source = DirectorySourceOptions::default();
            source.tpl_extension = format!(".{}", options.view_suffix);
            registry.register_templates_directory(root, source)?;
        }

        env.extensions
            .apply(&env.config, plugin, EngineHandle::Handlebars(&mut registry))?;

        tracing::debug!(
            root = %root.display(),
            templates = registry.get_templates().len(),
            "built handlebars registry"
        );
        Ok(registry)
    }
}

impl RenderAdapter for HandlebarsRender {
    fn kind(&self) -> EngineKind {
        EngineKind::Handlebars
    }

    fn render(
        &self,
        env: &ViewEnv,
        ctx: &RequestContext,
        request: &RenderRequest,
    ) -> Result<String> {
        let target = Target::resolve(env, ctx, request)?;
        let registry = self.engines.get_or_try_init(&target.root, || {
            Self::build(env, &target.plugin, &target.root, &target.options)
        })?;

        Ok(registry.render(&target.name, &target.vars(ctx, request))?)
    }
}

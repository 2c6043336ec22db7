//! MiniJinja adapter

use super::extension::EngineHandle;
use super::{EngineCache, EngineKind, RenderAdapter, Target, ViewEnv};
use crate::config::ViewOptions;
use crate::context::RequestContext;
use crate::error::Result;
use crate::request::RenderRequest;
use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value};
use std::path::Path;

/// Renders MiniJinja templates, one environment per view root
///
/// Templates are loaded lazily from the view root through a path loader and
/// stay compiled inside the environment afterwards.
#[derive(Debug, Default)]
pub struct MiniJinjaRender {
    engines: EngineCache<Environment<'static>>,
}

impl MiniJinjaRender {
    /// Create the adapter with an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Engines built so far
    pub fn engines(&self) -> &EngineCache<Environment<'static>> {
        &self.engines
    }

    fn build(
        env: &ViewEnv,
        plugin: &str,
        root: &Path,
        options: &ViewOptions,
    ) -> Result<Environment<'static>> {
        let mut environment = Environment::new();
        environment.set_loader(minijinja::path_loader(root.to_path_buf()));
        environment.set_trim_blocks(options.trim_blocks);

        if options.strict {
            environment.set_undefined_behavior(UndefinedBehavior::Strict);
        }
        match options.autoescape {
            Some(true) => environment.set_auto_escape_callback(|_| AutoEscape::Html),
            Some(false) => environment.set_auto_escape_callback(|_| AutoEscape::None),
            None => {}
        }

        env.extensions
            .apply(&env.config, plugin, EngineHandle::MiniJinja(&mut environment))?;

        tracing::debug!(root = %root.display(), "built minijinja environment");
        Ok(environment)
    }
}

impl RenderAdapter for MiniJinjaRender {
    fn kind(&self) -> EngineKind {
        EngineKind::MiniJinja
    }

    fn render(
        &self,
        env: &ViewEnv,
        ctx: &RequestContext,
        request: &RenderRequest,
    ) -> Result<String> {
        let target = Target::resolve(env, ctx, request)?;
        let environment = self.engines.get_or_try_init(&target.root, || {
            Self::build(env, &target.plugin, &target.root, &target.options)
        })?;

        let template = environment.get_template(&target.file_name())?;
        let vars = Value::from_serialize(target.vars(ctx, request));
        Ok(template.render(vars)?)
    }
}

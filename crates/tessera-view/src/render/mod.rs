//! Render adapters
//!
//! Every engine sits behind [`RenderAdapter`]: given the shared
//! [`ViewEnv`], the current [`RequestContext`] and a [`RenderRequest`], it
//! returns the rendered string or the engine's error.
//!
//! | Adapter | Engine | Template file |
//! |---------|--------|---------------|
//! | [`RawRender`] | built-in `{{ var }}` interpolation | `{template}.{suffix}` |
//! | [`TeraRender`] | Tera | `{template}.{suffix}` |
//! | [`MiniJinjaRender`] | MiniJinja | `{template}.{suffix}` |
//! | [`HandlebarsRender`] | Handlebars | `{template}.{suffix}` |
//!
//! The three library-backed adapters build one engine per view root on first
//! use and keep it for the lifetime of the adapter.

mod cache;
mod extension;
mod handlebars_engine;
mod minijinja_engine;
mod raw;
mod tera_engine;

pub use cache::EngineCache;
pub use extension::{EngineHandle, ExtensionFn, ExtensionRegistry};
pub use handlebars_engine::HandlebarsRender;
pub use minijinja_engine::MiniJinjaRender;
pub use raw::RawRender;
pub use tera_engine::TeraRender;

use crate::config::{ConfigStore, ViewOptions};
use crate::context::RequestContext;
use crate::error::{Result, ViewError};
use crate::path::PathResolver;
use crate::request::RenderRequest;
use crate::vars::{merge_vars, Vars};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which adapter renders a view (`view.handler`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Built-in interpolation with pre/post-render support
    #[default]
    Raw,
    /// Tera templates
    Tera,
    /// MiniJinja templates
    MiniJinja,
    /// Handlebars templates
    Handlebars,
}

impl EngineKind {
    /// Name used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Tera => "tera",
            Self::MiniJinja => "minijinja",
            Self::Handlebars => "handlebars",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "tera" => Ok(Self::Tera),
            "minijinja" => Ok(Self::MiniJinja),
            "handlebars" => Ok(Self::Handlebars),
            other => Err(ViewError::config(format!("unknown view handler `{}`", other))),
        }
    }
}

/// Application-wide state shared by all adapters
#[derive(Debug, Clone)]
pub struct ViewEnv {
    pub(crate) paths: PathResolver,
    pub(crate) config: ConfigStore,
    pub(crate) extensions: ExtensionRegistry,
}

impl ViewEnv {
    /// Assemble the shared state
    pub fn new(paths: PathResolver, config: ConfigStore, extensions: ExtensionRegistry) -> Self {
        Self {
            paths,
            config,
            extensions,
        }
    }

    /// Path resolver
    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    /// Configuration store
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Registered extension hooks
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }
}

/// The uniform render contract
pub trait RenderAdapter: Send + Sync {
    /// Which engine this adapter drives
    fn kind(&self) -> EngineKind;

    /// Render `request`, falling back to `ctx` for app, plugin and variables
    ///
    /// # Errors
    ///
    /// Returns the engine's error unchanged (wrapped in [`ViewError`]) and
    /// never a partially rendered string.
    fn render(
        &self,
        env: &ViewEnv,
        ctx: &RequestContext,
        request: &RenderRequest,
    ) -> Result<String>;
}

/// Where a library-backed engine should look for a template
#[derive(Debug)]
pub(crate) struct Target {
    pub plugin: String,
    pub root: PathBuf,
    pub name: String,
    pub options: ViewOptions,
}

impl Target {
    pub fn resolve(env: &ViewEnv, ctx: &RequestContext, request: &RenderRequest) -> Result<Self> {
        let template = request
            .template
            .as_deref()
            .ok_or(ViewError::MissingTemplate)?;
        let app = ctx.resolve_app(request.app.as_deref());
        let plugin = ctx.resolve_plugin(request.plugin.as_deref());
        let options = env.config.view_options(&plugin)?;
        let (root, name) = env.paths.locate(template, &app, &plugin);

        Ok(Self {
            name: name.to_string(),
            plugin,
            root,
            options,
        })
    }

    /// Template name with the configured suffix
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.options.view_suffix)
    }

    /// Config defaults, then request-assigned variables, then explicit ones
    pub fn vars(&self, ctx: &RequestContext, request: &RenderRequest) -> Vars {
        merge_vars([&self.options.vars, ctx.vars(), &request.vars])
    }
}

//! Application-level view facade

use crate::config::ConfigStore;
use crate::context::RequestContext;
use crate::error::{Result, ViewError};
use crate::inference::infer_template;
use crate::path::PathResolver;
use crate::render::{
    EngineHandle, EngineKind, ExtensionRegistry, HandlebarsRender, MiniJinjaRender, RawRender,
    RenderAdapter, TeraRender, ViewEnv,
};
use crate::request::RenderRequest;
use crate::vars::Vars;
use std::path::PathBuf;
use std::sync::Arc;

/// Entry point for rendering views
///
/// Owns the configuration, the path resolver, the registered extension
/// hooks and one adapter per engine together with its engine cache. Cloning
/// is cheap, so `Views` can be shared as application state.
///
/// # Example
///
/// ```rust,no_run
/// use tessera_view::{ConfigStore, RenderRequest, RequestContext, Views};
///
/// let views = Views::builder("/srv/app")
///     .config(ConfigStore::from_toml_file("/srv/app/config/view.toml")?)
///     .build();
///
/// let mut ctx = RequestContext::new().with_app("admin");
/// ctx.assign("user", "alice");
///
/// let html = views.render(&ctx, RenderRequest::new("dashboard/index"))?;
/// # Ok::<(), tessera_view::ViewError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Views {
    inner: Arc<ViewsInner>,
}

#[derive(Debug)]
struct ViewsInner {
    env: ViewEnv,
    raw: RawRender,
    tera: TeraRender,
    minijinja: MiniJinjaRender,
    handlebars: HandlebarsRender,
}

impl Views {
    /// Views rooted at `base_path` with empty configuration
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self::builder(base_path).build()
    }

    /// Start configuring views rooted at `base_path`
    pub fn builder(base_path: impl Into<PathBuf>) -> ViewsBuilder {
        ViewsBuilder::new(base_path)
    }

    /// Shared state handed to adapters
    pub fn env(&self) -> &ViewEnv {
        &self.inner.env
    }

    /// Configuration store
    pub fn config(&self) -> &ConfigStore {
        self.inner.env.config()
    }

    /// Path resolver
    pub fn paths(&self) -> &PathResolver {
        self.inner.env.paths()
    }

    /// Raw adapter
    pub fn raw(&self) -> &RawRender {
        &self.inner.raw
    }

    /// Tera adapter
    pub fn tera(&self) -> &TeraRender {
        &self.inner.tera
    }

    /// MiniJinja adapter
    pub fn minijinja(&self) -> &MiniJinjaRender {
        &self.inner.minijinja
    }

    /// Handlebars adapter
    pub fn handlebars(&self) -> &HandlebarsRender {
        &self.inner.handlebars
    }

    /// Adapter for an engine
    pub fn adapter(&self, kind: EngineKind) -> &dyn RenderAdapter {
        match kind {
            EngineKind::Raw => &self.inner.raw,
            EngineKind::Tera => &self.inner.tera,
            EngineKind::MiniJinja => &self.inner.minijinja,
            EngineKind::Handlebars => &self.inner.handlebars,
        }
    }

    /// Engine configured for a plugin (`view.handler`, default raw)
    pub fn handler(&self, plugin: &str) -> Result<EngineKind> {
        Ok(self
            .config()
            .plugin_get_as::<EngineKind>(plugin, "view.handler")?
            .unwrap_or_default())
    }

    /// Fill in the plugin and, when missing, the template name
    ///
    /// The template is inferred from the request's controller and action,
    /// with `app.controller_suffix` stripped from the controller name.
    pub fn resolve_inputs(
        &self,
        ctx: &RequestContext,
        mut request: RenderRequest,
    ) -> Result<RenderRequest> {
        let plugin = ctx.resolve_plugin(request.plugin.as_deref());

        if request.template.is_none() {
            let controller = ctx.controller().ok_or(ViewError::MissingTemplate)?;
            let suffix = self
                .config()
                .plugin_get_as::<String>(&plugin, "app.controller_suffix")?
                .unwrap_or_default();
            request.template = Some(infer_template(controller, ctx.action(), &suffix));
        }

        request.plugin = Some(plugin);
        Ok(request)
    }

    /// Render with the engine configured for the request's plugin
    pub fn render(&self, ctx: &RequestContext, request: RenderRequest) -> Result<String> {
        let request = self.resolve_inputs(ctx, request)?;
        let kind = self.handler(request.plugin.as_deref().unwrap_or(""))?;
        self.render_resolved(kind, ctx, &request)
    }

    /// Render with a specific engine
    pub fn render_with(
        &self,
        kind: EngineKind,
        ctx: &RequestContext,
        request: RenderRequest,
    ) -> Result<String> {
        let request = self.resolve_inputs(ctx, request)?;
        self.render_resolved(kind, ctx, &request)
    }

    /// Render a system template (`success`, `error`) with the raw engine
    pub fn render_system(&self, ctx: &RequestContext, name: &str, data: &Vars) -> Result<String> {
        self.inner.raw.render_system(&self.inner.env, ctx, name, data)
    }

    fn render_resolved(
        &self,
        kind: EngineKind,
        ctx: &RequestContext,
        request: &RenderRequest,
    ) -> Result<String> {
        tracing::debug!(
            engine = %kind,
            template = request.template.as_deref().unwrap_or(""),
            app = request.app.as_deref().unwrap_or(ctx.app()),
            plugin = request.plugin.as_deref().unwrap_or(""),
            "rendering view"
        );
        self.adapter(kind).render(&self.inner.env, ctx, request)
    }
}

/// Builder for [`Views`]
#[derive(Debug)]
pub struct ViewsBuilder {
    paths: PathResolver,
    config: ConfigStore,
    extensions: ExtensionRegistry,
}

impl ViewsBuilder {
    /// Builder rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathResolver::new(base_path),
            config: ConfigStore::new(),
            extensions: ExtensionRegistry::new(),
        }
    }

    /// Application directory, `{base_path}/app` by default
    pub fn app_path(mut self, app_path: impl Into<PathBuf>) -> Self {
        self.paths = self.paths.with_app_path(app_path);
        self
    }

    /// Configuration store
    pub fn config(mut self, config: ConfigStore) -> Self {
        self.config = config;
        self
    }

    /// Register an extension hook that `view.extension` can name
    pub fn extension<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(EngineHandle<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.extensions.register(name, hook);
        self
    }

    /// Finish building
    pub fn build(self) -> Views {
        Views {
            inner: Arc::new(ViewsInner {
                env: ViewEnv::new(self.paths, self.config, self.extensions),
                raw: RawRender::new(),
                tera: TeraRender::new(),
                minijinja: MiniJinjaRender::new(),
                handlebars: HandlebarsRender::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_defaults_to_raw() {
        let views = Views::new("/srv");
        assert_eq!(views.handler("").unwrap(), EngineKind::Raw);
    }

    #[test]
    fn test_handler_per_plugin() {
        let views = Views::builder("/srv")
            .config(
                ConfigStore::new()
                    .with("view.handler", "tera")
                    .with("plugin.shop.view.handler", "handlebars"),
            )
            .build();

        assert_eq!(views.handler("").unwrap(), EngineKind::Tera);
        assert_eq!(views.handler("shop").unwrap(), EngineKind::Handlebars);
        assert_eq!(views.handler("blog").unwrap(), EngineKind::Tera);
    }

    #[test]
    fn test_unknown_handler_is_config_error() {
        let views = Views::builder("/srv")
            .config(ConfigStore::new().with("view.handler", "smarty"))
            .build();
        assert!(matches!(views.handler(""), Err(ViewError::Config(_))));
    }

    #[test]
    fn test_resolve_inputs_infers_template() {
        let views = Views::builder("/srv")
            .config(ConfigStore::new().with("app.controller_suffix", "Controller"))
            .build();
        let ctx = RequestContext::new()
            .with_plugin("pay")
            .with_controller("app::controller::OrderItemController", "showAll");

        let request = views.resolve_inputs(&ctx, RenderRequest::inferred()).unwrap();
        assert_eq!(request.template.as_deref(), Some("order_item/show_all"));
        assert_eq!(request.plugin.as_deref(), Some("pay"));
    }

    #[test]
    fn test_resolve_inputs_uses_plugin_suffix() {
        let views = Views::builder("/srv")
            .config(
                ConfigStore::new()
                    .with("app.controller_suffix", "Controller")
                    .with("plugin.pay.app.controller_suffix", "Ctl"),
            )
            .build();
        let ctx = RequestContext::new().with_controller("PaymentCtl", "index");

        let request = views
            .resolve_inputs(&ctx, RenderRequest::inferred().plugin("pay"))
            .unwrap();
        assert_eq!(request.template.as_deref(), Some("payment/index"));
    }

    #[test]
    fn test_resolve_inputs_keeps_explicit_template() {
        let views = Views::new("/srv");
        let ctx = RequestContext::new().with_controller("IndexController", "index");

        let request = views.resolve_inputs(&ctx, RenderRequest::new("custom/page")).unwrap();
        assert_eq!(request.template.as_deref(), Some("custom/page"));
    }

    #[test]
    fn test_missing_template_without_controller() {
        let views = Views::new("/srv");
        let err = views
            .render(&RequestContext::new(), RenderRequest::inferred())
            .unwrap_err();
        assert!(matches!(err, ViewError::MissingTemplate));
    }

    #[test]
    fn test_views_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Views>();
    }
}

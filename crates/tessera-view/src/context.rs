//! Request-scoped view state

use crate::request::RenderDescriptor;
use crate::vars::{self, Vars};
use http::Extensions;
use serde_json::Value;

/// Per-request state the view layer reads from
///
/// Carries the routing facts used to locate templates (`app`, `plugin`,
/// `controller`, `action`), the variables assigned during the request, and
/// templates queued around the main render. Create one per request, or
/// store it in the request's [`Extensions`] and pull it back out with
/// [`RequestContext::from_extensions`].
///
/// # Example
///
/// ```rust
/// use tessera_view::RequestContext;
///
/// let mut ctx = RequestContext::new()
///     .with_app("admin")
///     .with_controller("app::admin::controller::UserController", "index");
/// ctx.assign("title", "Users");
///
/// assert_eq!(ctx.vars().get("title").and_then(|v| v.as_str()), Some("Users"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    app: Option<String>,
    plugin: Option<String>,
    controller: Option<String>,
    action: Option<String>,
    vars: Vars,
    pre_renders: Vec<RenderDescriptor>,
    post_renders: Vec<RenderDescriptor>,
}

impl RequestContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone the context stored in `extensions`, or an empty one
    pub fn from_extensions(extensions: &Extensions) -> Self {
        extensions.get::<RequestContext>().cloned().unwrap_or_default()
    }

    /// Store this context in `extensions`
    pub fn insert_into(self, extensions: &mut Extensions) {
        extensions.insert(self);
    }

    /// Set the app this request was routed to
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Set the plugin this request was routed to
    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// Set the controller type path and action name
    pub fn with_controller(
        mut self,
        controller: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        self.controller = Some(controller.into());
        self.action = Some(action.into());
        self
    }

    /// App segment, empty when unset
    pub fn app(&self) -> &str {
        self.app.as_deref().unwrap_or("")
    }

    /// Plugin segment, empty when unset
    pub fn plugin(&self) -> &str {
        self.plugin.as_deref().unwrap_or("")
    }

    /// Controller type path
    pub fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    /// Action name
    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or("")
    }

    /// Assign one variable, replacing any previous value
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Assign many variables at once, replacing previous values
    pub fn assign_all(&mut self, vars: Vars) {
        self.vars.extend(vars);
    }

    /// Assign many variables, merging maps and arrays with existing values
    pub fn assign_recursive(&mut self, vars: Vars) {
        vars::merge_recursive(&mut self.vars, vars);
    }

    /// Variables assigned so far
    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    /// Queue a template to render before the main one (raw engine)
    pub fn add_pre_render(&mut self, descriptor: RenderDescriptor) {
        self.pre_renders.push(descriptor);
    }

    /// Queue a template to render after the main one (raw engine)
    pub fn add_post_render(&mut self, descriptor: RenderDescriptor) {
        self.post_renders.push(descriptor);
    }

    /// Templates queued before the main one
    pub fn pre_renders(&self) -> &[RenderDescriptor] {
        &self.pre_renders
    }

    /// Templates queued after the main one
    pub fn post_renders(&self) -> &[RenderDescriptor] {
        &self.post_renders
    }

    /// App to render for: the explicit one, else this request's
    pub(crate) fn resolve_app(&self, app: Option<&str>) -> String {
        app.unwrap_or_else(|| self.app()).to_string()
    }

    /// Plugin to render for: the explicit one, else this request's
    pub(crate) fn resolve_plugin(&self, plugin: Option<&str>) -> String {
        plugin.unwrap_or_else(|| self.plugin()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assign_overrides() {
        let mut ctx = RequestContext::new();
        ctx.assign("a", 1);
        ctx.assign("a", 2);
        assert_eq!(ctx.vars().get("a"), Some(&json!(2)));
    }

    #[test]
    fn test_assign_recursive_merges() {
        let mut ctx = RequestContext::new();
        ctx.assign("menu", json!({"home": "/"}));

        let mut more = Vars::new();
        more.insert("menu".to_string(), json!({"blog": "/blog"}));
        ctx.assign_recursive(more);

        assert_eq!(ctx.vars().get("menu"), Some(&json!({"home": "/", "blog": "/blog"})));
    }

    #[test]
    fn test_resolution_falls_back_to_request() {
        let ctx = RequestContext::new().with_app("shop").with_plugin("pay");

        assert_eq!(ctx.resolve_app(None), "shop");
        assert_eq!(ctx.resolve_app(Some("")), "");
        assert_eq!(ctx.resolve_app(Some("blog")), "blog");
        assert_eq!(ctx.resolve_plugin(None), "pay");
        assert_eq!(ctx.resolve_plugin(Some("")), "");
    }

    #[test]
    fn test_extensions_round_trip() {
        let mut extensions = Extensions::new();
        let mut ctx = RequestContext::new().with_app("shop");
        ctx.assign("user", "alice");
        ctx.insert_into(&mut extensions);

        let restored = RequestContext::from_extensions(&extensions);
        assert_eq!(restored.app(), "shop");
        assert_eq!(restored.vars().get("user"), Some(&json!("alice")));

        assert_eq!(RequestContext::from_extensions(&Extensions::new()).app(), "");
    }
}

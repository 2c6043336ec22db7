//! Render requests and pre/post-render descriptors

use crate::vars::Vars;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One call to a render adapter
///
/// `app` and `plugin` distinguish "not given" (`None`, taken from the
/// current request) from an explicit empty segment (`Some("")`).
///
/// # Example
///
/// ```rust
/// use tessera_view::RenderRequest;
///
/// let request = RenderRequest::new("user/profile")
///     .var("name", "Alice")
///     .app("admin");
///
/// assert_eq!(request.template.as_deref(), Some("user/profile"));
/// assert_eq!(request.app.as_deref(), Some("admin"));
/// assert!(request.plugin.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderRequest {
    /// Template name without suffix; `None` infers it from the controller
    pub template: Option<String>,
    /// Explicit variables, highest precedence
    pub vars: Vars,
    /// App segment
    pub app: Option<String>,
    /// Plugin segment
    pub plugin: Option<String>,
}

impl RenderRequest {
    /// Render a named template
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
            ..Default::default()
        }
    }

    /// Render the template inferred from the current controller and action
    pub fn inferred() -> Self {
        Self::default()
    }

    /// Set one variable
    pub fn var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Replace all variables
    pub fn vars(mut self, vars: Vars) -> Self {
        self.vars = vars;
        self
    }

    /// Set the app segment
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Set the plugin segment
    pub fn plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }
}

/// A template rendered around the main one by the raw engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDescriptor {
    /// Template name; empty descriptors are ignored
    pub template: String,
    /// Variables contributed to the render
    pub vars: Vars,
    /// App segment, `None` for the current request's app
    pub app: Option<String>,
    /// Plugin segment, `None` for the current request's plugin
    pub plugin: Option<String>,
}

impl RenderDescriptor {
    /// Describe a template
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Default::default()
        }
    }

    /// Set the app segment
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Set the plugin segment
    pub fn plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    /// Set one variable
    pub fn var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

/// Drop empty and repeated descriptors, keeping the first occurrence
pub(crate) fn dedup_descriptors<'a>(
    descriptors: impl IntoIterator<Item = &'a RenderDescriptor>,
) -> Vec<&'a RenderDescriptor> {
    let mut unique: Vec<&RenderDescriptor> = Vec::new();
    for descriptor in descriptors {
        if descriptor.template.is_empty() || unique.contains(&descriptor) {
            continue;
        }
        unique.push(descriptor);
    }
    unique
}

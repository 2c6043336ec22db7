//! Direct-inclusion renderer
//!
//! Template files are read from disk and their `{{ name }}` tags replaced
//! with variable values. Dotted paths reach into maps and arrays
//! (`{{ user.name }}`, `{{ items.0 }}`), a quoted literal is emitted as-is
//! (`{{ "{{" }}`), and unknown variables render as nothing. Values are
//! inserted unescaped.
//!
//! Around the main template the renderer includes the configured
//! `view.options.pre_renders` and `view.options.post_renders` plus any
//! descriptors queued on the request, in the order pre, main, post. Missing
//! files are skipped. Output is collected in a local buffer that is only
//! returned once every template rendered.

use super::{EngineKind, RenderAdapter, ViewEnv};
use crate::context::RequestContext;
use crate::error::{Result, ViewError};
use crate::request::{dedup_descriptors, RenderDescriptor, RenderRequest};
use crate::vars::{merge_vars, Vars};
use serde_json::Value;
use std::io::ErrorKind;
use std::iter;
use std::path::{Path, PathBuf};

const SUCCESS_TEMPLATE: &str = include_str!("../../templates/success.html");
const ERROR_TEMPLATE: &str = include_str!("../../templates/error.html");

/// Renderer for plain template files
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRender;

impl RawRender {
    /// Create the renderer
    pub fn new() -> Self {
        Self
    }

    /// Render a system template such as `success` or `error`
    ///
    /// `view.templates.system.{name}` may point at a replacement file
    /// (relative paths are taken from the project root); otherwise the
    /// built-in template is used. Values are HTML-escaped.
    pub fn render_system(
        &self,
        env: &ViewEnv,
        ctx: &RequestContext,
        name: &str,
        data: &Vars,
    ) -> Result<String> {
        let key = format!("view.templates.system.{}", name);
        let vars = merge_vars([ctx.vars(), data]);
        let mut buffer = String::new();

        match env.config.plugin_get_as::<PathBuf>(ctx.plugin(), &key)? {
            Some(path) => {
                let path = env.paths.base_path().join(path);
                let source = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
                    ErrorKind::NotFound => ViewError::TemplateNotFound(path.clone()),
                    _ => ViewError::io(&path, e),
                })?;
                interpolate(name, &source, &vars, true, &mut buffer)?;
            }
            None => {
                let source = builtin_system_template(name)
                    .ok_or_else(|| ViewError::TemplateNotFound(PathBuf::from(name)))?;
                interpolate(name, source, &vars, true, &mut buffer)?;
            }
        }

        Ok(buffer)
    }

    fn path_of(
        env: &ViewEnv,
        ctx: &RequestContext,
        descriptor: &RenderDescriptor,
    ) -> Result<PathBuf> {
        let app = ctx.resolve_app(descriptor.app.as_deref());
        let plugin = ctx.resolve_plugin(descriptor.plugin.as_deref());
        let suffix = env.config.view_options(&plugin)?.view_suffix;
        Ok(env.paths.build(&descriptor.template, &app, &plugin, &suffix))
    }
}

impl RenderAdapter for RawRender {
    fn kind(&self) -> EngineKind {
        EngineKind::Raw
    }

    fn render(
        &self,
        env: &ViewEnv,
        ctx: &RequestContext,
        request: &RenderRequest,
    ) -> Result<String> {
        let template = request
            .template
            .as_deref()
            .ok_or(ViewError::MissingTemplate)?;
        let plugin = ctx.resolve_plugin(request.plugin.as_deref());
        let options = env.config.view_options(&plugin)?;

        let pre = dedup_descriptors(options.pre_renders.iter().chain(ctx.pre_renders()));
        let post = dedup_descriptors(options.post_renders.iter().chain(ctx.post_renders()));

        let vars = merge_vars(
            iter::once(&options.vars)
                .chain(pre.iter().map(|d| &d.vars))
                .chain(post.iter().map(|d| &d.vars))
                .chain([ctx.vars(), &request.vars]),
        );

        let main = RenderDescriptor {
            template: template.to_string(),
            vars: Vars::new(),
            app: request.app.clone(),
            plugin: Some(plugin),
        };

        let mut buffer = String::new();
        for descriptor in pre.into_iter().chain(iter::once(&main)).chain(post) {
            let path = Self::path_of(env, ctx, descriptor)?;
            include(&path, &descriptor.template, &vars, &mut buffer)?;
        }

        Ok(buffer)
    }
}

fn builtin_system_template(name: &str) -> Option<&'static str> {
    match name {
        "success" => Some(SUCCESS_TEMPLATE),
        "error" => Some(ERROR_TEMPLATE),
        _ => None,
    }
}

fn include(path: &Path, template: &str, vars: &Vars, buffer: &mut String) -> Result<()> {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(template, path = %path.display(), "template file missing, skipped");
            return Ok(());
        }
        Err(e) => return Err(ViewError::io(path, e)),
    };
    interpolate(template, &source, vars, false, buffer)
}

/// Expand `{{ ... }}` tags in `source` into `buffer`
pub(crate) fn interpolate(
    template: &str,
    source: &str,
    vars: &Vars,
    escape: bool,
    buffer: &mut String,
) -> Result<()> {
    let syntax = |message: &str| ViewError::Syntax {
        template: template.to_string(),
        message: message.to_string(),
    };

    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        buffer.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| syntax("unclosed `{{` tag"))?;
        let expr = after[..end].trim();

        if let Some(literal) = string_literal(expr) {
            buffer.push_str(literal);
        } else if expr.is_empty() {
            return Err(syntax("empty `{{ }}` tag"));
        } else if !is_var_path(expr) {
            return Err(syntax(&format!("invalid variable `{}`", expr)));
        } else if let Some(value) = lookup(vars, expr) {
            let text = format_value(value);
            if escape {
                push_escaped(buffer, &text);
            } else {
                buffer.push_str(&text);
            }
        }

        rest = &after[end + 2..];
    }
    buffer.push_str(rest);
    Ok(())
}

fn string_literal(expr: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        expr.strip_prefix(quote)?
            .strip_suffix(quote)
    })
}

fn is_var_path(expr: &str) -> bool {
    expr.split('.').all(|part| {
        !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_')
    })
}

fn lookup<'a>(vars: &'a Vars, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = vars.get(parts.next()?)?;

    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn push_escaped(buffer: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => buffer.push_str("&amp;"),
            '<' => buffer.push_str("&lt;"),
            '>' => buffer.push_str("&gt;"),
            '"' => buffer.push_str("&quot;"),
            '\'' => buffer.push_str("&#x27;"),
            _ => buffer.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> Vars {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn render(source: &str, data: Value) -> Result<String> {
        let mut buffer = String::new();
        interpolate("test", source, &vars(data), false, &mut buffer)?;
        Ok(buffer)
    }

    #[test]
    fn test_interpolates_values() {
        let out = render(
            "Hello, {{ name }}! You have {{count}} messages.",
            json!({"name": "Alice", "count": 3}),
        )
        .unwrap();
        assert_eq!(out, "Hello, Alice! You have 3 messages.");
    }

    #[test]
    fn test_nested_paths() {
        let out = render(
            "{{ user.email }} / {{ items.1 }}",
            json!({"user": {"email": "a@example.com"}, "items": ["x", "y"]}),
        )
        .unwrap();
        assert_eq!(out, "a@example.com / y");
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        assert_eq!(render("[{{ nothing }}]", json!({})).unwrap(), "[]");
    }

    #[test]
    fn test_literal_tag() {
        assert_eq!(render("{{ \"{{\" }} raw", json!({})).unwrap(), "{{ raw");
    }

    #[test]
    fn test_unclosed_tag_is_syntax_error() {
        let err = render("Hello {{ name", json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, ViewError::Syntax { .. }));
    }

    #[test]
    fn test_invalid_variable_is_syntax_error() {
        assert!(render("{{ a b }}", json!({})).is_err());
        assert!(render("{{ }}", json!({})).is_err());
        assert!(render("{{ a..b }}", json!({})).is_err());
    }

    #[test]
    fn test_values_are_not_escaped() {
        assert_eq!(render("{{ html }}", json!({"html": "<b>"})).unwrap(), "<b>");
    }

    #[test]
    fn test_escaping_when_requested() {
        let mut buffer = String::new();
        let data = vars(json!({"msg": "<a href=\"x\">"}));
        interpolate("sys", "{{ msg }}", &data, true, &mut buffer).unwrap();
        assert_eq!(buffer, "&lt;a href=&quot;x&quot;&gt;");
    }

    #[test]
    fn test_builtin_system_templates_exist() {
        assert!(builtin_system_template("success").is_some());
        assert!(builtin_system_template("error").is_some());
        assert!(builtin_system_template("teapot").is_none());
    }
}

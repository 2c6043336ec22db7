//! Template path resolution
//!
//! Templates live at `{root}[/plugin/{plugin}]/app[/{app}]/view/{template}.{suffix}`.
//! A template name starting with `/` is taken relative to the project root
//! instead, ignoring app and plugin.

use std::path::{Path, PathBuf};

/// Maps template names onto the project's directory layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    base_path: PathBuf,
    app_path: PathBuf,
}

impl PathResolver {
    /// Resolver rooted at `base_path`, with the application under `{base_path}/app`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        let app_path = base_path.join("app");
        Self {
            base_path,
            app_path,
        }
    }

    /// Override the application directory
    pub fn with_app_path(mut self, app_path: impl Into<PathBuf>) -> Self {
        self.app_path = app_path.into();
        self
    }

    /// Project root
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Application directory
    pub fn app_path(&self) -> &Path {
        &self.app_path
    }

    /// Directory holding the apps of a plugin, or the main application directory
    pub fn base_view_path(&self, plugin: &str) -> PathBuf {
        if plugin.is_empty() {
            self.app_path.clone()
        } else {
            self.base_path.join("plugin").join(plugin).join("app")
        }
    }

    /// Directory holding the templates of an app
    pub fn view_root(&self, app: &str, plugin: &str) -> PathBuf {
        let base = self.base_view_path(plugin);
        if app.is_empty() {
            base.join("view")
        } else {
            base.join(app).join("view")
        }
    }

    /// Full path of a template file
    pub fn build(&self, template: &str, app: &str, plugin: &str, suffix: &str) -> PathBuf {
        let (root, name) = self.locate(template, app, plugin);
        let path = root.join(format!("{}.{}", name, suffix));
        tracing::trace!(template, app, plugin, path = %path.display(), "resolved template path");
        path
    }

    /// Engine root directory and the template name relative to it
    pub fn locate<'t>(&self, template: &'t str, app: &str, plugin: &str) -> (PathBuf, &'t str) {
        match template.strip_prefix('/') {
            Some(absolute) => (self.base_path.clone(), absolute),
            None => (self.view_root(app, plugin), template),
        }
    }
}

//! Error types for view rendering

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for view operations
pub type Result<T, E = ViewError> = std::result::Result<T, E>;

/// Error returned by every render adapter and by the [`Views`](crate::Views) facade
///
/// Engine errors are wrapped unchanged so callers can still downcast to the
/// underlying engine error through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum ViewError {
    /// Tera failed to load or render a template
    #[error("tera error: {0}")]
    Tera(#[from] tera::Error),

    /// MiniJinja failed to load or render a template
    #[error("minijinja error: {0}")]
    MiniJinja(#[from] minijinja::Error),

    /// Handlebars failed while rendering
    #[error("handlebars render error: {0}")]
    Handlebars(#[from] handlebars::RenderError),

    /// Handlebars failed while compiling templates
    #[error("handlebars template error: {0}")]
    HandlebarsTemplate(#[from] handlebars::TemplateError),

    /// Malformed raw template
    #[error("syntax error in {template}: {message}")]
    Syntax {
        /// Template that failed to parse
        template: String,
        /// What went wrong
        message: String,
    },

    /// A template file that must exist was not found
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// No template was given and none could be inferred
    #[error("no template given and no controller to infer one from")]
    MissingTemplate,

    /// Reading a template from disk failed
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or has the wrong shape
    #[error("configuration error: {0}")]
    Config(String),

    /// `view.extension` names a hook that was never registered
    #[error("unknown view extension: {0}")]
    UnknownExtension(String),

    /// Template variables could not be converted for an engine
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ViewError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a serialization error
    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for ViewError {
    fn from(err: serde_json::Error) -> Self {
        ViewError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ViewError {
    fn from(err: toml::de::Error) -> Self {
        ViewError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_keeps_source() {
        let err = ViewError::io(
            "/tmp/missing.html",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("/tmp/missing.html"));
    }

    #[test]
    fn test_syntax_error_message() {
        let err = ViewError::Syntax {
            template: "index".to_string(),
            message: "unclosed tag".to_string(),
        };
        assert_eq!(err.to_string(), "syntax error in index: unclosed tag");
    }
}

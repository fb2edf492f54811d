//! Prompt template rendering
//!
//! Templates are plain tera files, one per template, in a directory fixed at
//! construction. Lookups re-resolve the file on every render, so template
//! edits take effect without restarting; nothing is cached at this level.

use std::path::{Path, PathBuf};

use tera::Tera;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TemplatesConfig;

/// File suffix expected on template files; appended to names that lack it
pub const TEMPLATE_SUFFIX: &str = ".tera";

/// Error type for template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The templates directory did not exist at construction
    #[error("Templates directory not configured or missing: {dir}")]
    NotConfigured {
        /// The configured directory
        dir: PathBuf,
    },

    /// No file for the requested template
    #[error("Template '{template}' not found in {dir}")]
    NotFound {
        /// The normalized template name
        template: String,
        /// The configured directory
        dir: PathBuf,
    },

    /// Substitution failed
    #[error("Template rendering failed: {0}")]
    Render(String),
}

/// Context of named substitution variables
///
/// Thin wrapper over the tera context so the engine type stays internal.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    inner: tera::Context,
}

impl TemplateContext {
    /// Create an empty context
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tera::Context::new(),
        }
    }

    /// Create a context with `text` bound, the variable every pipeline
    /// template substitutes
    #[must_use]
    pub fn with_text(text: &str) -> Self {
        let mut ctx = Self::new();
        ctx.insert("text", &text);
        ctx
    }

    /// Insert a value under a name
    pub fn insert<T: serde::Serialize>(&mut self, key: &str, value: &T) {
        self.inner.insert(key, value);
    }
}

/// Directory of named prompt templates
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    /// `None` when the configured directory was missing at construction
    root: Option<PathBuf>,
    configured_dir: PathBuf,
}

impl PromptLibrary {
    /// Create a library over the configured directory
    ///
    /// A missing directory is detected here, once; every later render then
    /// fails with [`TemplateError::NotConfigured`].
    #[must_use]
    pub fn new(config: &TemplatesConfig) -> Self {
        let configured_dir = config.directory.clone();
        let root = if configured_dir.is_dir() {
            Some(configured_dir.clone())
        } else {
            warn!(dir = %configured_dir.display(), "Templates directory not found");
            None
        };
        Self {
            root,
            configured_dir,
        }
    }

    /// Whether the templates directory existed at construction
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.root.is_some()
    }

    /// Normalize a template name by appending the file suffix when missing
    #[must_use]
    pub fn normalize_name(name: &str) -> String {
        if name.ends_with(TEMPLATE_SUFFIX) {
            name.to_string()
        } else {
            format!("{name}{TEMPLATE_SUFFIX}")
        }
    }

    /// Resolve a template name to its backing file
    fn resolve(&self, name: &str) -> Result<PathBuf, TemplateError> {
        let root = self.root.as_deref().ok_or_else(|| {
            TemplateError::NotConfigured {
                dir: self.configured_dir.clone(),
            }
        })?;

        let normalized = Self::normalize_name(name);
        let path = root.join(&normalized);
        if path.is_file() {
            Ok(path)
        } else {
            Err(TemplateError::NotFound {
                template: normalized,
                dir: root.to_path_buf(),
            })
        }
    }

    /// Render a template with the given context
    ///
    /// The template file is re-read on every call.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::NotConfigured`] when the directory was missing
    /// - [`TemplateError::NotFound`] when the template file is absent
    /// - [`TemplateError::Render`] when substitution fails
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String, TemplateError> {
        let path = self.resolve(name)?;

        debug!(template = %path.display(), "Rendering prompt template");

        let source = std::fs::read_to_string(&path)
            .map_err(|e| TemplateError::Render(format!("{}: {e}", path.display())))?;

        Tera::one_off(&source, &context.inner, false)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }

    /// Render a template with only the `text` variable bound
    pub fn render_text(&self, name: &str, text: &str) -> Result<String, TemplateError> {
        self.render(name, &TemplateContext::with_text(text))
    }

    /// List the template names currently present in the directory
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let Some(root) = self.root.as_deref() else {
            return Vec::new();
        };
        let Ok(entries) = std::fs::read_dir(root) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(TEMPLATE_SUFFIX))
            .collect();
        names.sort();
        names
    }
}

/// Helper shared by tests and callers probing a directory
impl PromptLibrary {
    /// Create a library rooted at an explicit directory
    #[must_use]
    pub fn at(dir: impl AsRef<Path>) -> Self {
        Self::new(&TemplatesConfig {
            directory: dir.as_ref().to_path_buf(),
            ..TemplatesConfig::default()
        })
    }
}

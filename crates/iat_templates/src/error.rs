//! Error types for template bundle builds.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while loading, checking or building templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Invalid JSON in {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required manifest key: '{0}'")]
    MissingKey(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Fragment '{fragment}' not found for template {template}")]
    FragmentNotFound { fragment: String, template: String },

    #[error("Expected asset '{asset}' missing in template directory {}", .template_dir.display())]
    AssetNotFound { asset: String, template_dir: PathBuf },

    #[error("No templates directory found at {}. Add at least one template before building.", .0.display())]
    NoTemplatesDirectory(PathBuf),

    #[error("No templates found under {}", .0.display())]
    NoTemplatesFound(PathBuf),

    #[error("Error building {template}: {source}")]
    BuildFailed {
        template: String,
        #[source]
        source: Box<TemplateError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Copy error: {0}")]
    Copy(#[from] fs_extra::error::Error),
}

impl TemplateError {
    /// Whether this error means a fragment was absent from every search location.
    pub fn is_fragment_not_found(&self) -> bool {
        matches!(self, TemplateError::FragmentNotFound { .. })
    }
}

//! Fragment lookup with per-template overrides.
//!
//! A fragment is searched in three places, first match wins:
//! 1. the template directory itself
//! 2. the template's `fragments/` subdirectory
//! 3. the shared fragments directory

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{TemplateError, TemplateResult};

/// Name of the per-template fragments subdirectory.
pub const TEMPLATE_FRAGMENTS_DIR: &str = "fragments";

/// Locates fragment files for a template.
#[derive(Debug, Clone)]
pub struct FragmentResolver {
    fragments_dir: PathBuf,
}

impl FragmentResolver {
    /// Create a resolver falling back to the given shared fragments directory.
    pub fn new(fragments_dir: impl Into<PathBuf>) -> Self {
        Self {
            fragments_dir: fragments_dir.into(),
        }
    }

    /// The shared fragments directory.
    pub fn fragments_dir(&self) -> &Path {
        &self.fragments_dir
    }

    /// Candidate paths for a fragment, in search order.
    pub fn candidates(&self, fragment: &str, template_dir: &Path) -> [PathBuf; 3] {
        [
            template_dir.join(fragment),
            template_dir.join(TEMPLATE_FRAGMENTS_DIR).join(fragment),
            self.fragments_dir.join(fragment),
        ]
    }

    /// Path of the fragment that would be used for this template.
    pub fn locate(&self, fragment: &str, template_dir: &Path) -> TemplateResult<PathBuf> {
        self.candidates(fragment, template_dir)
            .into_iter()
            .find(|path| path.exists())
            .ok_or_else(|| TemplateError::FragmentNotFound {
                fragment: fragment.to_string(),
                template: template_name(template_dir),
            })
    }

    /// Read the fragment that would be used for this template.
    pub fn resolve(&self, fragment: &str, template_dir: &Path) -> TemplateResult<String> {
        let path = self.locate(fragment, template_dir)?;
        debug!("Using fragment {:?}", path);
        Ok(fs::read_to_string(&path)?)
    }
}

/// Display name of a template: its directory name.
pub fn template_name(template_dir: &Path) -> String {
    template_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| template_dir.display().to_string())
}

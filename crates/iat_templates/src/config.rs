//! Build configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source templates, relative to the project root.
pub const TEMPLATES_DIR: &str = "templates";

/// Entries marking the project root: its templates directory or a
/// repository checkout. Package manifests are not anchors, since a workspace
/// member has its own.
pub const PROJECT_ANCHORS: &[&str] = &[TEMPLATES_DIR, ".git"];
/// Shared fragments, relative to the project root.
pub const FRAGMENTS_DIR: &str = "src/fragments";
/// Generated bundles, relative to the project root.
pub const OUTPUT_DIR: &str = "dist/templates";

/// Paths used by a build run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Project root the default paths are derived from
    pub project_root: PathBuf,
    /// Directory holding one subdirectory per template
    pub templates_dir: PathBuf,
    /// Shared fragments used when a template does not override them
    pub fragments_dir: PathBuf,
    /// Directory the bundles are written to
    pub output_dir: PathBuf,
}

impl BuildConfig {
    /// Default layout below the given project root.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let project_root = root.into();
        Self {
            templates_dir: project_root.join(TEMPLATES_DIR),
            fragments_dir: project_root.join(FRAGMENTS_DIR),
            output_dir: project_root.join(OUTPUT_DIR),
            project_root,
        }
    }

    /// Find the project root from `start` upwards and use its default layout.
    pub fn discover(start: &Path) -> Self {
        let root = find_project_root(start).unwrap_or_else(|| start.to_path_buf());
        debug!("Using project root {:?}", root);
        Self::from_root(root)
    }

    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = dir.into();
        self
    }

    pub fn with_fragments_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fragments_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

/// First directory at or above `start` containing one of [`PROJECT_ANCHORS`].
///
/// A `templates` entry only counts when it is a directory.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| is_project_root(dir))
        .map(Path::to_path_buf)
}

fn is_project_root(dir: &Path) -> bool {
    PROJECT_ANCHORS.iter().any(|anchor| {
        let candidate = dir.join(anchor);
        if *anchor == TEMPLATES_DIR {
            candidate.is_dir()
        } else {
            candidate.exists()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_from_root_layout() {
        let config = BuildConfig::from_root("/work/project");
        assert_eq!(config.templates_dir, Path::new("/work/project/templates"));
        assert_eq!(config.fragments_dir, Path::new("/work/project/src/fragments"));
        assert_eq!(config.output_dir, Path::new("/work/project/dist/templates"));
    }

    #[test]
    fn test_discover_walks_up_to_anchor() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("templates").join("github");
        fs::create_dir_all(&nested).unwrap();

        let config = BuildConfig::discover(&nested);
        assert_eq!(config.project_root, temp.path());
    }

    #[test]
    fn test_discover_skips_member_manifests() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("templates")).unwrap();
        let member = temp.path().join("crates").join("iat_cli");
        fs::create_dir_all(member.join("src")).unwrap();
        fs::write(member.join("Cargo.toml"), "[package]").unwrap();
        fs::write(member.join("pyproject.toml"), "").unwrap();

        let config = BuildConfig::discover(&member.join("src"));
        assert_eq!(config.project_root, temp.path());
        assert_eq!(config.templates_dir, temp.path().join("templates"));
    }

    #[test]
    fn test_discover_stops_at_git_checkout() {
        let temp = tempdir().unwrap();
        let checkout = temp.path().join("checkout");
        fs::create_dir_all(checkout.join(".git")).unwrap();
        let nested = checkout.join("docs");
        fs::create_dir_all(&nested).unwrap();
        // A plain file named `templates` is not an anchor.
        fs::write(nested.join("templates"), "").unwrap();

        let config = BuildConfig::discover(&nested);
        assert_eq!(config.project_root, checkout);
    }

    #[test]
    fn test_overrides() {
        let config = BuildConfig::from_root("/p")
            .with_output_dir("/tmp/out")
            .with_fragments_dir("/tmp/fragments");
        assert_eq!(config.output_dir, Path::new("/tmp/out"));
        assert_eq!(config.fragments_dir, Path::new("/tmp/fragments"));
        assert_eq!(config.templates_dir, Path::new("/p/templates"));
    }
}

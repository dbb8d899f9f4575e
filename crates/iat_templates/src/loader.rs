//! Template discovery and manifest loading.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{TemplateError, TemplateResult};
use crate::manifest::{BundleManifest, RawManifest, MANIFEST_FILE};

/// Template loader.
pub struct TemplateLoader {
    templates_path: PathBuf,
}

impl TemplateLoader {
    /// Create a new template loader.
    pub fn new(templates_path: impl Into<PathBuf>) -> Self {
        Self {
            templates_path: templates_path.into(),
        }
    }

    /// Directory scanned for templates.
    pub fn templates_path(&self) -> &Path {
        &self.templates_path
    }

    /// All template directories, sorted by directory name.
    ///
    /// Fails when the templates directory is missing or holds no
    /// subdirectories.
    pub fn discover(&self) -> TemplateResult<Vec<PathBuf>> {
        if !self.templates_path.is_dir() {
            return Err(TemplateError::NoTemplatesDirectory(
                self.templates_path.clone(),
            ));
        }

        let mut template_dirs = Vec::new();
        for entry in WalkDir::new(&self.templates_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                e.into_io_error()
                    .map(TemplateError::Io)
                    .unwrap_or_else(|| {
                        TemplateError::Io(io::Error::new(
                            io::ErrorKind::Other,
                            "filesystem loop while scanning templates",
                        ))
                    })
            })?;
            if entry.file_type().is_dir() {
                template_dirs.push(entry.into_path());
            }
        }

        if template_dirs.is_empty() {
            return Err(TemplateError::NoTemplatesFound(self.templates_path.clone()));
        }

        debug!("Discovered {} template(s)", template_dirs.len());
        Ok(template_dirs)
    }

    /// Load the manifest of a template directory.
    pub fn load_template(&self, template_dir: &Path) -> TemplateResult<BundleManifest> {
        Self::load_manifest(&template_dir.join(MANIFEST_FILE))
    }

    /// Load and validate a manifest file.
    pub fn load_manifest(path: &Path) -> TemplateResult<BundleManifest> {
        BundleManifest::try_from(Self::load_raw(path)?)
    }

    /// Parse a manifest file without applying defaults.
    pub fn load_raw(path: &Path) -> TemplateResult<RawManifest> {
        if !path.exists() {
            return Err(TemplateError::ManifestNotFound(path.to_path_buf()));
        }

        debug!("Loading manifest from {:?}", path);
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| TemplateError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_discover_missing_dir() {
        let temp = tempdir().unwrap();
        let loader = TemplateLoader::new(temp.path().join("templates"));
        assert!(matches!(
            loader.discover(),
            Err(TemplateError::NoTemplatesDirectory(_))
        ));
    }

    #[test]
    fn test_discover_empty_dir() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("README.md"), "not a template").unwrap();
        let loader = TemplateLoader::new(temp.path());
        assert!(matches!(
            loader.discover(),
            Err(TemplateError::NoTemplatesFound(_))
        ));
    }

    #[test]
    fn test_discover_sorted() {
        let temp = tempdir().unwrap();
        for name in ["zen", "github", "Neon", "academic"] {
            fs::create_dir(temp.path().join(name)).unwrap();
        }
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        let loader = TemplateLoader::new(temp.path());
        let names: Vec<String> = loader
            .discover()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Neon", "academic", "github", "zen"]);
    }

    #[test]
    fn test_load_template_without_manifest() {
        let temp = tempdir().unwrap();
        let loader = TemplateLoader::new(temp.path());
        assert!(matches!(
            loader.load_template(temp.path()),
            Err(TemplateError::ManifestNotFound(_))
        ));
    }

    #[test]
    fn test_load_malformed_manifest() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), "{\"name\": ").unwrap();
        let loader = TemplateLoader::new(temp.path());
        assert!(matches!(
            loader.load_template(temp.path()),
            Err(TemplateError::ManifestParse { .. })
        ));
    }

    #[test]
    fn test_load_manifest() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join(MANIFEST_FILE),
            r#"{"name": "GitHub", "identifier": "net.ia.writer.template.github", "extra": 1}"#,
        )
        .unwrap();
        let loader = TemplateLoader::new(temp.path());
        let manifest = loader.load_template(temp.path()).unwrap();
        assert_eq!(manifest.name, "GitHub");
        assert_eq!(manifest.bundle_dir, "GitHub.iatemplate");
    }
}

//! Bundle assembly.
//!
//! [`BundleBuilder`] turns one template directory into an `.iatemplate`
//! bundle:
//!
//! ```text
//! <bundle_dir>/
//!   Contents/
//!     Info.plist
//!     Resources/
//!       document.html
//!       title.html, header.html, footer.html   (optional)
//!       <assets, flattened to their file name>
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use fs_extra::dir::CopyOptions;
use tracing::{debug, error, info};

use crate::config::BuildConfig;
use crate::error::{TemplateError, TemplateResult};
use crate::loader::TemplateLoader;
use crate::manifest::{BundleManifest, MANIFEST_FILE};
use crate::renderer::{ReplacementSet, TemplateRenderer};
use crate::resolver::{template_name, FragmentResolver};

/// Bundle descriptor, written to `Contents/`.
pub const INFO_PLIST: &str = "Info.plist";

/// HTML fragments written to `Contents/Resources/`, in build order.
pub const HTML_FRAGMENTS: [&str; 4] = ["title.html", "header.html", "footer.html", "document.html"];

/// The only HTML fragment a template cannot do without.
pub const REQUIRED_FRAGMENT: &str = "document.html";

const CONTENTS_DIR: &str = "Contents";
const RESOURCES_DIR: &str = "Resources";

/// Result of a successful bundle build.
#[derive(Debug, Clone)]
pub struct BuiltBundle {
    /// Template directory name
    pub template: String,
    /// Root of the generated bundle
    pub bundle_path: PathBuf,
    /// Files and directories written, in write order
    pub files: Vec<PathBuf>,
}

impl BuiltBundle {
    pub fn contents_dir(&self) -> PathBuf {
        self.bundle_path.join(CONTENTS_DIR)
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.contents_dir().join(RESOURCES_DIR)
    }
}

/// Builds `.iatemplate` bundles from template directories.
pub struct BundleBuilder {
    config: BuildConfig,
    loader: TemplateLoader,
    resolver: FragmentResolver,
    renderer: TemplateRenderer,
}

impl BundleBuilder {
    /// Create a builder for the given configuration.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            loader: TemplateLoader::new(&config.templates_dir),
            resolver: FragmentResolver::new(&config.fragments_dir),
            renderer: TemplateRenderer::new(),
            config,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build every template, wiping the output directory first.
    ///
    /// Templates are built in directory-name order and the run stops at the
    /// first failure.
    pub fn build_all(&self) -> TemplateResult<Vec<BuiltBundle>> {
        self.reset_output_dir()?;

        let template_dirs = self.loader.discover()?;
        info!("Building {} template(s)", template_dirs.len());

        let mut bundles = Vec::with_capacity(template_dirs.len());
        for template_dir in template_dirs {
            match self.build(&template_dir) {
                Ok(bundle) => bundles.push(bundle),
                Err(e) => {
                    let template = template_name(&template_dir);
                    error!("Error building {}: {}", template, e);
                    return Err(TemplateError::BuildFailed {
                        template,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(bundles)
    }

    /// Build a single template into the output directory.
    pub fn build(&self, template_dir: &Path) -> TemplateResult<BuiltBundle> {
        let manifest_path = template_dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(TemplateError::ManifestNotFound(manifest_path));
        }
        let manifest = TemplateLoader::load_manifest(&manifest_path)?;

        let bundle_path = self.config.output_dir.join(&manifest.bundle_dir);
        let contents_dir = bundle_path.join(CONTENTS_DIR);
        let resources_dir = contents_dir.join(RESOURCES_DIR);
        fs::create_dir_all(&resources_dir)?;

        let replacements = manifest.replacements();
        let mut files = Vec::new();

        let info_plist = self.render_fragment(INFO_PLIST, template_dir, &replacements)?;
        let info_path = contents_dir.join(INFO_PLIST);
        fs::write(&info_path, info_plist)?;
        files.push(info_path);

        for fragment in HTML_FRAGMENTS {
            if manifest.skips(fragment) {
                debug!("Skipping {} as requested by manifest", fragment);
                continue;
            }

            match self.render_fragment(fragment, template_dir, &replacements) {
                Ok(rendered) => {
                    let path = resources_dir.join(fragment);
                    fs::write(&path, rendered)?;
                    files.push(path);
                }
                Err(e) if e.is_fragment_not_found() && fragment != REQUIRED_FRAGMENT => {
                    debug!("No {} for template, leaving it out", fragment);
                }
                Err(e) => return Err(e),
            }
        }

        files.extend(self.copy_manifest_assets(&manifest, template_dir, &resources_dir)?);

        info!("Built template bundle: {}", bundle_path.display());
        Ok(BuiltBundle {
            template: template_name(template_dir),
            bundle_path,
            files,
        })
    }

    /// Check every template without writing anything.
    ///
    /// Returns each template name with its issues; an empty list means the
    /// template would build.
    pub fn check_all(&self) -> TemplateResult<Vec<(String, Vec<String>)>> {
        let mut report = Vec::new();
        for template_dir in self.loader.discover()? {
            let issues = self.check(&template_dir)?;
            report.push((template_name(&template_dir), issues));
        }
        Ok(report)
    }

    /// Validate a template directory structure.
    pub fn check(&self, template_dir: &Path) -> TemplateResult<Vec<String>> {
        let mut issues = Vec::new();

        let manifest = match self.loader.load_template(template_dir) {
            Ok(manifest) => manifest,
            Err(e) => {
                issues.push(format!("Invalid manifest: {}", e));
                return Ok(issues);
            }
        };

        if let Err(e) = self.resolver.locate(INFO_PLIST, template_dir) {
            issues.push(e.to_string());
        }
        if !manifest.skips(REQUIRED_FRAGMENT) {
            if let Err(e) = self.resolver.locate(REQUIRED_FRAGMENT, template_dir) {
                issues.push(e.to_string());
            }
        }

        for asset in manifest.referenced_assets() {
            if !template_dir.join(&asset).exists() {
                issues.push(format!("Referenced asset does not exist: {}", asset));
            } else if Path::new(&asset).file_name().is_none() {
                issues.push(format!("Asset path has no file name: {}", asset));
            }
        }

        Ok(issues)
    }

    fn render_fragment(
        &self,
        fragment: &str,
        template_dir: &Path,
        replacements: &ReplacementSet,
    ) -> TemplateResult<String> {
        let content = self.resolver.resolve(fragment, template_dir)?;
        let rendered = self.renderer.render_content(&content, replacements);

        let unresolved = self.renderer.unresolved_placeholders(&rendered);
        if !unresolved.is_empty() {
            debug!(
                "{} keeps unresolved placeholders: {}",
                fragment,
                unresolved.join(", ")
            );
        }

        Ok(rendered)
    }

    /// Copy `assets` and the legacy `css` block into the resources directory.
    fn copy_manifest_assets(
        &self,
        manifest: &BundleManifest,
        template_dir: &Path,
        resources_dir: &Path,
    ) -> TemplateResult<Vec<PathBuf>> {
        let mut copied = Vec::new();

        if let Some(assets) = &manifest.assets {
            copied.extend(copy_assets(assets, template_dir, resources_dir)?);
        }

        if let Some(css) = &manifest.css {
            copied.extend(copy_assets(&css.base, template_dir, resources_dir)?);

            for (variant, spec) in &css.variants {
                let Some(source) = spec.source() else {
                    debug!("Ignoring css variant '{}' without a source", variant);
                    continue;
                };
                copied.push(copy_asset(source, template_dir, resources_dir)?);

                let source_path = template_dir.join(source);
                for target in spec.targets() {
                    let destination = resources_dir.join(&target);
                    copy_path(&source_path, &destination)?;
                    debug!("Published {} as {}", source, target);
                    copied.push(destination);
                }
            }
        }

        Ok(copied)
    }

    fn reset_output_dir(&self) -> TemplateResult<()> {
        let output_dir = normalize_path(&self.config.output_dir)?;
        let protected = [
            &self.config.templates_dir,
            &self.config.fragments_dir,
            &self.config.project_root,
        ];
        for source in protected {
            if normalize_path(source)?.starts_with(&output_dir) {
                return Err(TemplateError::InvalidConfig(format!(
                    "output directory {} would remove {}",
                    self.config.output_dir.display(),
                    source.display()
                )));
            }
        }

        if output_dir.exists() {
            debug!("Removing previous output at {:?}", output_dir);
            fs::remove_dir_all(&output_dir)?;
        }
        fs::create_dir_all(&output_dir)?;
        Ok(())
    }
}

/// Absolute form of `path` with `.` and `..` applied and symlinks resolved.
///
/// Works for paths that do not exist yet: every existing prefix is
/// canonicalized and the missing tail is applied lexically.
fn normalize_path(path: &Path) -> TemplateResult<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => {
                resolved.push(other);
                if resolved.exists() {
                    resolved = resolved.canonicalize()?;
                }
            }
        }
    }
    Ok(resolved)
}

/// Copy each relative asset path into `resources_dir`.
pub fn copy_assets<S: AsRef<str>>(
    assets: &[S],
    template_dir: &Path,
    resources_dir: &Path,
) -> TemplateResult<Vec<PathBuf>> {
    assets
        .iter()
        .map(|asset| copy_asset(asset.as_ref(), template_dir, resources_dir))
        .collect()
}

/// Copy one asset, keeping only its file name.
///
/// `css/dark.css` ends up as `Resources/dark.css`.
pub fn copy_asset(asset: &str, template_dir: &Path, resources_dir: &Path) -> TemplateResult<PathBuf> {
    let source = template_dir.join(asset);
    if !source.exists() {
        return Err(TemplateError::AssetNotFound {
            asset: asset.to_string(),
            template_dir: template_dir.to_path_buf(),
        });
    }

    let file_name = Path::new(asset)
        .file_name()
        .ok_or_else(|| TemplateError::InvalidManifest(format!("asset '{}' has no file name", asset)))?;
    let destination = resources_dir.join(file_name);

    copy_path(&source, &destination)?;
    debug!("Copied {} -> {:?}", asset, destination);
    Ok(destination)
}

/// Copy a file or a directory tree.
///
/// Files overwrite the destination. Directories replace an existing
/// destination instead of merging into it. Parent directories are created.
pub fn copy_path(source: &Path, destination: &Path) -> TemplateResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    if source.is_dir() {
        if destination.is_dir() {
            fs::remove_dir_all(destination)?;
        } else if destination.exists() {
            fs::remove_file(destination)?;
        }
        fs::create_dir_all(destination)?;

        let mut options = CopyOptions::new();
        options.content_only = true;
        options.overwrite = true;
        fs_extra::dir::copy(source, destination, &options)?;
    } else {
        fs::copy(source, destination)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_copy_asset_flattens_path() {
        let temp = tempdir().unwrap();
        let template_dir = temp.path().join("tpl");
        let resources = temp.path().join("out");
        fs::create_dir_all(template_dir.join("css")).unwrap();
        fs::write(template_dir.join("css/dark.css"), "body{}").unwrap();

        let copied = copy_asset("css/dark.css", &template_dir, &resources).unwrap();
        assert_eq!(copied, resources.join("dark.css"));
        assert_eq!(fs::read_to_string(copied).unwrap(), "body{}");
    }

    #[test]
    fn test_copy_asset_missing() {
        let temp = tempdir().unwrap();
        let err = copy_asset("fonts/missing.woff", temp.path(), &temp.path().join("out")).unwrap_err();
        match err {
            TemplateError::AssetNotFound { asset, template_dir } => {
                assert_eq!(asset, "fonts/missing.woff");
                assert_eq!(template_dir, temp.path());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_copy_file_overwrites() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("a.css");
        let destination = temp.path().join("nested/dir/a.css");
        fs::write(&source, "new").unwrap();
        fs::create_dir_all(destination.parent().unwrap()).unwrap();
        fs::write(&destination, "old").unwrap();

        copy_path(&source, &destination).unwrap();
        assert_eq!(fs::read_to_string(&destination).unwrap(), "new");
    }

    #[test]
    fn test_copy_dir_replaces_instead_of_merging() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("fonts");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("a.woff"), "a").unwrap();
        fs::write(source.join("sub/b.woff"), "b").unwrap();

        let destination = temp.path().join("Resources/fonts");
        fs::create_dir_all(&destination).unwrap();
        fs::write(destination.join("stale.woff"), "stale").unwrap();

        copy_path(&source, &destination).unwrap();
        assert!(!destination.join("stale.woff").exists());
        assert_eq!(fs::read_to_string(destination.join("a.woff")).unwrap(), "a");
        assert_eq!(fs::read_to_string(destination.join("sub/b.woff")).unwrap(), "b");
        assert!(!destination.join("fonts").exists());
    }

    #[test]
    fn test_output_dir_must_not_contain_sources() {
        let temp = tempdir().unwrap();
        let config = BuildConfig::from_root(temp.path()).with_output_dir(temp.path());
        let builder = BundleBuilder::new(config);
        assert!(matches!(
            builder.build_all(),
            Err(TemplateError::InvalidConfig(_))
        ));
        assert!(temp.path().exists());
    }

    #[test]
    fn test_normalize_path_applies_parent_components() {
        let temp = tempdir().unwrap();
        let root = temp.path().canonicalize().unwrap();
        assert_eq!(normalize_path(&temp.path().join("sub").join("..")).unwrap(), root);
        assert_eq!(
            normalize_path(&temp.path().join("a/./b/../c")).unwrap(),
            root.join("a/c")
        );
    }

    #[test]
    fn test_output_dir_alias_of_root_refused() {
        let temp = tempdir().unwrap();
        let templates = temp.path().join("templates/plain");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("document.html"), "<p>{name}</p>").unwrap();

        let config = BuildConfig::from_root(temp.path())
            .with_output_dir(temp.path().join("missing").join(".."));
        let builder = BundleBuilder::new(config);
        assert!(matches!(
            builder.build_all(),
            Err(TemplateError::InvalidConfig(_))
        ));
        assert!(templates.join("document.html").exists());
    }
}

//! Bundle manifest definitions.
//!
//! A template directory describes its bundle through `bundle.json`. The file is
//! first deserialized into [`RawManifest`], where every key is optional, and
//! then validated into a [`BundleManifest`] that carries the defaults for all
//! optional fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{TemplateError, TemplateResult};
use crate::renderer::{display_value, ReplacementSet};

/// File name of the manifest inside a template directory.
pub const MANIFEST_FILE: &str = "bundle.json";

/// Suffix appended to the template name when `bundle_dir` is not given.
pub const BUNDLE_EXTENSION: &str = "iatemplate";

const DEFAULT_VERSION: &str = "1.0.0";
const DEFAULT_BUNDLE_VERSION: &str = "1";
const DEFAULT_DEVELOPMENT_REGION: &str = "en";
const DEFAULT_BAR_HEIGHT: &str = "90";

/// Convert a display name into a filesystem-friendly slug.
///
/// Lowercases the name and replaces spaces and hyphens with underscores.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace([' ', '-'], "_")
}

/// Manifest exactly as written in `bundle.json`.
///
/// Builtin keys other than `name` accept any JSON scalar and are turned into
/// text with [`display_value`], so `"version": 2` renders as `2`. A `null`
/// builtin counts as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub identifier: Option<Value>,
    #[serde(default)]
    pub bundle_dir: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub title_name: Option<Value>,
    #[serde(default)]
    pub subtitle: Option<Value>,
    #[serde(default)]
    pub slug: Option<Value>,
    #[serde(default)]
    pub author: Option<Value>,
    #[serde(default)]
    pub author_url: Option<Value>,
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default)]
    pub bundle_version: Option<Value>,
    #[serde(default)]
    pub development_region: Option<Value>,
    #[serde(default)]
    pub header_height: Option<Value>,
    #[serde(default)]
    pub footer_height: Option<Value>,
    /// Custom placeholders, merged over the builtin ones.
    #[serde(default)]
    pub placeholders: Map<String, Value>,
    /// Fragment file names to leave out of the bundle.
    #[serde(default)]
    pub skip_fragments: Vec<String>,
    #[serde(default)]
    pub assets: Option<Vec<String>>,
    #[serde(default)]
    pub css: Option<CssConfig>,
}

/// Legacy CSS block kept for older manifests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CssConfig {
    /// Stylesheets copied as plain assets.
    #[serde(default)]
    pub base: Vec<String>,
    /// Named variants, processed in document order.
    #[serde(default)]
    pub variants: IndexMap<String, CssVariant>,
}

/// A single entry of `css.variants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CssVariant {
    /// Bare path, copied like an asset.
    Path(String),
    /// Source file plus optional extra publication names.
    Detailed(VariantSpec),
    /// Anything else. Objects carrying `source` are rejected by
    /// [`CssConfig::validate`]; the rest is ignored.
    Other(Value),
}

/// Object form of a CSS variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSpec {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub targets: Option<VariantTargets>,
}

/// `targets` accepts a single path or a list of paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantTargets {
    One(String),
    Many(Vec<String>),
}

impl VariantTargets {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            VariantTargets::One(target) => vec![target.clone()],
            VariantTargets::Many(targets) => targets.clone(),
        }
    }
}

impl CssConfig {
    /// Reject variant objects that name a `source` but cannot be copied.
    ///
    /// Entries that are neither a path nor an object with `source` stay
    /// tolerated and are skipped at build time.
    pub fn validate(&self) -> TemplateResult<()> {
        for (name, variant) in &self.variants {
            if let CssVariant::Other(Value::Object(entry)) = variant {
                if entry.contains_key("source") {
                    return Err(TemplateError::InvalidManifest(format!(
                        "css variant '{}' needs a string 'source' and 'targets' given as a path or a list of paths",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl CssVariant {
    /// Source path of the variant, if it has one.
    pub fn source(&self) -> Option<&str> {
        match self {
            CssVariant::Path(path) => Some(path),
            CssVariant::Detailed(spec) => spec.source.as_deref(),
            CssVariant::Other(_) => None,
        }
    }

    /// Extra file names the source is published under.
    pub fn targets(&self) -> Vec<String> {
        match self {
            CssVariant::Detailed(VariantSpec {
                source: Some(_),
                targets: Some(targets),
            }) => targets.to_vec(),
            _ => Vec::new(),
        }
    }
}

/// Validated manifest with every default applied.
#[derive(Debug, Clone, Serialize)]
pub struct BundleManifest {
    pub name: String,
    pub identifier: String,
    /// Name of the bundle directory inside the output root.
    pub bundle_dir: String,
    pub description: String,
    pub title_name: String,
    pub subtitle: String,
    pub slug: String,
    pub author: String,
    pub author_url: String,
    pub version: String,
    pub bundle_version: String,
    pub development_region: String,
    pub header_height: String,
    pub footer_height: String,
    pub placeholders: Map<String, Value>,
    pub skip_fragments: Vec<String>,
    pub assets: Option<Vec<String>>,
    pub css: Option<CssConfig>,
}

impl TryFrom<RawManifest> for BundleManifest {
    type Error = TemplateError;

    fn try_from(raw: RawManifest) -> TemplateResult<Self> {
        let name = raw
            .name
            .ok_or_else(|| TemplateError::MissingKey("name".to_string()))?;
        if name.is_empty() {
            return Err(TemplateError::InvalidManifest(
                "'name' must not be empty".to_string(),
            ));
        }
        let identifier = text(raw.identifier)
            .ok_or_else(|| TemplateError::MissingKey("identifier".to_string()))?;
        if let Some(css) = &raw.css {
            css.validate()?;
        }

        Ok(Self {
            bundle_dir: text(raw.bundle_dir)
                .unwrap_or_else(|| format!("{}.{}", name, BUNDLE_EXTENSION)),
            description: text(raw.description).unwrap_or_default(),
            title_name: text(raw.title_name).unwrap_or_else(|| name.clone()),
            subtitle: text(raw.subtitle).unwrap_or_default(),
            slug: text(raw.slug).unwrap_or_else(|| slugify(&name)),
            author: text(raw.author).unwrap_or_default(),
            author_url: text(raw.author_url).unwrap_or_default(),
            version: text(raw.version).unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            bundle_version: text(raw.bundle_version)
                .unwrap_or_else(|| DEFAULT_BUNDLE_VERSION.to_string()),
            development_region: text(raw.development_region)
                .unwrap_or_else(|| DEFAULT_DEVELOPMENT_REGION.to_string()),
            header_height: text(raw.header_height)
                .unwrap_or_else(|| DEFAULT_BAR_HEIGHT.to_string()),
            footer_height: text(raw.footer_height)
                .unwrap_or_else(|| DEFAULT_BAR_HEIGHT.to_string()),
            placeholders: raw.placeholders,
            skip_fragments: raw.skip_fragments,
            assets: raw.assets,
            css: raw.css,
            name,
            identifier,
        })
    }
}

fn text(value: Option<Value>) -> Option<String> {
    value.map(|v| display_value(&v))
}

impl BundleManifest {
    /// Whether the manifest asks to leave out the given fragment.
    pub fn skips(&self, fragment: &str) -> bool {
        self.skip_fragments.iter().any(|f| f == fragment)
    }

    /// Build the replacement set used to render this template's fragments.
    ///
    /// Builtin keys come first in a fixed order; custom `placeholders` are
    /// merged afterwards and win on collision.
    pub fn replacements(&self) -> ReplacementSet {
        let mut set = ReplacementSet::new();
        set.insert("name", &self.name);
        set.insert("identifier", &self.identifier);
        set.insert("description", &self.description);
        set.insert("title_name", &self.title_name);
        set.insert("subtitle", &self.subtitle);
        set.insert("slug", &self.slug);
        set.insert("author", &self.author);
        set.insert("author_url", &self.author_url);
        set.insert("version", &self.version);
        set.insert("bundle_version", &self.bundle_version);
        set.insert("development_region", &self.development_region);
        set.insert("header_height", &self.header_height);
        set.insert("footer_height", &self.footer_height);

        for (key, value) in &self.placeholders {
            set.insert_value(key, value);
        }

        set
    }

    /// Every asset path the manifest references, in copy order.
    ///
    /// Includes `assets`, `css.base` and each variant source. Variant targets
    /// are not listed since they are copies of their source.
    pub fn referenced_assets(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.assets.clone().unwrap_or_default();
        if let Some(css) = &self.css {
            paths.extend(css.base.iter().cloned());
            paths.extend(
                css.variants
                    .values()
                    .filter_map(|v| v.source().map(str::to_string)),
            );
        }
        paths
    }
}

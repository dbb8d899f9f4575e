//! # iat_templates
//!
//! Builds iA Writer `.iatemplate` bundles from template source directories.
//!
//! Each template directory carries a `bundle.json` manifest. Building a
//! template:
//!
//! - loads the manifest and applies defaults for optional keys
//! - renders `Info.plist` and the HTML fragments with `{placeholder}` values
//! - looks fragments up in the template, its `fragments/` folder, then the
//!   shared fragments directory
//! - copies declared assets (and legacy CSS variants) into `Resources/`
//!
//! ## Example
//!
//! ```rust,no_run
//! use iat_templates::{BuildConfig, BundleBuilder};
//! use std::path::Path;
//!
//! let config = BuildConfig::discover(Path::new("."));
//! let builder = BundleBuilder::new(config);
//!
//! for bundle in builder.build_all().unwrap() {
//!     println!("{}", bundle.bundle_path.display());
//! }
//! ```

pub mod bundle;
pub mod config;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod renderer;
pub mod resolver;

pub use bundle::{copy_asset, copy_assets, copy_path, BuiltBundle, BundleBuilder, HTML_FRAGMENTS, INFO_PLIST};
pub use config::{find_project_root, BuildConfig};
pub use error::{TemplateError, TemplateResult};
pub use loader::TemplateLoader;
pub use manifest::{
    slugify, BundleManifest, CssConfig, CssVariant, RawManifest, VariantSpec, VariantTargets,
    MANIFEST_FILE,
};
pub use renderer::{display_value, ReplacementSet, TemplateRenderer};
pub use resolver::FragmentResolver;

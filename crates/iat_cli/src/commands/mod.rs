//! CLI command definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use iat_templates::BuildConfig;

pub mod build;
pub mod check;

/// iat - build iA Writer template bundles
#[derive(Parser)]
#[command(name = "iat")]
#[command(version, about = "Build iA Writer .iatemplate bundles from template sources")]
#[command(long_about = r#"
Builds iA Writer .iatemplate bundles from template source directories.

Each directory under templates/ holds a bundle.json manifest, optional
HTML fragments and the CSS/asset files it declares. Shared fragments are
taken from src/fragments/ and bundles are written to dist/templates/.

COMMANDS:
  build   → Build every template (wipes the output directory first)
  check   → Validate every template without writing anything

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Template error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build all template bundles
    Build(build::BuildArgs),

    /// Check all templates for missing manifests, fragments and assets
    Check(check::CheckArgs),
}

/// Directory options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Project root (defaults to the nearest directory with a templates/ directory or .git)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Templates directory
    #[arg(long)]
    pub templates_dir: Option<PathBuf>,

    /// Shared fragments directory
    #[arg(long)]
    pub fragments_dir: Option<PathBuf>,

    /// Output directory for generated bundles
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl PathArgs {
    /// Resolve the build configuration, applying any overrides.
    pub fn to_config(&self) -> Result<BuildConfig> {
        let mut config = match &self.root {
            Some(root) => BuildConfig::from_root(root),
            None => BuildConfig::discover(&std::env::current_dir()?),
        };

        if let Some(dir) = &self.templates_dir {
            config = config.with_templates_dir(dir);
        }
        if let Some(dir) = &self.fragments_dir {
            config = config.with_fragments_dir(dir);
        }
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_build_with_overrides() {
        let cli = Cli::try_parse_from([
            "iat",
            "build",
            "--root",
            "/work/site",
            "--output-dir",
            "/tmp/out",
        ])
        .unwrap();

        let Commands::Build(args) = cli.command else {
            panic!("expected build command");
        };
        let config = args.paths.to_config().unwrap();
        assert_eq!(config.templates_dir, Path::new("/work/site/templates"));
        assert_eq!(config.fragments_dir, Path::new("/work/site/src/fragments"));
        assert_eq!(config.output_dir, Path::new("/tmp/out"));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["iat", "-v", "-q", "check"]).is_err());
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["iat", "check", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Check(_)));
    }
}

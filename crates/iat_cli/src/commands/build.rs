//! Build command - Build every template bundle.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use iat_templates::BundleBuilder;

use super::PathArgs;

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub paths: PathArgs,
}

pub fn execute(args: BuildArgs) -> Result<()> {
    let config = args.paths.to_config()?;
    info!("Building templates from {:?}", config.templates_dir);

    let builder = BundleBuilder::new(config);
    let bundles = builder
        .build_all()
        .context("Template build failed")?;

    let output_dir = &builder.config().output_dir;
    println!();
    println!(
        "{} template(s) generated successfully in {}",
        bundles.len(),
        output_dir.display()
    );
    println!("To install, double-click the .iatemplate bundle");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_execute_builds_into_output_dir() {
        let temp = tempdir().unwrap();
        let template = temp.path().join("templates/minimal");
        fs::create_dir_all(&template).unwrap();
        fs::write(
            template.join("bundle.json"),
            r#"{"name": "Minimal", "identifier": "com.example.minimal"}"#,
        )
        .unwrap();
        fs::write(template.join("Info.plist"), "<string>{identifier}</string>").unwrap();
        fs::write(template.join("document.html"), "<html></html>").unwrap();

        let args = BuildArgs {
            paths: PathArgs {
                root: Some(temp.path().to_path_buf()),
                ..Default::default()
            },
        };
        execute(args).unwrap();

        let info = temp
            .path()
            .join("dist/templates/Minimal.iatemplate/Contents/Info.plist");
        assert_eq!(
            fs::read_to_string(info).unwrap(),
            "<string>com.example.minimal</string>"
        );
    }

    #[test]
    fn test_execute_without_templates_fails() {
        let temp = tempdir().unwrap();
        let args = BuildArgs {
            paths: PathArgs {
                root: Some(temp.path().to_path_buf()),
                ..Default::default()
            },
        };
        let err = execute(args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<iat_templates::TemplateError>(),
            Some(iat_templates::TemplateError::NoTemplatesDirectory(_))
        ));
    }
}

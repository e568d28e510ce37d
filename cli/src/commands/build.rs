//! `boxes build` command: provision, package and optionally publish a box.

use clap::Args;

use boxes_core::naming::DEFAULT_BOX;
use boxes_core::BoxesConfig;
use boxes_runtime::{BoxBuilder, BuildOptions, BuildOutcome};

use crate::output;

#[derive(Args)]
pub struct BuildArgs {
    /// Box to build
    #[arg(value_name = "BOX", default_value = DEFAULT_BOX)]
    pub name: String,

    /// Base template to build from (URL or name under the default template root)
    #[arg(short = 'b', long)]
    pub base: Option<String>,

    /// Upload the box once it is packaged
    #[arg(short = 'u', long)]
    pub upload: bool,

    /// Force the base template to be downloaded again
    #[arg(short = 'd', long)]
    pub download: bool,
}

impl BuildArgs {
    fn options(&self) -> BuildOptions {
        BuildOptions {
            base: self.base.clone(),
            force_redownload: self.download,
            upload: self.upload,
        }
    }
}

pub async fn execute(args: BuildArgs, config: &BoxesConfig) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = super::gateway(config);
    let options = args.options();
    tracing::debug!(box_name = %args.name, upload = args.upload, force = args.download, "Starting build");

    let outcome = if args.upload {
        let store = super::open_store(config)?;
        BoxBuilder::new(&gateway, config)
            .with_store(&store)
            .build(&args.name, &options)
            .await?
    } else {
        BoxBuilder::new(&gateway, config)
            .build(&args.name, &options)
            .await?
    };

    report(&outcome);
    Ok(())
}

fn report(outcome: &BuildOutcome) {
    match outcome {
        BuildOutcome::Packaged { archive } => {
            println!(
                "Packaged {} ({})",
                archive.display(),
                output::file_size(archive)
            );
        }
        BuildOutcome::Published { archive, key } => {
            println!(
                "Packaged {} ({})",
                archive.display(),
                output::file_size(archive)
            );
            println!("Published {key}");
        }
        BuildOutcome::Halted { reason } => {
            println!("Build halted: {reason}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_flags() {
        let args = BuildArgs {
            name: "ruby".to_string(),
            base: Some("lucid64".to_string()),
            upload: true,
            download: true,
        };
        let options = args.options();
        assert_eq!(options.base.as_deref(), Some("lucid64"));
        assert!(options.force_redownload);
        assert!(options.upload);
    }

    #[test]
    fn test_options_default_flags() {
        let args = BuildArgs {
            name: DEFAULT_BOX.to_string(),
            base: None,
            upload: false,
            download: false,
        };
        let options = args.options();
        assert!(options.base.is_none());
        assert!(!options.force_redownload);
        assert!(!options.upload);
    }

    #[tokio::test]
    async fn test_upload_without_store_endpoint_fails_early() {
        let tmp = tempfile::tempdir().unwrap();
        let config = BoxesConfig {
            work_dir: tmp.path().to_path_buf(),
            ..BoxesConfig::default()
        };
        let args = BuildArgs {
            name: DEFAULT_BOX.to_string(),
            base: Some("precise64".to_string()),
            upload: true,
            download: false,
        };

        let err = execute(args, &config).await.unwrap_err();
        assert!(err.to_string().contains("endpoint"));
        assert!(!tmp.path().join("templates").exists());
    }
}

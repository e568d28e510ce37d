//! `boxes upload` command: publish a box packaged by an earlier build.

use clap::Args;

use boxes_core::naming::DEFAULT_BOX;
use boxes_core::BoxesConfig;
use boxes_runtime::BoxBuilder;

#[derive(Args)]
pub struct UploadArgs {
    /// Box to upload
    #[arg(value_name = "BOX", default_value = DEFAULT_BOX)]
    pub name: String,
}

pub async fn execute(args: UploadArgs, config: &BoxesConfig) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = super::gateway(config);
    let store = super::open_store(config)?;

    let key = BoxBuilder::new(&gateway, config)
        .with_store(&store)
        .upload(&args.name)
        .await?;

    println!("Published {key}");
    Ok(())
}

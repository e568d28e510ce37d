//! `boxes build-base` and `boxes upload-base` commands.

use clap::Args;

use boxes_core::BoxesConfig;
use boxes_runtime::base::DEFAULT_DEFINITION;
use boxes_runtime::BaseBuilder;

use crate::output;

#[derive(Args)]
pub struct BaseArgs {
    /// Veewee definition to build the base from
    #[arg(short = 'd', long, default_value = DEFAULT_DEFINITION)]
    pub definition: String,
}

pub async fn execute_build(args: BaseArgs, config: &BoxesConfig) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = super::gateway(config);
    let archive = BaseBuilder::new(&gateway, &config.work_dir)
        .build(&args.definition)
        .await?;

    println!(
        "Built base {} ({})",
        archive.display(),
        output::file_size(&archive)
    );
    Ok(())
}

pub async fn execute_upload(args: BaseArgs, config: &BoxesConfig) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = super::gateway(config);
    let store = super::open_store(config)?;
    let key = BaseBuilder::new(&gateway, &config.work_dir)
        .upload(&store, &args.definition)
        .await?;

    println!("Published {key}");
    Ok(())
}

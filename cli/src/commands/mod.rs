//! CLI command definitions and dispatch.

mod base;
mod build;
mod list;
mod upload;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use boxes_core::BoxesConfig;
use boxes_runtime::{HttpArtifactStore, ProcessGateway};

/// Boxes: build and publish OpenVZ boxes for CI workers.
#[derive(Parser)]
#[command(name = "boxes", version, about)]
pub struct Cli {
    /// Configuration file (default: ./config/boxes.yml, then ~/.boxes/config.yml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Build a box (defaults to development)
    Build(build::BuildArgs),
    /// Upload a packaged box (defaults to development)
    Upload(upload::UploadArgs),
    /// List configured boxes
    List(list::ListArgs),
    /// Build a base template from a veewee definition
    BuildBase(base::BaseArgs),
    /// Upload a base template built with build-base
    UploadBase(base::BaseArgs),
}

/// Load the configuration named on the command line, or the default one.
pub(crate) fn load_config(path: Option<&PathBuf>) -> Result<BoxesConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => BoxesConfig::load(path)?,
        None => BoxesConfig::load_default()?,
    };
    Ok(config)
}

/// Gateway for real host commands.
pub(crate) fn gateway(config: &BoxesConfig) -> ProcessGateway {
    ProcessGateway::new(config.hypervisor.sudo)
}

/// Artifact store client from the configuration.
pub(crate) fn open_store(config: &BoxesConfig) -> Result<HttpArtifactStore, Box<dyn std::error::Error>> {
    Ok(HttpArtifactStore::new(&config.store)?)
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Build(args) => build::execute(args, &config).await,
        Command::Upload(args) => upload::execute(args, &config).await,
        Command::List(args) => list::execute(args, &config),
        Command::BuildBase(args) => base::execute_build(args, &config).await,
        Command::UploadBase(args) => base::execute_upload(args, &config).await,
    }
}

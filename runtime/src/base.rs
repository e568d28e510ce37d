//! Base template builds from veewee definitions.
//!
//! Produces `boxes/<definition>.tar` locally and publishes it under
//! `bases/<definition>.tar`.

use std::path::{Path, PathBuf};

use boxes_core::error::Result;

use crate::gateway::{CommandGateway, HostCommand};
use crate::publish::ArtifactStore;

/// Definition built when none is given.
pub const DEFAULT_DEFINITION: &str = "oneiric32";

/// Directory (under the work dir) receiving exported base templates.
pub const BASES_DIR: &str = "boxes";

/// Prefix under which base templates are published.
pub const BASES_PREFIX: &str = "bases";

/// Builds and publishes base templates.
pub struct BaseBuilder<'a> {
    gateway: &'a dyn CommandGateway,
    work_dir: &'a Path,
}

impl<'a> BaseBuilder<'a> {
    pub fn new(gateway: &'a dyn CommandGateway, work_dir: &'a Path) -> Self {
        Self { gateway, work_dir }
    }

    /// `<work-dir>/boxes/<definition>.tar`
    pub fn archive_path(&self, definition: &str) -> PathBuf {
        self.work_dir
            .join(BASES_DIR)
            .join(format!("{definition}.tar"))
    }

    /// Build the definition, export it and move the export under `boxes/`.
    ///
    /// veewee writes the export into the current directory.
    pub async fn build(&self, definition: &str) -> Result<PathBuf> {
        println!("Building base template '{definition}'");
        self.gateway
            .run_or_fail(
                &HostCommand::VeeweeBuild {
                    definition: definition.to_string(),
                },
                &format!("Could not build base template {definition}"),
            )
            .await?;
        self.gateway
            .run_or_fail(
                &HostCommand::VeeweeExport {
                    definition: definition.to_string(),
                },
                &format!("Could not export base template {definition}"),
            )
            .await?;

        let target = self.archive_path(definition);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let export = PathBuf::from(format!("{definition}.tar"));
        self.gateway
            .run_or_fail(
                &HostCommand::RelocateFile {
                    from: export.clone(),
                    to: target.clone(),
                },
                &format!(
                    "Could not move {} to {}",
                    export.display(),
                    target.display()
                ),
            )
            .await?;

        tracing::info!(definition, path = %target.display(), "Base template exported");
        Ok(target)
    }

    /// Upload `boxes/<definition>.tar` to `bases/<definition>.tar`.
    pub async fn upload(&self, store: &dyn ArtifactStore, definition: &str) -> Result<String> {
        let archive = self.archive_path(definition);
        let key = format!("{BASES_PREFIX}/{definition}.tar");

        println!("Uploading {} to {}", archive.display(), key);
        store.put(&archive, &key).await?;

        tracing::info!(definition, key = %key, "Base template uploaded");
        Ok(key)
    }
}

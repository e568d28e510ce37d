//! Snapshot and packaging.
//!
//! Quiesces the container, dumps it, finds the archive the dump facility
//! announces in its log and moves it to the publish target path.

use std::path::PathBuf;

use boxes_core::error::{BoxError, Result};
use boxes_core::{BoxContext, ContainerId, HypervisorConfig};

use crate::gateway::{CommandGateway, HostCommand};
use crate::lifecycle::LifecycleController;

/// Marker preceding the quoted archive path in dump output.
const ARCHIVE_MARKER: &str = "creating archive '";

/// Extract the archive path from dump log text.
///
/// Looks for a line like `INFO: creating archive '/var/lib/vz/dump/x.tar'`.
pub fn parse_archive_path(dump_output: &str) -> Result<PathBuf> {
    dump_output
        .lines()
        .find_map(|line| {
            let start = line.find(ARCHIVE_MARKER)? + ARCHIVE_MARKER.len();
            let rest = &line[start..];
            let end = rest.find('\'')?;
            let path = &rest[..end];
            (!path.is_empty()).then(|| PathBuf::from(path))
        })
        .ok_or_else(|| {
            BoxError::PackagingError("dump output did not announce an archive".to_string())
        })
}

/// Parse the output of an id lookup: a bare non-negative integer.
pub fn parse_container_id(lookup_output: &str, name: &str) -> Result<ContainerId> {
    let trimmed = lookup_output.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(BoxError::NotFound(format!(
            "could not find {name} id in {trimmed:?}"
        )));
    }
    trimmed
        .parse::<u32>()
        .map(ContainerId)
        .map_err(|e| BoxError::NotFound(format!("could not find {name} id in {trimmed:?}: {e}")))
}

/// Dumps a container and relocates the archive for publishing.
pub struct Snapshotter<'a> {
    gateway: &'a dyn CommandGateway,
    hypervisor: &'a HypervisorConfig,
}

impl<'a> Snapshotter<'a> {
    pub fn new(gateway: &'a dyn CommandGateway, hypervisor: &'a HypervisorConfig) -> Self {
        Self {
            gateway,
            hypervisor,
        }
    }

    /// Id of the existing container called `name`.
    pub async fn resolve_container_id(&self, name: &str) -> Result<ContainerId> {
        let output = self
            .gateway
            .run_or_fail(
                &HostCommand::LookupId {
                    name: name.to_string(),
                },
                &format!("Could not look up id of {name}"),
            )
            .await?;
        parse_container_id(&output, name)
    }

    /// Stop, dump and package the box. Returns the packaged archive path.
    pub async fn snapshot(&self, ctx: &BoxContext) -> Result<PathBuf> {
        self.quiesce(ctx).await?;
        self.package(ctx).await
    }

    /// Stop the container so it can be dumped.
    pub async fn quiesce(&self, ctx: &BoxContext) -> Result<()> {
        LifecycleController::new(self.gateway)
            .ensure_down(ctx.container_name())
            .await
    }

    /// Dump a stopped container and move the archive to the publish target.
    pub async fn package(&self, ctx: &BoxContext) -> Result<PathBuf> {
        let name = ctx.container_name();
        let id = self.resolve_container_id(name).await?;
        let dump = HostCommand::Dump {
            id,
            dump_dir: self.hypervisor.dump_dir.clone(),
        };
        let output = self.gateway.run(&dump).await?;
        if !output.success() {
            return Err(BoxError::ExternalCommand {
                command: dump.to_string(),
                exit_code: output.exit_code,
                message: format!("Could not dump box {name} to package it"),
            });
        }

        let archive = parse_archive_path(&output.combined())?;
        tracing::info!(container = %name, id = %id, archive = %archive.display(), "Container dumped");

        let target = ctx.publish_target_path();
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.gateway
            .run_or_fail(
                &HostCommand::MoveFile {
                    from: archive.clone(),
                    to: target.clone(),
                },
                &format!(
                    "Could not move dump {} to {}",
                    archive.display(),
                    target.display()
                ),
            )
            .await?;

        tracing::info!(container = %name, path = %target.display(), "Box packaged");
        Ok(target)
    }
}

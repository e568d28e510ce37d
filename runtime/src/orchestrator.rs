//! Box build and upload workflows.
//!
//! `build` runs fetch → install → create → configure → up → snapshot and,
//! when asked, publish. Every step is fatal on failure except bring-up,
//! which ends the workflow with [`BuildOutcome::Halted`] instead of an error.

use std::path::PathBuf;

use boxes_core::error::{BoxError, Result};
use boxes_core::{BoxContext, BoxesConfig, ContainerState, TemplateSource};

use crate::gateway::CommandGateway;
use crate::lifecycle::LifecycleController;
use crate::provision::ContainerProvisioner;
use crate::publish::{ArtifactStore, Publisher};
use crate::snapshot::Snapshotter;
use crate::template::TemplateFetcher;

/// Options of a single build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Base template override (URL or bare name)
    pub base: Option<String>,
    /// Delete and re-download the base template
    pub force_redownload: bool,
    /// Publish the packaged box
    pub upload: bool,
}

/// How a build ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Packaged locally, not published
    Packaged { archive: PathBuf },
    /// Packaged and published under `key`
    Published { archive: PathBuf, key: String },
    /// The container could not be brought up; nothing was packaged
    Halted { reason: String },
}

/// Composes the lifecycle components into workflows.
pub struct BoxBuilder<'a> {
    gateway: &'a dyn CommandGateway,
    config: &'a BoxesConfig,
    store: Option<&'a dyn ArtifactStore>,
}

impl<'a> BoxBuilder<'a> {
    pub fn new(gateway: &'a dyn CommandGateway, config: &'a BoxesConfig) -> Self {
        Self {
            gateway,
            config,
            store: None,
        }
    }

    /// Attach the artifact store used for publishing.
    pub fn with_store(mut self, store: &'a dyn ArtifactStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Context for `box_name` under the configured work dir.
    pub fn context(&self, box_name: &str) -> Result<BoxContext> {
        BoxContext::new(box_name, &self.config.work_dir)
    }

    fn require_store(&self) -> Result<&'a dyn ArtifactStore> {
        self.store.ok_or_else(|| {
            BoxError::ConfigError("Uploading requires an artifact store".to_string())
        })
    }

    /// Build a box and optionally publish it.
    pub async fn build(&self, box_name: &str, options: &BuildOptions) -> Result<BuildOutcome> {
        let ctx = self.context(box_name)?;
        let store = if options.upload {
            Some(self.require_store()?)
        } else {
            None
        };

        println!("Using the '{box_name}' image");
        let source = TemplateSource::resolve(&ctx, options.base.as_deref(), self.config)?;
        tracing::info!(box_name, base = %source.base(), "Resolved base template");

        TemplateFetcher::new(self.gateway)
            .ensure(&ctx, &source, options.force_redownload)
            .await?;

        let provisioner = ContainerProvisioner::new(self.gateway, &self.config.hypervisor);
        provisioner.install_template(&ctx, &source).await?;
        let id = provisioner.create_container(&ctx).await?;
        report(&ctx, ContainerState::Created);
        provisioner.apply_baseline(&ctx, id).await?;
        report(&ctx, ContainerState::Configured);

        if let Err(e) = LifecycleController::new(self.gateway)
            .ensure_up(ctx.container_name())
            .await
        {
            tracing::warn!(box_name, container = %ctx.container_name(), error = %e, "Bring-up failed, stopping build");
            return Ok(BuildOutcome::Halted {
                reason: e.to_string(),
            });
        }
        report(&ctx, ContainerState::Running);

        let snapshotter = Snapshotter::new(self.gateway, &self.config.hypervisor);
        snapshotter.quiesce(&ctx).await?;
        report(&ctx, ContainerState::Stopped);
        let archive = snapshotter.package(&ctx).await?;
        report(&ctx, ContainerState::Dumped);

        match store {
            Some(store) => {
                let key = Publisher::new(store).publish(box_name, &archive).await?;
                Ok(BuildOutcome::Published { archive, key })
            }
            None => Ok(BuildOutcome::Packaged { archive }),
        }
    }

    /// Publish the box packaged by a previous build.
    pub async fn upload(&self, box_name: &str) -> Result<String> {
        let ctx = self.context(box_name)?;
        let store = self.require_store()?;

        let archive = ctx.publish_target_path();
        if !tokio::fs::try_exists(&archive).await? {
            return Err(BoxError::NotFound(format!(
                "packaged box {} (run build first)",
                archive.display()
            )));
        }

        Publisher::new(store).publish(box_name, &archive).await
    }
}

fn report(ctx: &BoxContext, state: ContainerState) {
    tracing::info!(box_name = %ctx.box_name(), container = %ctx.container_name(), state = %state, "Box state changed");
}

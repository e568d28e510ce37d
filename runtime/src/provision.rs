//! Container provisioner.
//!
//! Installs the fetched template into the hypervisor cache, creates a
//! container from it under a freshly allocated id and applies the baseline
//! name/network/DNS configuration.

use boxes_core::error::{BoxError, Result};
use boxes_core::{BoxContext, ContainerId, HypervisorConfig, TemplateSource};

use crate::gateway::{CommandGateway, HostCommand};

/// Next free container id given `vzlist` id output.
///
/// Returns `max(existing) + 1`, or `floor + 1` when no ids exist. Tokens
/// that are not ids are ignored.
pub fn allocate_free_id(list_output: &str, floor: u32) -> ContainerId {
    let next = list_output
        .split_whitespace()
        .filter_map(|token| token.parse::<u32>().ok())
        .max()
        .unwrap_or(floor)
        .saturating_add(1);
    ContainerId(next)
}

/// Creates and configures the container for a box.
pub struct ContainerProvisioner<'a> {
    gateway: &'a dyn CommandGateway,
    hypervisor: &'a HypervisorConfig,
}

impl<'a> ContainerProvisioner<'a> {
    pub fn new(gateway: &'a dyn CommandGateway, hypervisor: &'a HypervisorConfig) -> Self {
        Self {
            gateway,
            hypervisor,
        }
    }

    /// Install, create and configure in one go. Returns the new container id.
    pub async fn provision(&self, ctx: &BoxContext, source: &TemplateSource) -> Result<ContainerId> {
        self.install_template(ctx, source).await?;
        let id = self.create_container(ctx).await?;
        self.apply_baseline(ctx, id).await?;
        Ok(id)
    }

    /// Copy the fetched template into the hypervisor cache as `<container>.tar.gz`.
    pub async fn install_template(&self, ctx: &BoxContext, source: &TemplateSource) -> Result<()> {
        let cached = self
            .hypervisor
            .template_cache
            .join(ctx.cached_template_name());

        // rm -f tolerates a missing file; anything else is fatal.
        self.gateway
            .run_or_fail(
                &HostCommand::RemoveFile {
                    path: cached.clone(),
                },
                &format!("Could not remove stale template {}", cached.display()),
            )
            .await?;

        let copy = HostCommand::CopyFile {
            from: source.local_path().to_path_buf(),
            to: cached.clone(),
        };
        let output = self.gateway.run(&copy).await?;
        if !output.success() {
            return Err(BoxError::ProvisioningError(format!(
                "Could not install template {} into {} (`{}` exited with {:?})",
                source.local_path().display(),
                cached.display(),
                copy,
                output.exit_code
            )));
        }

        tracing::info!(
            template = %source.local_path().display(),
            cache = %cached.display(),
            "Template installed"
        );
        Ok(())
    }

    /// Allocate a free id and create the container from the cached template.
    pub async fn create_container(&self, ctx: &BoxContext) -> Result<ContainerId> {
        let ids = self
            .gateway
            .run_or_fail(&HostCommand::ListIds, "Could not list container ids")
            .await?;
        let id = allocate_free_id(&ids, self.hypervisor.free_id_floor);

        self.gateway
            .run_or_fail(
                &HostCommand::Create {
                    id,
                    template: ctx.container_name().to_string(),
                },
                &format!("Could not create box {}", ctx.container_name()),
            )
            .await?;

        tracing::info!(container = %ctx.container_name(), id = %id, "Container created");
        Ok(id)
    }

    /// Set name, network and DNS. Stops at the first failing step.
    ///
    /// Nothing is rolled back; every step is safe to repeat against the same id.
    pub async fn apply_baseline(&self, ctx: &BoxContext, id: ContainerId) -> Result<()> {
        let name = ctx.container_name();
        let steps = [
            (
                HostCommand::SetName {
                    id,
                    name: name.to_string(),
                },
                format!("Could not name container {id} {name}"),
            ),
            (
                HostCommand::SetNetwork {
                    id,
                    bridge: self.hypervisor.bridge.clone(),
                },
                format!("Could not configure network of {name}"),
            ),
            (
                HostCommand::SetNameserver {
                    id,
                    nameserver: self.hypervisor.nameserver.clone(),
                },
                format!("Could not set nameserver of {name}"),
            ),
        ];

        for (command, message) in &steps {
            self.gateway.run_or_fail(command, message).await?;
        }

        tracing::info!(
            container = %name,
            id = %id,
            bridge = %self.hypervisor.bridge,
            nameserver = %self.hypervisor.nameserver,
            "Baseline configuration applied"
        );
        Ok(())
    }
}

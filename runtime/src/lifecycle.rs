//! Start/stop transitions.
//!
//! Running state is never cached: every decision asks the hypervisor.

use boxes_core::error::Result;

use crate::gateway::{CommandGateway, HostCommand};

/// Drives start/stop transitions of a named container.
pub struct LifecycleController<'a> {
    gateway: &'a dyn CommandGateway,
}

impl<'a> LifecycleController<'a> {
    pub fn new(gateway: &'a dyn CommandGateway) -> Self {
        Self { gateway }
    }

    /// Whether the container is running. Any failure reads as "not running".
    pub async fn is_running(&self, name: &str) -> bool {
        let command = HostCommand::ListRunning {
            name: name.to_string(),
        };
        match self.gateway.run(&command).await {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::warn!(container = %name, error = %e, "Running check failed, assuming stopped");
                false
            }
        }
    }

    /// Bring the container up, restarting it if it already runs.
    pub async fn ensure_up(&self, name: &str) -> Result<()> {
        if self.is_running(name).await {
            tracing::info!(container = %name, "Container already running, restarting");
            self.stop(name).await?;
        }

        self.gateway
            .run_or_fail(
                &HostCommand::Start {
                    name: name.to_string(),
                },
                &format!("Could not bring box {name} up"),
            )
            .await?;

        tracing::info!(container = %name, "Container started");
        Ok(())
    }

    /// Stop the container only if it is running.
    pub async fn ensure_down(&self, name: &str) -> Result<()> {
        if self.is_running(name).await {
            self.stop(name).await
        } else {
            tracing::debug!(container = %name, "Container not running, nothing to stop");
            Ok(())
        }
    }

    /// Issue a stop request.
    pub async fn stop(&self, name: &str) -> Result<()> {
        self.gateway
            .run_or_fail(
                &HostCommand::Stop {
                    name: name.to_string(),
                },
                &format!("Could not halt box {name}"),
            )
            .await?;

        tracing::info!(container = %name, "Container stopped");
        Ok(())
    }
}

//! Boxes Runtime - box lifecycle engine.
//!
//! Fetches base templates, provisions OpenVZ containers from them, snapshots
//! the result and publishes it to an artifact store. All host interaction
//! goes through [`CommandGateway`]; all publishing through [`ArtifactStore`].

pub mod base;
pub mod gateway;
pub mod lifecycle;
pub mod orchestrator;
pub mod provision;
pub mod publish;
pub mod snapshot;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

// Re-export common types
pub use base::BaseBuilder;
pub use gateway::{CommandGateway, CommandOutput, HostCommand, ProcessGateway};
pub use lifecycle::LifecycleController;
pub use orchestrator::{BoxBuilder, BuildOptions, BuildOutcome};
pub use provision::{allocate_free_id, ContainerProvisioner};
pub use publish::{ArtifactStore, HttpArtifactStore, Publisher};
pub use snapshot::{parse_archive_path, parse_container_id, Snapshotter};
pub use template::TemplateFetcher;

/// Boxes Runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

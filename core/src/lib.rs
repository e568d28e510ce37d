//! Boxes Core - Foundational Types
//!
//! Errors, configuration, naming rules and the per-invocation context shared
//! by the box provisioning runtime and CLI.

pub mod config;
pub mod context;
pub mod error;
pub mod naming;

// Re-export commonly used types
pub use config::{BoxDefinition, BoxesConfig, HypervisorConfig, StoreConfig};
pub use context::{BoxContext, ContainerId, ContainerState, TemplateSource};
pub use error::{BoxError, Result};

/// Boxes version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

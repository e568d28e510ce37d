//! Per-invocation context, built once at workflow entry and never mutated.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::BoxesConfig;
use crate::error::{BoxError, Result};
use crate::naming;

/// Identity and filesystem layout of the box a workflow operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxContext {
    box_name: String,
    container_name: String,
    work_dir: PathBuf,
}

impl BoxContext {
    /// Build the context for `box_name` rooted at `work_dir`.
    pub fn new(box_name: &str, work_dir: impl Into<PathBuf>) -> Result<Self> {
        validate_box_name(box_name)?;
        Ok(Self {
            box_name: box_name.to_string(),
            container_name: naming::container_name(box_name),
            work_dir: work_dir.into(),
        })
    }

    pub fn box_name(&self) -> &str {
        &self.box_name
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// `<work-dir>/templates`
    pub fn templates_dir(&self) -> PathBuf {
        naming::templates_dir(&self.work_dir)
    }

    /// Where the packaged snapshot lands before it is published.
    pub fn publish_target_path(&self) -> PathBuf {
        naming::publish_target_path(&self.work_dir, &self.container_name)
    }

    /// Template name the hypervisor cache knows this box's template by.
    pub fn cached_template_name(&self) -> String {
        format!("{}.tar.gz", self.container_name)
    }
}

fn validate_box_name(box_name: &str) -> Result<()> {
    if box_name.is_empty() {
        return Err(BoxError::ConfigError("Box name must not be empty".to_string()));
    }
    if box_name
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_whitespace())
    {
        return Err(BoxError::ConfigError(format!(
            "Invalid box name '{box_name}': must not contain path separators or whitespace"
        )));
    }
    Ok(())
}

/// Resolved base template: where it comes from and where it is kept locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    base: String,
    local_path: PathBuf,
}

impl TemplateSource {
    /// Resolve the base reference once for this invocation.
    pub fn resolve(ctx: &BoxContext, explicit: Option<&str>, config: &BoxesConfig) -> Result<Self> {
        let base = naming::resolve_base(explicit, ctx.box_name(), config)?;
        let local_path = naming::template_local_path(ctx.work_dir(), &base)?;
        Ok(Self { base, local_path })
    }

    /// The base reference (URL).
    pub fn base(&self) -> &str {
        &self.base
    }

    /// `<work-dir>/templates/<basename-of-base>`
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }
}

/// Hypervisor-assigned container id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerId(pub u32);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stages a box passes through during a build.
///
/// Only used for progress reporting; the hypervisor is always asked for the
/// real state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Configured,
    Running,
    Stopped,
    Dumped,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerState::Created => "created",
            ContainerState::Configured => "configured",
            ContainerState::Running => "running",
            ContainerState::Stopped => "stopped",
            ContainerState::Dumped => "dumped",
        };
        f.write_str(s)
    }
}

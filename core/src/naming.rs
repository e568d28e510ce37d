//! Canonical names and paths derived from a box name.
//!
//! Everything here is a pure function: no I/O, no hypervisor queries.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::config::BoxesConfig;
use crate::error::{BoxError, Result};

/// Prefix of every container (and published alias) name.
pub const CONTAINER_PREFIX: &str = "travis";

/// Root that bare base-template names are expanded against.
pub const BASE_TEMPLATE_ROOT: &str = "http://files.travis-ci.org/openvz-templates/bases";

/// Directory (under the work dir) holding fetched templates and packaged snapshots.
pub const TEMPLATES_DIR: &str = "templates";

/// Prefix under which packaged boxes are published.
pub const PUBLISH_PREFIX: &str = "provisioned";

/// Box name used when none is given.
pub const DEFAULT_BOX: &str = "development";

/// Scheme prefixes that mark a base reference as a full URL.
const URL_SCHEMES: &[&str] = &["http://", "https://", "ftp://"];

/// Container name for a box: `travis-<box>`.
pub fn container_name(box_name: &str) -> String {
    format!("{CONTAINER_PREFIX}-{box_name}")
}

/// Resolve the base template reference for a box.
///
/// An explicit override wins: it is lowercased, returned as-is when it
/// already carries a URL scheme, and otherwise expanded to
/// `<BASE_TEMPLATE_ROOT>/<name>.tar.gz`. Without an override the configured
/// default for the box is returned unmodified.
pub fn resolve_base(explicit: Option<&str>, box_name: &str, config: &BoxesConfig) -> Result<String> {
    if let Some(input) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(expand_base(input));
    }

    config.base_for(box_name).map(str::to_string).ok_or_else(|| {
        BoxError::ConfigError(format!(
            "No base template configured for box '{box_name}' (pass --base)"
        ))
    })
}

fn expand_base(input: &str) -> String {
    let lowered = input.to_lowercase();
    if URL_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        lowered
    } else {
        format!("{BASE_TEMPLATE_ROOT}/{lowered}.tar.gz")
    }
}

/// File name a base reference is stored under locally (its last path segment).
pub fn template_file_name(base: &str) -> Result<&str> {
    base.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            BoxError::ConfigError(format!("Base template '{base}' has no file name"))
        })
}

/// `<work-dir>/templates`
pub fn templates_dir(work_dir: &Path) -> PathBuf {
    work_dir.join(TEMPLATES_DIR)
}

/// `<work-dir>/templates/<basename-of-base>`
pub fn template_local_path(work_dir: &Path, base: &str) -> Result<PathBuf> {
    Ok(templates_dir(work_dir).join(template_file_name(base)?))
}

/// `<work-dir>/templates/<container-name>.tar.gz`
pub fn publish_target_path(work_dir: &Path, container_name: &str) -> PathBuf {
    templates_dir(work_dir).join(format!("{container_name}.tar.gz"))
}

/// `provisioned/<box>/<YYYY-MM-DD-HHMM>.tar.gz`
pub fn timestamped_key<Tz>(box_name: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{PUBLISH_PREFIX}/{box_name}/{}.tar.gz",
        at.format("%Y-%m-%d-%H%M")
    )
}

/// `provisioned/travis-<box>.tar.gz`
pub fn latest_alias(box_name: &str) -> String {
    format!("{PUBLISH_PREFIX}/{}.tar.gz", container_name(box_name))
}

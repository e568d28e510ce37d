use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{BoxError, Result};

/// Environment variable consulted when the store token is not configured.
pub const STORE_TOKEN_ENV: &str = "BOXES_STORE_TOKEN";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxesConfig {
    /// Root for `templates/` and `boxes/`
    pub work_dir: PathBuf,

    /// Hypervisor settings
    pub hypervisor: HypervisorConfig,

    /// Artifact store settings
    pub store: StoreConfig,

    /// Per-box definitions, keyed by box name
    pub boxes: BTreeMap<String, BoxDefinition>,
}

impl BoxesConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            BoxError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config: BoxesConfig = serde_yaml::from_str(&data).map_err(|e| {
            BoxError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        if config.work_dir.as_os_str().is_empty() {
            config.work_dir = PathBuf::from(".");
        }
        tracing::debug!(path = %path.display(), boxes = config.boxes.len(), "Loaded configuration");
        Ok(config)
    }

    /// Load from the first existing default location, or fall back to defaults.
    ///
    /// Searches `./config/boxes.yml`, then `~/.boxes/config.yml`.
    pub fn load_default() -> Result<Self> {
        for candidate in Self::default_paths() {
            if candidate.exists() {
                return Self::load(&candidate);
            }
        }
        tracing::debug!("No configuration file found, using defaults");
        Ok(Self {
            work_dir: PathBuf::from("."),
            ..Self::default()
        })
    }

    /// Candidate configuration paths, in search order.
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config").join("boxes.yml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".boxes").join("config.yml"));
        }
        paths
    }

    /// Configured default base template for a box, if any.
    pub fn base_for(&self, box_name: &str) -> Option<&str> {
        self.boxes
            .get(box_name)
            .and_then(|def| def.base.as_deref())
            .filter(|base| !base.is_empty())
    }
}

/// Hypervisor (OpenVZ) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HypervisorConfig {
    /// Wrap privileged commands with `sudo`
    pub sudo: bool,

    /// Hypervisor template cache directory
    pub template_cache: PathBuf,

    /// Directory the dump facility writes archives into
    pub dump_dir: PathBuf,

    /// Bridge for the single bridged network interface
    pub bridge: String,

    /// Public DNS resolver set on every container
    pub nameserver: String,

    /// Container ids are allocated above this floor when none exist
    pub free_id_floor: u32,
}

impl Default for HypervisorConfig {
    fn default() -> Self {
        Self {
            sudo: true,
            template_cache: PathBuf::from("/var/lib/vz/template/cache"),
            dump_dir: PathBuf::from("/var/lib/vz/dump"),
            bridge: "br0".to_string(),
            nameserver: "8.8.8.8".to_string(),
            free_id_floor: 1000,
        }
    }
}

/// Artifact store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL objects are stored under
    pub endpoint: Option<String>,

    /// Bearer token (optional, falls back to `BOXES_STORE_TOKEN`)
    pub token: Option<String>,
}

impl StoreConfig {
    /// Token from the config file, or from the environment.
    pub fn resolved_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var(STORE_TOKEN_ENV).ok())
            .filter(|t| !t.is_empty())
    }
}

/// Definition of a single box
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxDefinition {
    /// Default base template URL
    pub base: Option<String>,
}

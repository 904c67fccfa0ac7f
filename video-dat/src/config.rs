//! Writer configuration (TOML)
//!
//! Lets a capture setup keep its container settings in a file instead of
//! hard-coding them:
//!
//! ```toml
//! version = 3
//! site_id_present = true
//! is_sender_present = false
//! ```
//!
//! Missing keys fall back to the defaults below. The version is validated
//! when the file is created, not when the config is parsed.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::format::PresenceFlags;

/// Settings for [`VideoFile::create_with_config`](crate::VideoFile::create_with_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Container format version (default: 3)
    #[serde(default = "default_version")]
    pub version: u32,
    /// Mark the site identifier as present (default: false)
    #[serde(default)]
    pub site_id_present: bool,
    /// Mark the sender flag as present (default: false)
    #[serde(default)]
    pub is_sender_present: bool,
}

fn default_version() -> u32 {
    3
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            site_id_present: false,
            is_sender_present: false,
        }
    }
}

impl WriterConfig {
    pub fn presence(&self) -> PresenceFlags {
        PresenceFlags {
            site_id: self.site_id_present,
            is_sender: self.is_sender_present,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse writer config")
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize writer config")
    }

    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read writer config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid writer config: {}", path.display()))
    }
}

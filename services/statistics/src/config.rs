//! Statistics service configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use services_common::DEFAULT_WINDOW_MS;
use std::path::Path;

/// Statistics service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Trailing statistics window in milliseconds
    pub window_ms: u64,

    /// HTTP listen address
    pub bind: String,

    /// Audit log settings
    pub audit: AuditConfig,
}

/// Audit log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Open the audit log at startup
    pub enabled: bool,

    /// Directory holding audit segments
    pub dir: String,

    /// Segment rotation size in bytes
    pub segment_size: u64,

    /// Flush interval in seconds
    pub flush_interval_secs: u64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            bind: "0.0.0.0:8080".to_string(),
            audit: AuditConfig::default(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "./data/audit".to_string(),
            segment_size: 64 * 1024 * 1024,
            flush_interval_secs: 5,
        }
    }
}

impl StatisticsConfig {
    /// Load configuration from a JSON file, or defaults when no path given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }
}

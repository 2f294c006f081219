//! Dashboard Configuration

use anyhow::Context;
use pocp_sync::REQUEST_TIMEOUT_MS;
use pocp_timer::{TimerConfig, NOMINAL_ROUND_MS, TICK_MS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Backend base URL
    pub backend_url: String,
    /// Timer render interval in milliseconds
    pub tick_ms: u64,
    /// Round length mapped to a full progress bar, in milliseconds
    pub round_ms: u64,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".to_string(),
            tick_ms: TICK_MS,
            round_ms: NOMINAL_ROUND_MS,
            timeout_ms: REQUEST_TIMEOUT_MS,
        }
    }
}

impl DashboardConfig {
    /// Load from a JSON file; missing keys keep their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig {
            tick: Duration::from_millis(self.tick_ms.max(1)),
            nominal_duration: Duration::from_millis(self.round_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

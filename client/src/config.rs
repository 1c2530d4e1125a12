use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use common::session::DEFAULT_JOIN_TIMEOUT;

pub const DEFAULT_CONFIG_FILE: &str = "tictactoe_client_config.yaml";

const DEFAULT_RELAY_ADDRESS: &str = "127.0.0.1:7155";
const MAX_JOIN_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ClientConfig {
    pub relay_address: String,
    pub join_timeout_ms: u64,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.relay_address.is_empty() {
            return Err("relay_address must not be empty".to_string());
        }
        if self.join_timeout_ms == 0 {
            return Err("join_timeout_ms must be greater than 0".to_string());
        }
        if self.join_timeout_ms > MAX_JOIN_TIMEOUT_MS {
            return Err(format!(
                "join_timeout_ms must not exceed {}",
                MAX_JOIN_TIMEOUT_MS
            ));
        }
        Ok(())
    }

    /// Loads the config file, falling back to defaults when it does not
    /// exist. A present-but-broken file is an error rather than a silent
    /// default.
    pub fn load(path: &str) -> Result<Self, String> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
        let config: Self = serde_yaml_ng::from_str(&content)
            .map_err(|e| format!("Failed to parse {}: {}", path, e))?;

        config
            .validate()
            .map_err(|e| format!("Config validation error: {}", e))?;

        Ok(config)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_address: DEFAULT_RELAY_ADDRESS.to_string(),
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT.as_millis() as u64,
        }
    }
}

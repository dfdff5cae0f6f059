//! Configuration for the Record Extractor

use serde::{Deserialize, Serialize};

/// Configuration for the Record Extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Maximum message-body prefix (in characters) forwarded to the
    /// classification service. Bodies are cut to this length before the
    /// prompt is assembled, bounding cost and latency at the price of
    /// lossy extraction on very long notifications.
    pub max_body_chars: usize,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_body_chars == 0 {
            return Err("max_body_chars must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_body_chars: 2000,
        }
    }
}

//! Configuration loading from files

use super::types::LoaderConfig;
use super::validator::ConfigValidator;
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a JSON file
    pub fn load_json(path: &Path) -> Result<LoaderConfig, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: LoaderConfig =
            serde_json::from_str(&content).map_err(|e| format!("Failed to parse JSON: {}", e))?;

        ConfigValidator::validate_all(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::LoaderConfig;

    #[test]
    fn application_config_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.streaming.cache_size_bytes, 64 * 1024 * 1024);
        assert!(config.activation.enable_smooth_transitions);
    }

    #[test]
    fn load_json_rejects_missing_file() {
        assert!(ConfigLoader::load_json(Path::new("/nonexistent/config.json")).is_err());
    }
}

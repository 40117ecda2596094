//! Configuration validation

use super::types::{ActivationConfig, DiffConfig, LoaderConfig, StreamingConfig};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate streaming configuration
    pub fn validate_streaming(config: &StreamingConfig) -> Result<(), String> {
        if config.cache_size_bytes == 0 {
            return Err("cache_size_bytes must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Validate differential codec configuration
    pub fn validate_diff(config: &DiffConfig) -> Result<(), String> {
        if let Some(level) = config.optimization_level {
            if !(1..=5).contains(&level) {
                return Err("optimization_level must be between 1 and 5".to_string());
            }
        }
        if !(0.0..=1.0).contains(&config.sparsity_threshold) && config.sparsity_threshold != 1e-4 {
            return Err("sparsity_threshold must be non-negative".to_string());
        }
        if config.quantization_bits == 0 || config.quantization_bits > 16 {
            return Err("quantization_bits must be between 1 and 16".to_string());
        }
        Ok(())
    }

    /// Validate extension-activation configuration
    pub fn validate_activation(config: &ActivationConfig) -> Result<(), String> {
        if !(0.0..=1.0).contains(&config.global_quality_threshold) {
            return Err("global_quality_threshold must be in [0,1]".to_string());
        }
        if !(0.0..=1.0).contains(&config.global_performance_budget) {
            return Err("global_performance_budget must be in [0,1]".to_string());
        }
        if config.default_transition_duration_s <= 0.0 {
            return Err("default_transition_duration_s must be positive".to_string());
        }
        Ok(())
    }

    /// Validate complete configuration
    pub fn validate_all(config: &LoaderConfig) -> Result<(), String> {
        Self::validate_streaming(&config.streaming)?;
        Self::validate_diff(&config.diff)?;
        Self::validate_activation(&config.activation)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::LoaderConfig;

    #[test]
    fn validate_all_defaults() {
        let config = LoaderConfig::default();
        assert!(ConfigValidator::validate_all(&config).is_ok());
    }

    #[test]
    fn validate_streaming_rejects_zero() {
        let mut config = LoaderConfig::default();
        config.streaming.cache_size_bytes = 0;
        assert!(ConfigValidator::validate_streaming(&config.streaming).is_err());
    }

    #[test]
    fn validate_diff_rejects_bad_optimization_level() {
        let mut config = LoaderConfig::default();
        config.diff.optimization_level = Some(9);
        assert!(ConfigValidator::validate_diff(&config.diff).is_err());
    }

    #[test]
    fn validate_diff_rejects_zero_bits() {
        let mut config = LoaderConfig::default();
        config.diff.quantization_bits = 0;
        assert!(ConfigValidator::validate_diff(&config.diff).is_err());
    }

    #[test]
    fn validate_activation_rejects_budget_out_of_range() {
        let mut config = LoaderConfig::default();
        config.activation.global_performance_budget = 1.5;
        assert!(ConfigValidator::validate_activation(&config.activation).is_err());
    }
}

//! Configuration types for the loader/codec/extension subsystems.

use serde::{Deserialize, Serialize};

/// Configuration source priority (higher = more important).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ConfigSource {
    #[default]
    Default = 0,
    File = 1,
    Environment = 2,
    CommandLine = 3,
}

/// Output of the external hardware-capability probe, consumed only as a
/// configuration hint: the crate never probes hardware itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HardwareHint {
    /// Bitmask of detected SIMD capabilities; opaque to this crate.
    pub simd_flags: u32,
    pub thread_count: usize,
    pub recommended_pool_size: usize,
}

impl Default for HardwareHint {
    fn default() -> Self {
        Self {
            simd_flags: 0,
            thread_count: 1,
            recommended_pool_size: 1,
        }
    }
}

/// Knobs for the streaming loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    pub cache_size_bytes: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            cache_size_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Knobs for the differential codec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// 1-5, or `None` to leave similarity_threshold / enable_sparse_diff /
    /// enable_quantization to be set directly by the caller.
    pub optimization_level: Option<u8>,
    pub sparsity_threshold: f32,
    pub quantization_bits: u8,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            optimization_level: Some(3),
            sparsity_threshold: 1e-4,
            quantization_bits: 8,
        }
    }
}

/// Knobs for extension activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationConfig {
    pub enable_smooth_transitions: bool,
    pub default_transition_duration_s: f32,
    pub global_quality_threshold: f32,
    pub global_performance_budget: f32,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            enable_smooth_transitions: true,
            default_transition_duration_s: 0.5,
            global_quality_threshold: 0.0,
            global_performance_budget: 1.0,
        }
    }
}

/// Whether readers verify layer checksums. Spec §9 open question 2: readers
/// MUST verify unless the writer explicitly disabled checksums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChecksumPolicy {
    #[default]
    AlwaysVerify,
    TrustWriterFlag,
}

/// Complete loader-facing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub streaming: StreamingConfig,
    pub diff: DiffConfig,
    pub activation: ActivationConfig,
    pub checksum_policy: ChecksumPolicy,
    pub hardware_hint: HardwareHint,
    #[serde(skip)]
    pub source: ConfigSource,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            streaming: StreamingConfig::default(),
            diff: DiffConfig::default(),
            activation: ActivationConfig::default(),
            checksum_policy: ChecksumPolicy::default(),
            hardware_hint: HardwareHint::default(),
            source: ConfigSource::Default,
        }
    }
}

impl LoaderConfig {
    /// Record a hardware hint from the external capability probe.
    pub fn with_hardware_hint(mut self, hint: HardwareHint) -> Self {
        self.hardware_hint = hint;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = LoaderConfig::default();
        assert_eq!(config.checksum_policy, ChecksumPolicy::AlwaysVerify);
        assert!(config.streaming.cache_size_bytes > 0);
    }
}

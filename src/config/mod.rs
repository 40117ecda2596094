//! Configuration management for the loader, differential codec, and
//! extension-activation subsystems.

pub mod loader;
pub mod types;
pub mod validator;

pub use loader::ConfigLoader;
pub use types::{
    ActivationConfig, ChecksumPolicy, ConfigSource, DiffConfig, HardwareHint, LoaderConfig,
    StreamingConfig,
};
pub use validator::ConfigValidator;

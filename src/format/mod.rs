//! On-disk record definitions for the LEF base format and the LEFX
//! extension format. Each submodule owns one record: fixed-width
//! read/write plus the validation each record's fields demand at parse time.

pub mod activation_rule;
pub mod dependency;
pub mod extension_meta;
pub mod flags;
pub mod header;
pub mod layer;
pub mod lefx_header;
pub mod lefx_layer;
pub mod model_meta;
pub mod version;

pub use activation_rule::{ActivationRule, ConditionOperator, ConditionType};
pub use dependency::{Dependency, DependencyType, LoadOrder};
pub use extension_meta::ExtensionMeta;
pub use flags::HeaderFlags;
pub use header::{Header, CODE_VERSION, HEADER_SIZE, LEF_MAGIC};
pub use layer::{LayerHeader, LayerIndexEntry, LayerKind};
pub use lefx_header::{ExtensionType, LefxHeader, LEFX_HEADER_SIZE, LEFX_MAGIC};
pub use lefx_layer::{ActivationCondition, BlendMode, LefxLayerHeader, NO_BASE_LAYER};
pub use model_meta::{ModelMeta, QuantizationKind, MODEL_META_SIZE};
pub use version::Version;

//! Rule-driven extension activation and smooth blend-weight transitions.
//! Built on top of [`crate::extension`], which handles
//! loading and value blending; this module decides *which* loaded
//! extensions are active, at what weight, and how that weight moves over
//! time.

pub mod context;
pub mod manager;
pub mod registry;
pub mod rules;
pub mod transition;

pub use context::EvalContext;
pub use manager::{ActivationManager, ActivationResult};
pub use registry::ExtensionRegistry;
pub use rules::match_score;
pub use transition::{TransitionCurve, TransitionState};

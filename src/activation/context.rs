//! The runtime facts activation rules are evaluated against.
//! This is the crate's side of the boundary: the inference engine that
//! actually knows the current utterance and speaker is out of scope (spec
//! §1), so callers populate one of these per evaluation.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalContext {
    pub input_text: String,
    pub speaker_id: i64,
    pub speaker_gender: Option<i64>,
    pub speaker_age: Option<i64>,
    pub pitch_preference: f32,
    pub language_hint: String,
}

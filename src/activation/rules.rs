//! Per-rule match scoring. Every defined condition/operator combination
//! returns a score in `[0.0, 1.0]`; undefined combinations score 0.0 rather
//! than guessing a meaning for them.

use super::context::EvalContext;
use crate::format::{ActivationRule, ConditionOperator, ConditionType};

fn parse_pair(value: &str, sep: char) -> Option<(f32, f32)> {
    let mut parts = value.splitn(2, sep);
    let lo: f32 = parts.next()?.trim().parse().ok()?;
    let hi: f32 = parts.next()?.trim().parse().ok()?;
    Some((lo, hi))
}

fn score_bool(matched: bool) -> f32 {
    if matched {
        1.0
    } else {
        0.0
    }
}

/// Match `rule.condition_value`/`rule.operator` against `ctx`, per the
/// condition-type/operator combination table below.
pub fn match_score(rule: &ActivationRule, ctx: &EvalContext) -> f32 {
    let value = rule.condition_value.as_str();
    match (rule.condition_type, rule.operator) {
        (ConditionType::Text, ConditionOperator::Eq) => score_bool(ctx.input_text == value),
        (ConditionType::Text, ConditionOperator::Contains) => score_bool(ctx.input_text.contains(value)),
        (ConditionType::Text, ConditionOperator::Range) => match parse_pair(value, '-') {
            Some((lo, hi)) => {
                let len = ctx.input_text.chars().count() as f32;
                score_bool(len >= lo && len <= hi)
            }
            None => 0.0,
        },
        (ConditionType::Speaker, ConditionOperator::Eq) => match value.trim().parse::<i64>() {
            Ok(want) => score_bool(ctx.speaker_id == want),
            Err(_) => 0.0,
        },
        (ConditionType::Speaker, ConditionOperator::Contains) => {
            let Some((field, raw)) = value.split_once(':') else {
                return 0.0;
            };
            let Ok(want) = raw.trim().parse::<i64>() else {
                return 0.0;
            };
            match field {
                "gender" => score_bool(ctx.speaker_gender == Some(want)),
                "age" => score_bool(ctx.speaker_age == Some(want)),
                _ => 0.0,
            }
        }
        (ConditionType::Speaker, ConditionOperator::Range) => match parse_pair(value, ':') {
            Some((lo, hi)) => score_bool(ctx.pitch_preference >= lo && ctx.pitch_preference <= hi),
            None => 0.0,
        },
        (ConditionType::Language, ConditionOperator::Eq) => score_bool(ctx.language_hint == value),
        (ConditionType::Language, ConditionOperator::Contains) => {
            score_bool(ctx.language_hint.starts_with(value))
        }
        (ConditionType::Time, _) | (ConditionType::Custom, _) => 1.0,
        _ => 0.0,
    }
}

//! `ActivationManager`: a registry of extensions plus a pure rule evaluator
//! and a performance-budget optimizer.

use super::context::EvalContext;
use super::rules::match_score;
use super::transition::{TransitionCurve, TransitionState};
use crate::config::ActivationConfig;
use crate::error::{LefError, LefResult};
use crate::extension::ExtensionModel;
use crate::format::extension_meta::CONDITIONAL;
use std::sync::Arc;

/// Outcome of evaluating one extension's activation rules against a context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationResult {
    pub should_activate: bool,
    pub activation_weight: f32,
    pub blend_weight: f32,
    pub confidence_score: f32,
    pub matched_rule_id: Option<u32>,
}

impl ActivationResult {
    fn inactive() -> Self {
        Self {
            should_activate: false,
            activation_weight: 0.0,
            blend_weight: 0.0,
            confidence_score: 0.0,
            matched_rule_id: None,
        }
    }

    fn unconditional() -> Self {
        Self {
            should_activate: true,
            activation_weight: 1.0,
            blend_weight: 1.0,
            confidence_score: 1.0,
            matched_rule_id: None,
        }
    }
}

fn weighted_sum(extensions: &[Arc<ExtensionModel>], results: &[Option<ActivationResult>]) -> f32 {
    extensions
        .iter()
        .zip(results.iter())
        .filter_map(|(ext, r)| {
            r.as_ref()
                .filter(|r| r.should_activate)
                .map(|r| r.activation_weight * ext.meta.performance_impact)
        })
        .sum()
}

pub struct ActivationManager {
    extensions: Vec<Arc<ExtensionModel>>,
    activation_results: Vec<Option<ActivationResult>>,
    transition_states: Vec<Option<TransitionState>>,
    pub global_quality_threshold: f32,
    pub global_performance_budget: f32,
    pub enable_smooth_transitions: bool,
    pub default_transition_duration_s: f32,
    cached_context: Option<EvalContext>,
    cache_valid: bool,
}

impl ActivationManager {
    pub fn new(config: &ActivationConfig) -> Self {
        Self {
            extensions: Vec::new(),
            activation_results: Vec::new(),
            transition_states: Vec::new(),
            global_quality_threshold: config.global_quality_threshold,
            global_performance_budget: config.global_performance_budget,
            enable_smooth_transitions: config.enable_smooth_transitions,
            default_transition_duration_s: config.default_transition_duration_s,
            cached_context: None,
            cache_valid: false,
        }
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn extension(&self, index: usize) -> Option<&Arc<ExtensionModel>> {
        self.extensions.get(index)
    }

    pub fn result(&self, index: usize) -> Option<&ActivationResult> {
        self.activation_results.get(index).and_then(|r| r.as_ref())
    }

    /// Append a registered extension. A plain `Vec::push` already grows
    /// geometrically; the three parallel vectors stay in lockstep.
    pub fn register(&mut self, ext: Arc<ExtensionModel>) {
        self.extensions.push(ext);
        self.activation_results.push(None);
        self.transition_states.push(None);
        self.cache_valid = false;
    }

    /// Remove an extension by object identity (not by name or id, in case
    /// two distinct loaded copies share either). Compacts the three
    /// parallel vectors so indices stay aligned.
    pub fn unregister(&mut self, ext: &Arc<ExtensionModel>) -> bool {
        let Some(pos) = self.extensions.iter().position(|e| Arc::ptr_eq(e, ext)) else {
            return false;
        };
        self.extensions.remove(pos);
        self.activation_results.remove(pos);
        self.transition_states.remove(pos);
        self.cache_valid = false;
        true
    }

    /// Pure: evaluate one extension's rules against `ctx`, independent of
    /// this manager's registered set.
    pub fn evaluate_single(ext: &ExtensionModel, ctx: &EvalContext) -> ActivationResult {
        if ext.meta.capability_flags & CONDITIONAL == 0 {
            return ActivationResult::unconditional();
        }
        if ext.activation_rules.is_empty() {
            return ActivationResult::inactive();
        }

        let matches: Vec<(&crate::format::ActivationRule, f32)> = ext
            .activation_rules
            .iter()
            .map(|rule| (rule, match_score(rule, ctx)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        if matches.is_empty() {
            return ActivationResult::inactive();
        }

        let score_sum: f32 = matches.iter().map(|(_, s)| s).sum();
        let weighted_weight: f32 = matches.iter().map(|(r, s)| r.activation_weight * s).sum();
        let activation_weight = weighted_weight / score_sum;
        let confidence_score = score_sum / matches.len() as f32;
        let matched_rule_id = matches[0].0.rule_id;

        ActivationResult {
            should_activate: true,
            activation_weight,
            blend_weight: activation_weight,
            confidence_score,
            matched_rule_id: Some(matched_rule_id),
        }
    }

    /// Evaluate every registered extension against `ctx`, caching the
    /// result so a repeated call with the same context is free.
    pub fn evaluate_all(&mut self, ctx: &EvalContext) {
        if self.cache_valid && self.cached_context.as_ref() == Some(ctx) {
            return;
        }
        for (i, ext) in self.extensions.iter().enumerate() {
            self.activation_results[i] = Some(Self::evaluate_single(ext, ctx));
        }
        self.cached_context = Some(ctx.clone());
        self.cache_valid = true;
    }

    /// Begin a smooth transition of extension `index`'s blend_weight toward
    /// `target_weight`. No-op (returns the target immediately) if smooth
    /// transitions are disabled.
    pub fn start_transition(&mut self, index: usize, target_weight: f32, now_us: u64) -> LefResult<()> {
        let current = self
            .activation_results
            .get(index)
            .and_then(|r| r.as_ref())
            .map(|r| r.blend_weight)
            .ok_or_else(|| LefError::InvalidArgument(format!("no activation result at index {index}")))?;

        if !self.enable_smooth_transitions {
            if let Some(result) = self.activation_results[index].as_mut() {
                result.blend_weight = target_weight;
            }
            self.transition_states[index] = Some(TransitionState::settled(target_weight));
            return Ok(());
        }

        self.transition_states[index] = Some(TransitionState::start(
            current,
            target_weight,
            self.default_transition_duration_s,
            TransitionCurve::EaseOut,
            now_us,
        ));
        Ok(())
    }

    /// Advance every in-flight transition to `now_us`, writing the implied
    /// blend_weight back into each extension's [`ActivationResult`].
    pub fn update_transitions(&mut self, now_us: u64) {
        for i in 0..self.transition_states.len() {
            let Some(state) = self.transition_states[i].as_mut() else {
                continue;
            };
            if !state.is_transitioning {
                continue;
            }
            let weight = state.update(now_us);
            if let Some(result) = self.activation_results[i].as_mut() {
                result.blend_weight = weight;
            }
        }
    }

    /// Enforce a performance `budget` by deactivating
    /// the costliest active extensions (by descending
    /// `performance_impact / quality_score`) until the weighted sum fits.
    pub fn optimize_activations(&mut self, budget: f32) {
        let budget = budget.clamp(0.0, 1.0);
        let mut sum = weighted_sum(&self.extensions, &self.activation_results);
        if sum <= budget + 1e-6 {
            return;
        }

        let mut order: Vec<usize> = (0..self.activation_results.len())
            .filter(|&i| self.activation_results[i].as_ref().map(|r| r.should_activate).unwrap_or(false))
            .collect();
        order.sort_by(|&a, &b| {
            let ratio = |i: usize| {
                let meta = &self.extensions[i].meta;
                meta.performance_impact / meta.quality_score.max(f32::EPSILON)
            };
            ratio(b)
                .partial_cmp(&ratio(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        for i in order {
            if sum <= budget {
                break;
            }
            let impact = self.extensions[i].meta.performance_impact;
            if let Some(result) = self.activation_results[i].as_mut() {
                sum -= result.activation_weight * impact;
                result.activation_weight = 0.0;
                result.blend_weight = 0.0;
                result.should_activate = false;
            }
        }
    }
}

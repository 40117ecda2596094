//! Smooth blend-weight transitions. Time is passed in rather than read from
//! the clock, so `update_transitions` stays a pure function of
//! `(state, now_us)` and timing-sensitive tests stay exactly reproducible.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCurve {
    Linear,
    EaseIn,
    EaseOut,
}

impl TransitionCurve {
    fn apply(self, progress: f32) -> f32 {
        match self {
            TransitionCurve::Linear => progress,
            TransitionCurve::EaseIn => progress * progress,
            TransitionCurve::EaseOut => 1.0 - (1.0 - progress).powi(2),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TransitionState {
    pub is_transitioning: bool,
    pub prev_weight: f32,
    pub target_weight: f32,
    pub transition_start_time_us: u64,
    pub transition_duration_s: f32,
    pub transition_progress: f32,
    pub curve: TransitionCurve,
}

impl TransitionState {
    /// A settled, non-transitioning state at `weight`.
    pub fn settled(weight: f32) -> Self {
        Self {
            is_transitioning: false,
            prev_weight: weight,
            target_weight: weight,
            transition_start_time_us: 0,
            transition_duration_s: 0.0,
            transition_progress: 1.0,
            curve: TransitionCurve::Linear,
        }
    }

    /// Begin transitioning from `current_weight` toward `target_weight`.
    pub fn start(current_weight: f32, target_weight: f32, duration_s: f32, curve: TransitionCurve, now_us: u64) -> Self {
        Self {
            is_transitioning: true,
            prev_weight: current_weight,
            target_weight,
            transition_start_time_us: now_us,
            transition_duration_s: duration_s.max(0.0),
            transition_progress: 0.0,
            curve,
        }
    }

    /// Advance the transition to `now_us` and return the blend_weight it
    /// implies. Clears `is_transitioning` once progress reaches 1.0.
    pub fn update(&mut self, now_us: u64) -> f32 {
        if !self.is_transitioning {
            return self.target_weight;
        }
        let elapsed_s = now_us.saturating_sub(self.transition_start_time_us) as f32 / 1_000_000.0;
        let duration = self.transition_duration_s.max(f32::EPSILON);
        let progress = (elapsed_s / duration).clamp(0.0, 1.0);
        self.transition_progress = progress;

        if progress >= 1.0 {
            self.is_transitioning = false;
            self.target_weight
        } else {
            let shaped = self.curve.apply(progress);
            self.prev_weight + (self.target_weight - self.prev_weight) * shaped
        }
    }
}

//! The four blend operators extension layers use to combine with their base
//! counterpart.

use crate::format::BlendMode;

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Combine `base` and `ext` element-wise according to `mode`, scaled by
/// `weight` in `[0.0, 1.0]` (the activation engine's current blend weight
/// for this layer, including any in-progress transition progress).
///
/// - `Replace`: full override at `weight == 1.0`; eases toward `ext` below that.
/// - `Add`: additive offset scaled by weight.
/// - `Multiply`: `base * (1 + weight * ext)`, identity at `weight == 0`.
/// - `Interpolate`: direct linear blend between `base` and `ext`.
pub fn blend_values(base: &[f32], ext: &[f32], mode: BlendMode, weight: f32) -> Vec<f32> {
    let weight = weight.clamp(0.0, 1.0);
    base.iter()
        .zip(ext.iter())
        .map(|(&b, &e)| match mode {
            BlendMode::Replace => lerp(b, e, weight),
            BlendMode::Add => b + weight * e,
            BlendMode::Multiply => b * (1.0 + weight * e),
            BlendMode::Interpolate => lerp(b, e, weight),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_at_full_weight_is_full_override() {
        let base = vec![1.0, 2.0, 3.0];
        let ext = vec![9.0, 9.0, 9.0];
        assert_eq!(blend_values(&base, &ext, BlendMode::Replace, 1.0), ext);
    }

    #[test]
    fn replace_at_zero_weight_keeps_base() {
        let base = vec![1.0, 2.0, 3.0];
        let ext = vec![9.0, 9.0, 9.0];
        assert_eq!(blend_values(&base, &ext, BlendMode::Replace, 0.0), base);
    }

    #[test]
    fn add_scales_offset_by_weight() {
        let base = vec![1.0, 1.0];
        let ext = vec![2.0, 2.0];
        let result = blend_values(&base, &ext, BlendMode::Add, 0.5);
        assert_eq!(result, vec![2.0, 2.0]);
    }

    #[test]
    fn multiply_at_zero_weight_is_identity() {
        let base = vec![3.0, 4.0];
        let ext = vec![0.0, 0.0];
        assert_eq!(blend_values(&base, &ext, BlendMode::Multiply, 0.0), base);
    }

    #[test]
    fn multiply_at_full_weight_applies_one_plus_ext_factor() {
        let base = vec![3.0, 4.0];
        let ext = vec![2.0, 0.5];
        let result = blend_values(&base, &ext, BlendMode::Multiply, 1.0);
        assert_eq!(result, vec![9.0, 6.0]);
    }

    #[test]
    fn interpolate_at_half_weight_averages() {
        let base = vec![0.0, 10.0];
        let ext = vec![10.0, 0.0];
        let result = blend_values(&base, &ext, BlendMode::Interpolate, 0.5);
        assert_eq!(result, vec![5.0, 5.0]);
    }

    #[test]
    fn weight_outside_unit_range_is_clamped() {
        let base = vec![1.0];
        let ext = vec![2.0];
        let over = blend_values(&base, &ext, BlendMode::Interpolate, 5.0);
        assert_eq!(over, vec![2.0]);
        let under = blend_values(&base, &ext, BlendMode::Interpolate, -5.0);
        assert_eq!(under, vec![1.0]);
    }
}

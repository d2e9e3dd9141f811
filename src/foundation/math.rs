/// Round to nearest (ties to even) and saturate into the `u8` range. `NaN` maps to 0.
pub(crate) fn saturate_u8(v: f32) -> u8 {
    v.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Linear ramp from `from` to `to`, with `progress` clamped into `[0, 1]`.
pub(crate) fn lerp_clamped(from: f64, to: f64, progress: f64) -> f64 {
    let p = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    from + (to - from) * p
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;

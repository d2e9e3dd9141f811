use crate::foundation::error::VeilResult;
use crate::foundation::math::saturate_u8;
use crate::frame::Frame;

/// Mid-gray pivot for contrast adjustment.
pub const CONTRAST_PIVOT: f64 = 128.0;

/// Scale every channel around mid-gray: `clamp(v * factor + 128 * (1 - factor))`.
///
/// `factor == 1.0` is the identity. Output is saturated to `[0, 255]`.
pub fn adjust_contrast(frame: &Frame, factor: f64) -> Frame {
    let lut = contrast_lut(factor);
    let data = frame.data().iter().map(|&v| lut[usize::from(v)]).collect();
    frame.with_same_shape(data)
}

/// Per-channel weighted sum `clamp(a * wa + b * wb)` of two shape-compatible frames.
pub fn blend_weighted(a: &Frame, b: &Frame, wa: f64, wb: f64) -> VeilResult<Frame> {
    a.ensure_shape_compatible(b)?;
    let (wa, wb) = (wa as f32, wb as f32);
    let data = a
        .data()
        .iter()
        .zip(b.data())
        .map(|(&x, &y)| saturate_u8(f32::from(x) * wa + f32::from(y) * wb))
        .collect();
    Ok(a.with_same_shape(data))
}

/// The output value of [`adjust_contrast`] for every possible input byte.
pub(crate) fn contrast_lut(factor: f64) -> [u8; 256] {
    let offset = CONTRAST_PIVOT * (1.0 - factor);
    let mut lut = [0u8; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        *out = saturate_u8((v as f64 * factor + offset) as f32);
    }
    lut
}

#[cfg(test)]
#[path = "../../tests/unit/compose/tone.rs"]
mod tests;

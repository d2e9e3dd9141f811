use image::imageops::{self, FilterType};

use crate::foundation::error::VeilResult;
use crate::frame::Frame;

/// Resize `target` to `reference`'s width and height with linear interpolation.
///
/// Frames that already match are returned as-is without copying. `reference` is never touched.
pub fn align(reference: &Frame, target: Frame) -> VeilResult<Frame> {
    if reference.is_shape_compatible(&target) {
        return Ok(target);
    }
    let (w, h) = reference.dims();
    let src = target.into_image()?;
    let resized = imageops::resize(&src, w, h, FilterType::Triangle);
    Frame::from_image(resized)
}

/// A reference frame and a target frame resampled to the reference's shape.
///
/// The only constructor runs [`align`], so the two frames are always shape-compatible.
#[derive(Clone, Debug)]
pub struct AlignedPair {
    reference: Frame,
    target: Frame,
}

impl AlignedPair {
    /// Align `target` to `reference` and pair them.
    pub fn new(reference: Frame, target: Frame) -> VeilResult<Self> {
        let target = align(&reference, target)?;
        Ok(Self { reference, target })
    }

    /// The frame that dictates the pair's shape.
    pub fn reference(&self) -> &Frame {
        &self.reference
    }

    /// The resampled frame.
    pub fn target(&self) -> &Frame {
        &self.target
    }

    /// Split into `(reference, target)`.
    pub fn into_parts(self) -> (Frame, Frame) {
        (self.reference, self.target)
    }
}

//! Per-frame compositing: alignment, tone operations, and the phase timeline.

/// Shape alignment of the hidden clip to the background clip.
pub mod align;
/// Phase dispatch over output time.
pub mod timeline;
/// Saturating contrast and weighted blend.
pub mod tone;

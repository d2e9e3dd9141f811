//! Input clips: the decoder seam, the ffmpeg-backed decoder, and output-timeline sampling.

/// Decoder trait and a procedural implementation.
pub mod clip;
/// `ffprobe`/`ffmpeg` probing and decoding.
pub mod ffmpeg;
/// Looping/clamping sampler over a clip.
pub mod source;

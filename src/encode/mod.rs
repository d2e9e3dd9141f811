//! Encoding sinks.
//!
//! Sinks consume composited frames in timeline order and are driven by
//! [`RenderDriver::render_range`](crate::render::driver::RenderDriver::render_range).

/// `ffmpeg`-based sinks (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;

//! Veilmix composites two video clips into one.
//!
//! Clip A stays visible the whole time. Clip B is contrast-boosted and folded in according to a
//! fixed three-phase timeline:
//!
//! - Load two clips behind [`ClipDecoder`]s and build a [`CompositionTimeline`]
//! - Render single frames with [`CompositionTimeline::render_frame`]
//! - Stream the whole output grid into a [`FrameSink`] with [`RenderDriver`], or go straight
//!   from files to an MP4 with [`render_to_mp4`]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

/// Background audio fitted to the output duration.
pub mod audio;
/// Phase timeline and the pixel operations it is built from.
pub mod compose;
/// Timeline configuration.
pub mod config;
/// Encoding sinks.
pub mod encode;
/// RGB frame buffers.
pub mod frame;
/// Clip decoding and time remapping.
pub mod media;
/// File-to-file entry points.
pub mod pipeline;
/// Output-grid render loops.
pub mod render;

pub use crate::foundation::core::{Fps, FrameIndex, FrameRange};
pub use crate::foundation::error::{VeilError, VeilResult};

pub use crate::audio::{AudioTrack, derive_audio};
pub use crate::compose::align::{AlignedPair, align};
pub use crate::compose::timeline::{CompositionTimeline, Phase, phase_for};
pub use crate::compose::tone::{adjust_contrast, blend_weighted};
pub use crate::config::CompositionConfig;
pub use crate::encode::ffmpeg::{EncodeOpts, FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::frame::Frame;
pub use crate::media::clip::{ClipDecoder, ProceduralClip};
pub use crate::media::ffmpeg::{AudioPcm, FfmpegClip};
pub use crate::media::source::{Coverage, FrameSource};
pub use crate::pipeline::{Mp4Job, default_output_path, render_to_mp4};
pub use crate::render::driver::{
    RenderDriver, RenderOpts, RenderStats, RenderedClip, frame_grid, render_clip,
};

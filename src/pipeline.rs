use crate::audio::load_background_audio;
use crate::compose::timeline::CompositionTimeline;
use crate::config::CompositionConfig;
use crate::encode::ffmpeg::{EncodeOpts, FfmpegSink, FfmpegSinkOpts};
use crate::foundation::error::VeilResult;
use crate::frame::Frame;
use crate::media::ffmpeg::FfmpegClip;
use crate::render::driver::{RenderDriver, RenderOpts, RenderStats};
use std::path::{Path, PathBuf};

/// Suffix appended to the hidden clip's stem when no output path is given.
pub const OUTPUT_SUFFIX: &str = "_RZ_Motion_Fix";

/// Everything needed to turn two video files into one composited MP4.
#[derive(Clone, Debug)]
pub struct Mp4Job {
    /// Clip A: the visible background, also the audio source.
    pub background: PathBuf,
    /// Clip B: the hidden clip.
    pub hidden: PathBuf,
    /// Output MP4 path.
    pub out_path: PathBuf,
    /// Timeline configuration.
    pub config: CompositionConfig,
    /// Render loop options.
    pub render: RenderOpts,
    /// x264 settings.
    pub encode: EncodeOpts,
    /// Mux the background clip's audio into the output.
    pub enable_audio: bool,
}

impl Mp4Job {
    /// A job with default configuration writing next to `hidden`.
    pub fn new(background: impl Into<PathBuf>, hidden: impl Into<PathBuf>) -> Self {
        let hidden = hidden.into();
        Self {
            background: background.into(),
            out_path: default_output_path(&hidden),
            hidden,
            config: CompositionConfig::default(),
            render: RenderOpts::default(),
            encode: EncodeOpts::default(),
            enable_audio: true,
        }
    }
}

/// `<dir of hidden>/<stem of hidden>_RZ_Motion_Fix.mp4`.
pub fn default_output_path(hidden: &Path) -> PathBuf {
    let stem = hidden
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_owned());
    hidden.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.mp4"))
}

/// Open both clips on disk and build a timeline over them.
pub fn open_timeline(
    background: &Path,
    hidden: &Path,
    cfg: CompositionConfig,
) -> VeilResult<CompositionTimeline> {
    let a = FfmpegClip::open(background)?;
    let b = FfmpegClip::open(hidden)?;
    CompositionTimeline::from_clips(Box::new(a), Box::new(b), cfg)
}

/// Composite a single frame at `t` from two clips on disk.
pub fn render_frame_at(
    background: &Path,
    hidden: &Path,
    cfg: CompositionConfig,
    t: f64,
) -> VeilResult<Frame> {
    open_timeline(background, hidden, cfg)?.render_frame(t)
}

/// Render `job` to an MP4.
///
/// The output file only appears once encoding has fully succeeded. Both clips are released
/// before this returns, whatever the outcome.
#[tracing::instrument(skip_all, fields(out = %job.out_path.display()))]
pub fn render_to_mp4(job: &Mp4Job) -> VeilResult<RenderStats> {
    job.config.validate()?;
    let background = FfmpegClip::open(&job.background)?;
    let background_info = background.info().clone();
    let hidden = FfmpegClip::open(&job.hidden)?;
    let timeline = CompositionTimeline::from_clips(
        Box::new(background),
        Box::new(hidden),
        job.config.clone(),
    )?;

    let audio = if job.enable_audio {
        load_background_audio(&background_info, &job.config)?
    } else {
        None
    };
    if job.enable_audio && audio.is_none() {
        tracing::info!("background clip has no audio, writing a silent video");
    }

    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: job.out_path.clone(),
        overwrite: true,
        encode: job.encode.clone(),
    });

    tracing::info!(
        frames = job.config.frame_count(),
        parallel = job.render.parallel,
        "render started"
    );
    RenderDriver::new(job.render.clone()).render_all(&timeline, audio.as_ref(), &mut sink)
}

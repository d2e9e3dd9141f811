use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "veilmix", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single composited frame as a PNG.
    Frame(FrameArgs),
    /// Render the composited MP4 (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct ClipArgs {
    /// Clip A: visible background and audio source.
    #[arg(long)]
    background: PathBuf,

    /// Clip B: hidden clip.
    #[arg(long)]
    hidden: PathBuf,

    /// Timeline configuration JSON (defaults when omitted).
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ClipArgs {
    fn load_config(&self) -> anyhow::Result<veilmix::CompositionConfig> {
        match &self.config {
            Some(path) => Ok(veilmix::CompositionConfig::from_path(path)?),
            None => Ok(veilmix::CompositionConfig::default()),
        }
    }
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    clips: ClipArgs,

    /// Output timestamp in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    clips: ClipArgs,

    /// Output MP4 path (defaults to `<hidden stem>_RZ_Motion_Fix.mp4` next to the hidden clip).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    /// x264 constant rate factor.
    #[arg(long, default_value_t = 23)]
    crf: u8,

    /// x264 preset.
    #[arg(long, default_value = "ultrafast")]
    preset: String,

    /// ffmpeg encoder threads.
    #[arg(long, default_value_t = 6)]
    encoder_threads: usize,

    /// Write a silent video instead of carrying the background audio.
    #[arg(long, default_value_t = false)]
    no_audio: bool,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = args.clips.load_config()?;
    let frame = veilmix::pipeline::render_frame_at(
        &args.clips.background,
        &args.clips.hidden,
        cfg,
        args.time,
    )?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        frame.data(),
        frame.width(),
        frame.height(),
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            cancel.store(true, Ordering::Relaxed);
        })
        .context("install Ctrl-C handler")?;
    }

    let mut job = veilmix::Mp4Job::new(&args.clips.background, &args.clips.hidden);
    if let Some(out) = args.out {
        job.out_path = out;
    }
    job.config = args.clips.load_config()?;
    job.render = veilmix::RenderOpts {
        parallel: args.parallel,
        threads: args.threads,
        chunk_size: args.chunk_size,
        channel_capacity: 4,
        cancel: Some(cancel),
    };
    job.encode = veilmix::EncodeOpts {
        crf: args.crf,
        preset: args.preset,
        threads: Some(args.encoder_threads),
    };
    job.enable_audio = !args.no_audio;

    match veilmix::render_to_mp4(&job) {
        Ok(stats) => {
            eprintln!(
                "wrote {} ({} frames)",
                job.out_path.display(),
                stats.frames_total
            );
            Ok(())
        }
        Err(veilmix::VeilError::Cancelled) => {
            eprintln!("cancelled, no output written");
            std::process::exit(130);
        }
        Err(e) => Err(e.into()),
    }
}

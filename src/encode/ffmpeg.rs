use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{VeilError, VeilResult};
use crate::frame::Frame;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// x264 quality/speed settings handed to `ffmpeg`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EncodeOpts {
    /// Constant rate factor (0..=51, lower is better quality).
    pub crf: u8,
    /// x264 preset name, e.g. `ultrafast`, `fast`, `medium`.
    pub preset: String,
    /// Encoder thread count; `None` lets ffmpeg decide.
    pub threads: Option<usize>,
}

impl Default for EncodeOpts {
    fn default() -> Self {
        Self {
            crf: 23,
            preset: "ultrafast".to_owned(),
            threads: Some(6),
        }
    }
}

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// Encoder settings.
    pub encode: EncodeOpts,
}

impl FfmpegSinkOpts {
    /// Create options for outputting an MP4 to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            encode: EncodeOpts::default(),
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams raw RGB frames to stdin.
///
/// Output is written to a `.partial` sibling and only renamed to the requested path after
/// `ffmpeg` exits successfully. Aborted or dropped renders leave no file at `out_path`.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    partial_path: PathBuf,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        let partial_path = partial_path_for(&opts.out_path);
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            partial_path,
            cfg: None,
            last_idx: None,
        }
    }

    fn discard(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        if self.cfg.take().is_some() {
            let _ = std::fs::remove_file(&self.partial_path);
            tracing::warn!(
                path = %self.opts.out_path.display(),
                "discarded incomplete render"
            );
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> VeilResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(VeilError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(VeilError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(VeilError::validation(format!(
                "output {}x{} must have even width/height (required for yuv420p mp4 output)",
                cfg.width, cfg.height
            )));
        }
        if self.opts.encode.crf > 51 {
            return Err(VeilError::validation("crf must be in 0..=51"));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(VeilError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(VeilError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        if let Some(audio) = cfg.audio.as_ref() {
            if audio.sample_rate == 0 {
                return Err(VeilError::validation(
                    "audio sample_rate must be non-zero when audio is enabled",
                ));
            }
            if audio.channels == 0 {
                return Err(VeilError::validation(
                    "audio channels must be non-zero when audio is enabled",
                ));
            }
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio.path)
            .args(["-c:a", "aac", "-shortest"]);
        } else {
            cmd.arg("-an");
        }

        // Output: h264 + yuv420p for broad compatibility.
        cmd.args([
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-preset",
            &self.opts.encode.preset,
            "-crf",
            &self.opts.encode.crf.to_string(),
        ]);
        if let Some(threads) = self.opts.encode.threads {
            cmd.args(["-threads", &threads.to_string()]);
        }
        cmd.args(["-movflags", "+faststart", "-f", "mp4"]);
        cmd.arg(&self.partial_path);

        let mut child = cmd.spawn().map_err(|e| {
            VeilError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VeilError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| VeilError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            out = %self.opts.out_path.display(),
            width = cfg.width,
            height = cfg.height,
            crf = self.opts.encode.crf,
            preset = %self.opts.encode.preset,
            audio = cfg.audio.is_some(),
            "spawned ffmpeg encoder"
        );

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> VeilResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| VeilError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(VeilError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width() != cfg.width || frame.height() != cfg.height {
            return Err(VeilError::ShapeMismatch {
                left_w: cfg.width,
                left_h: cfg.height,
                right_w: frame.width(),
                right_h: frame.height(),
            });
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(VeilError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(frame.data()).map_err(|e| {
            VeilError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> VeilResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| VeilError::encode("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| VeilError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| VeilError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| VeilError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            self.discard();
            return Err(VeilError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        std::fs::rename(&self.partial_path, &self.opts.out_path).map_err(|e| {
            VeilError::encode(format!(
                "failed to move '{}' into place: {e}",
                self.partial_path.display()
            ))
        })?;
        self.cfg = None;
        Ok(())
    }

    fn abort(&mut self) {
        self.discard();
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.discard();
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, use `-r` before `-i` to specify the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

fn partial_path_for(out_path: &Path) -> PathBuf {
    let mut name = out_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output.mp4".into());
    name.push(".partial");
    out_path.with_file_name(name)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> VeilResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

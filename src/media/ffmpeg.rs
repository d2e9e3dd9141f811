use std::path::{Path, PathBuf};

use crate::foundation::error::{VeilError, VeilResult};
use crate::frame::Frame;
use crate::media::clip::ClipDecoder;

/// Sample rate used for decoded and re-encoded audio.
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;

#[derive(Clone, Debug)]
/// Basic metadata about a source video file.
pub struct VideoSourceInfo {
    /// Source path used for probing/decoding.
    pub source_path: PathBuf,
    /// Display width in pixels, after any container rotation is applied.
    pub width: u32,
    /// Display height in pixels, after any container rotation is applied.
    pub height: u32,
    /// Clockwise display rotation in degrees, one of 0, 90, 180, 270.
    pub rotation_deg: u16,
    /// Frame rate numerator.
    pub fps_num: u32,
    /// Frame rate denominator.
    pub fps_den: u32,
    /// Duration of the video stream in seconds.
    pub duration_sec: f64,
    /// Whether ffprobe detected at least one audio stream.
    pub has_audio: bool,
}

impl VideoSourceInfo {
    /// Native frame rate as a float; 0 when unknown.
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }
}

#[derive(Clone, Debug)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Vec<f32>,
}

/// A video file sampled through the system `ffmpeg` binary.
///
/// Every decode runs a short-lived `ffmpeg` process, so concurrent sampling from render workers
/// needs no shared decoder state.
#[derive(Clone, Debug)]
pub struct FfmpegClip {
    info: VideoSourceInfo,
}

impl FfmpegClip {
    /// Probe `path` and prepare it for sampling.
    pub fn open(path: impl AsRef<Path>) -> VeilResult<Self> {
        let info = probe_video(path.as_ref())?;
        if !(info.duration_sec.is_finite() && info.duration_sec > 0.0) {
            return Err(VeilError::validation(format!(
                "'{}' reports no duration",
                info.source_path.display()
            )));
        }
        tracing::info!(
            path = %info.source_path.display(),
            width = info.width,
            height = info.height,
            fps = info.source_fps(),
            duration_sec = info.duration_sec,
            has_audio = info.has_audio,
            "probed source video"
        );
        Ok(Self { info })
    }

    /// Probed metadata.
    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }
}

impl ClipDecoder for FfmpegClip {
    fn duration_sec(&self) -> f64 {
        self.info.duration_sec
    }

    fn decode_frame(&self, t: f64) -> VeilResult<Frame> {
        let data = decode_video_frame_rgb8(&self.info, t)?;
        Frame::from_rgb8(self.info.width, self.info.height, data)
            .map_err(|e| VeilError::decode(e.to_string()))
    }

    fn describe(&self) -> String {
        self.info
            .source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.info.source_path.display().to_string())
    }
}

/// Probe source video metadata through `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> VeilResult<VideoSourceInfo> {
    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| VeilError::decode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(VeilError::decode(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_ffprobe_json(source_path, &out.stdout)
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    nb_frames: Option<String>,
    #[serde(default)]
    tags: ProbeTags,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

#[derive(Default, serde::Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Turn `ffprobe -print_format json -show_streams -show_format` output into source metadata.
#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
fn parse_ffprobe_json(source_path: &Path, json: &[u8]) -> VeilResult<VideoSourceInfo> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| VeilError::decode(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            VeilError::decode(format!(
                "no video stream found in '{}'",
                source_path.display()
            ))
        })?;
    let coded_width = video_stream
        .width
        .ok_or_else(|| VeilError::decode("missing video width from ffprobe"))?;
    let coded_height = video_stream
        .height
        .ok_or_else(|| VeilError::decode("missing video height from ffprobe"))?;

    // The display matrix wins over the legacy `rotate` tag; ffmpeg autorotates by it on decode.
    let rotation = video_stream
        .side_data_list
        .iter()
        .find_map(|d| d.rotation)
        .or_else(|| {
            video_stream
                .tags
                .rotate
                .as_deref()
                .and_then(|r| r.trim().parse::<f64>().ok())
        })
        .unwrap_or(0.0);
    let rotation_deg = normalized_rotation(rotation);
    let (width, height) = display_dims(coded_width, coded_height, rotation_deg);

    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| VeilError::decode("invalid video r_frame_rate"))?;
    let duration_sec = select_duration(
        parse_positive(video_stream.duration.as_deref()),
        video_stream
            .nb_frames
            .as_deref()
            .and_then(|n| n.parse::<u64>().ok()),
        (fps_num, fps_den),
        parse_positive(
            parsed
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref()),
        ),
    );
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        rotation_deg,
        fps_num,
        fps_den,
        duration_sec,
        has_audio,
    })
}

fn parse_positive(s: Option<&str>) -> Option<f64> {
    s.and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Video stream duration, else frame count over frame rate, else the container duration.
///
/// The container duration covers every stream, so it overshoots the last decodable frame
/// whenever audio outlasts video.
fn select_duration(
    stream_sec: Option<f64>,
    nb_frames: Option<u64>,
    (fps_num, fps_den): (u32, u32),
    format_sec: Option<f64>,
) -> f64 {
    let from_frames = nb_frames
        .filter(|&n| n > 0 && fps_num > 0 && fps_den > 0)
        .map(|n| n as f64 * f64::from(fps_den) / f64::from(fps_num));
    stream_sec.or(from_frames).or(format_sec).unwrap_or(0.0)
}

/// Fold any rotation angle onto 0, 90, 180 or 270 degrees clockwise.
///
/// ffprobe reports the display matrix counter-clockwise (`-90` for a portrait phone clip).
fn normalized_rotation(deg: f64) -> u16 {
    if !deg.is_finite() {
        return 0;
    }
    let quarter_turns = (deg / 90.0).round() as i64;
    (quarter_turns.rem_euclid(4) * 90) as u16
}

/// Frame size after the decoder applies `rotation_deg`.
fn display_dims(width: u32, height: u32, rotation_deg: u16) -> (u32, u32) {
    match rotation_deg {
        90 | 270 => (height, width),
        _ => (width, height),
    }
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Probe source video metadata through `ffprobe`.
///
/// Returns an error when the `media-ffmpeg` feature is disabled.
pub fn probe_video(_source_path: &Path) -> VeilResult<VideoSourceInfo> {
    Err(VeilError::decode(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
/// Decode the RGB8 frame shown at `source_time_sec`.
pub fn decode_video_frame_rgb8(
    source: &VideoSourceInfo,
    source_time_sec: f64,
) -> VeilResult<Vec<u8>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{source_time_sec:.6}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            "1",
            "-an",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "pipe:1",
        ])
        .output()
        .map_err(|e| VeilError::decode(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(VeilError::decode(format!(
            "ffmpeg video decode failed for '{}' at {source_time_sec:.3}s: {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = source.width as usize * source.height as usize * 3;
    if expected_len == 0 {
        return Err(VeilError::decode(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if out.stdout.is_empty() {
        return Err(VeilError::decode(format!(
            "ffmpeg returned no video frame for '{}' at {source_time_sec:.3}s",
            source.source_path.display()
        )));
    }
    if out.stdout.len() != expected_len {
        return Err(VeilError::decode(format!(
            "decoded video frame has invalid size: got {} bytes, expected {expected_len} ({}x{})",
            out.stdout.len(),
            source.width,
            source.height
        )));
    }
    Ok(out.stdout)
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Decode the RGB8 frame shown at `source_time_sec`.
///
/// Returns an error when the `media-ffmpeg` feature is disabled.
pub fn decode_video_frame_rgb8(
    _source: &VideoSourceInfo,
    _source_time_sec: f64,
) -> VeilResult<Vec<u8>> {
    Err(VeilError::decode(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
/// Decode the first audio stream of `path` to interleaved stereo `f32` PCM.
///
/// With `max_duration_sec` set, decoding stops after that many seconds of audio. Callers check
/// [`VideoSourceInfo::has_audio`] first; a file without audio is reported as a decode error.
pub fn decode_audio_f32_stereo(
    path: &Path,
    sample_rate: u32,
    max_duration_sec: Option<f64>,
) -> VeilResult<AudioPcm> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args(audio_decode_args(sample_rate, max_duration_sec))
        .output()
        .map_err(|e| VeilError::decode(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(VeilError::decode(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(VeilError::decode(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let interleaved_f32 = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Decode the first audio stream of `path`.
///
/// Returns an error when the `media-ffmpeg` feature is disabled.
pub fn decode_audio_f32_stereo(
    _path: &Path,
    _sample_rate: u32,
    _max_duration_sec: Option<f64>,
) -> VeilResult<AudioPcm> {
    Err(VeilError::decode(
        "audio sources require the 'media-ffmpeg' feature",
    ))
}

/// Output-side ffmpeg arguments for raw stereo `f32le` PCM on stdout.
#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
fn audio_decode_args(sample_rate: u32, max_duration_sec: Option<f64>) -> Vec<String> {
    let mut args: Vec<String> = ["-vn", "-f", "f32le", "-acodec", "pcm_f32le", "-ac", "2", "-ar"]
        .iter()
        .map(|a| (*a).to_owned())
        .collect();
    args.push(sample_rate.to_string());
    if let Some(max) = max_duration_sec.filter(|d| d.is_finite() && *d > 0.0) {
        args.push("-t".to_owned());
        args.push(format!("{max:.6}"));
    }
    args.push("pipe:1".to_owned());
    args
}

#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next().unwrap_or("1").parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

/// Return `true` when both `ffmpeg` and `ffprobe` can be invoked from `PATH`.
pub fn ffmpeg_tools_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        std::process::Command::new(tool)
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

use std::path::Path;

use crate::config::CompositionConfig;
use crate::foundation::error::{VeilError, VeilResult};
use crate::media::ffmpeg::{AUDIO_SAMPLE_RATE, AudioPcm, VideoSourceInfo, decode_audio_f32_stereo};

/// Interleaved `f32` PCM fitted to the output duration.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioTrack {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved samples.
    pub interleaved_f32: Vec<f32>,
}

impl AudioTrack {
    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    /// Duration in seconds.
    pub fn duration_sec(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }
}

/// Fit `pcm` to `cfg.total_duration_sec`: loop it when it is short, trim it when it is long.
///
/// Returns `None` when the source has no samples.
pub fn derive_audio(pcm: &AudioPcm, cfg: &CompositionConfig) -> VeilResult<Option<AudioTrack>> {
    if pcm.sample_rate == 0 || pcm.channels == 0 {
        return Err(VeilError::validation(
            "audio sample_rate and channels must be non-zero",
        ));
    }
    let channels = usize::from(pcm.channels);
    let src_frames = pcm.interleaved_f32.len() / channels;
    if src_frames == 0 {
        return Ok(None);
    }

    let target_frames = (cfg.total_duration_sec * f64::from(pcm.sample_rate)).round() as usize;
    let src = &pcm.interleaved_f32[..src_frames * channels];
    let target_len = target_frames * channels;
    let interleaved_f32 = if src.len() >= target_len {
        src[..target_len].to_vec()
    } else {
        tracing::debug!(
            src_sec = src_frames as f64 / f64::from(pcm.sample_rate),
            total_sec = cfg.total_duration_sec,
            "looping background audio"
        );
        src.iter().copied().cycle().take(target_len).collect()
    };

    Ok(Some(AudioTrack {
        sample_rate: pcm.sample_rate,
        channels: pcm.channels,
        interleaved_f32,
    }))
}

/// Decode the background clip's audio and fit it to the output duration.
///
/// Returns `None` without decoding when ffprobe found no audio stream. At most
/// `cfg.total_duration_sec` of audio is decoded.
pub fn load_background_audio(
    source: &VideoSourceInfo,
    cfg: &CompositionConfig,
) -> VeilResult<Option<AudioTrack>> {
    if !source.has_audio {
        return Ok(None);
    }
    let pcm = decode_audio_f32_stereo(
        &source.source_path,
        AUDIO_SAMPLE_RATE,
        Some(cfg.total_duration_sec),
    )?;
    derive_audio(&pcm, cfg)
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_f32le_file(track: &AudioTrack, out_path: &Path) -> VeilResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            VeilError::encode(format!(
                "failed to create audio output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(track.interleaved_f32.len() * 4);
    for &sample in &track.interleaved_f32 {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        VeilError::encode(format!(
            "failed to write audio file '{}': {e}",
            out_path.display()
        ))
    })
}

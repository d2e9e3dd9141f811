use crate::config::CompositionConfig;
use crate::foundation::error::{VeilError, VeilResult};
use crate::frame::Frame;
use crate::media::clip::ClipDecoder;

/// How a clip's native timeline is stretched over the output duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coverage {
    /// The clip is shorter than the output and repeats from its start.
    Loop,
    /// The clip is at least as long as the output; only its head is used.
    Trim,
}

/// Samples one input clip on the output timeline.
///
/// Owns its decoder; the decoder is released when the source is dropped, on both success and
/// error paths of a render.
pub struct FrameSource {
    clip: Box<dyn ClipDecoder>,
    label: String,
    native_sec: f64,
    coverage: Coverage,
    edge_guard_sec: f64,
    retry_backoff_sec: f64,
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSource")
            .field("label", &self.label)
            .field("native_sec", &self.native_sec)
            .field("coverage", &self.coverage)
            .finish_non_exhaustive()
    }
}

impl FrameSource {
    /// Wrap `clip` so it covers `cfg.total_duration_sec`.
    pub fn new(clip: Box<dyn ClipDecoder>, cfg: &CompositionConfig) -> VeilResult<Self> {
        let native_sec = clip.duration_sec();
        let label = clip.describe();
        if !(native_sec.is_finite() && native_sec > 0.0) {
            return Err(VeilError::validation(format!(
                "clip '{label}' has no usable duration ({native_sec})"
            )));
        }
        let coverage = if native_sec < cfg.total_duration_sec {
            Coverage::Loop
        } else {
            Coverage::Trim
        };
        tracing::debug!(clip = %label, native_sec, ?coverage, "opened frame source");
        Ok(Self {
            clip,
            label,
            native_sec,
            coverage,
            edge_guard_sec: cfg.edge_guard_sec,
            retry_backoff_sec: cfg.retry_backoff_sec,
        })
    }

    /// Native duration of the wrapped clip, in seconds.
    pub fn native_duration_sec(&self) -> f64 {
        self.native_sec
    }

    /// Whether the clip loops or is trimmed.
    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    /// Human-readable clip name.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Map an output timestamp to the clip-local timestamp that will be decoded.
    ///
    /// Looping clips wrap with `t mod native`; the result is then pulled back to at most
    /// `native - edge_guard` and floored at zero.
    pub fn source_time_sec(&self, t: f64) -> VeilResult<f64> {
        if !t.is_finite() || t < 0.0 {
            return Err(VeilError::validation(format!(
                "sample timestamp must be finite and >= 0, got {t}"
            )));
        }
        let local = match self.coverage {
            Coverage::Loop => t.rem_euclid(self.native_sec),
            Coverage::Trim => t,
        };
        Ok(local.min(self.native_sec - self.edge_guard_sec).max(0.0))
    }

    /// Sample the clip at output timestamp `t`.
    ///
    /// A failed decode is retried exactly once, `retry_backoff_sec` earlier. A second failure is
    /// returned as [`VeilError::Decode`].
    pub fn sample(&self, t: f64) -> VeilResult<Frame> {
        let t0 = self.source_time_sec(t)?;
        let first = match self.clip.decode_frame(t0) {
            Ok(frame) => return Ok(frame),
            Err(e) => e,
        };

        let t1 = (t0 - self.retry_backoff_sec).max(0.0);
        tracing::debug!(
            clip = %self.label,
            t,
            t0,
            t1,
            error = %first,
            "decode failed, retrying once"
        );
        self.clip.decode_frame(t1).map_err(|second| {
            VeilError::decode(format!(
                "'{}' has no frame at {t0:.3}s ({first}); retry at {t1:.3}s failed ({second})",
                self.label
            ))
        })
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        tracing::trace!(clip = %self.label, "released frame source");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/source.rs"]
mod tests;

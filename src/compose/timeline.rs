use crate::compose::align::AlignedPair;
use crate::compose::tone::{adjust_contrast, blend_weighted};
use crate::config::CompositionConfig;
use crate::foundation::error::{VeilError, VeilResult};
use crate::foundation::math::lerp_clamped;
use crate::frame::Frame;
use crate::media::clip::ClipDecoder;
use crate::media::source::FrameSource;

/// Largest distance from an integer at which `t * fps` is treated as landing on that frame.
///
/// Grid timestamps come from a single division and are off by at most a few ulps.
const GRID_EPSILON: f64 = 1e-9;

/// Behavioral mode of the timeline at a given output time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// `t < cover_guard_end`: the background frame, untouched.
    CoverGuard,
    /// `cover_guard_end <= t < guide_end`: background on even frames, dimmed hidden clip on odd.
    Guide,
    /// `t >= guide_end`: equal-weight fusion with a contrast ramp on the hidden clip.
    FullFusion,
}

/// Resolve the phase active at `t`. Boundaries belong to the later phase.
pub fn phase_for(t: f64, cfg: &CompositionConfig) -> Phase {
    if t < cfg.cover_guard_end_sec {
        Phase::CoverGuard
    } else if t < cfg.guide_end_sec {
        Phase::Guide
    } else {
        Phase::FullFusion
    }
}

/// Output frame number containing `t`, `floor(t * fps)`.
///
/// Values within `GRID_EPSILON` of a frame boundary snap onto it, so grid timestamps map back
/// to their own index; off-grid times keep plain `floor` semantics.
pub fn output_frame_index(t: f64, cfg: &CompositionConfig) -> u64 {
    let x = t * cfg.fps.as_f64();
    let nearest = x.round();
    let idx = if (x - nearest).abs() <= GRID_EPSILON {
        nearest
    } else {
        x.floor()
    };
    idx.max(0.0) as u64
}

/// Whether a guide-phase frame at `t` shows the hidden clip (odd output frames).
pub fn guide_shows_hidden(t: f64, cfg: &CompositionConfig) -> bool {
    output_frame_index(t, cfg) % 2 == 1
}

/// Hidden-clip contrast during full fusion, ramping linearly from start to end contrast.
///
/// Progress is clamped so timestamps slightly past the end keep the end contrast.
pub fn fusion_contrast(t: f64, cfg: &CompositionConfig) -> f64 {
    let span = cfg.total_duration_sec - cfg.guide_end_sec;
    let progress = (t - cfg.guide_end_sec) / span;
    lerp_clamped(cfg.fusion_contrast_start, cfg.fusion_contrast_end, progress)
}

/// Stateless mapping from output time to composited frame.
///
/// Holds the two sources and the configuration; `render_frame` has no side effects and may be
/// called concurrently and in any order.
#[derive(Debug)]
pub struct CompositionTimeline {
    cfg: CompositionConfig,
    background: FrameSource,
    hidden: FrameSource,
}

impl CompositionTimeline {
    /// Build a timeline over two prepared sources.
    pub fn new(
        background: FrameSource,
        hidden: FrameSource,
        cfg: CompositionConfig,
    ) -> VeilResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            background,
            hidden,
        })
    }

    /// Wrap two decoders in sources covering `cfg.total_duration_sec` and build a timeline.
    pub fn from_clips(
        background: Box<dyn ClipDecoder>,
        hidden: Box<dyn ClipDecoder>,
        cfg: CompositionConfig,
    ) -> VeilResult<Self> {
        cfg.validate()?;
        let background = FrameSource::new(background, &cfg)?;
        let hidden = FrameSource::new(hidden, &cfg)?;
        Self::new(background, hidden, cfg)
    }

    /// The configuration this timeline renders with.
    pub fn config(&self) -> &CompositionConfig {
        &self.cfg
    }

    /// Source A.
    pub fn background(&self) -> &FrameSource {
        &self.background
    }

    /// Source B.
    pub fn hidden(&self) -> &FrameSource {
        &self.hidden
    }

    /// Phase active at `t`.
    pub fn phase_at(&self, t: f64) -> Phase {
        phase_for(t, &self.cfg)
    }

    /// Composite the output frame at `t`.
    ///
    /// The result always has the background frame's dimensions; the hidden frame is resampled
    /// to match whenever it takes part.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn render_frame(&self, t: f64) -> VeilResult<Frame> {
        if !t.is_finite() || t < 0.0 {
            return Err(VeilError::validation(format!(
                "render timestamp must be finite and >= 0, got {t}"
            )));
        }

        let frame_a = self.background.sample(t)?;
        match self.phase_at(t) {
            Phase::CoverGuard => Ok(frame_a),
            Phase::Guide => {
                if !guide_shows_hidden(t, &self.cfg) {
                    return Ok(frame_a);
                }
                let pair = self.sample_aligned(frame_a, t)?;
                let boosted = adjust_contrast(pair.target(), self.cfg.guide_contrast);
                blend_weighted(
                    &boosted,
                    &boosted.black_like(),
                    self.cfg.guide_weight,
                    self.cfg.guide_black_weight,
                )
            }
            Phase::FullFusion => {
                let pair = self.sample_aligned(frame_a, t)?;
                let boosted = adjust_contrast(pair.target(), fusion_contrast(t, &self.cfg));
                blend_weighted(
                    pair.reference(),
                    &boosted,
                    self.cfg.fusion_weight_a,
                    self.cfg.fusion_weight_b,
                )
            }
        }
    }

    fn sample_aligned(&self, frame_a: Frame, t: f64) -> VeilResult<AlignedPair> {
        let frame_b = self.hidden.sample(t)?;
        AlignedPair::new(frame_a, frame_b)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/timeline.rs"]
mod tests;

use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{VeilError, VeilResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Immutable parameters of a composite render.
///
/// Defaults reproduce the stock 15 second, 30 fps look. The whole structure can be loaded from
/// JSON; missing fields take their default value and unknown fields are rejected.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositionConfig {
    /// Output duration in seconds.
    pub total_duration_sec: f64,
    /// Output frame rate.
    pub fps: Fps,
    /// End of the cover-guard phase (exclusive), in seconds.
    pub cover_guard_end_sec: f64,
    /// End of the guide phase (exclusive), in seconds.
    pub guide_end_sec: f64,
    /// Contrast applied to the hidden clip on odd guide frames.
    pub guide_contrast: f64,
    /// Weight of the contrast-boosted hidden clip on odd guide frames.
    pub guide_weight: f64,
    /// Weight of the black backdrop on odd guide frames.
    pub guide_black_weight: f64,
    /// Hidden-clip contrast at the start of full fusion.
    pub fusion_contrast_start: f64,
    /// Hidden-clip contrast at the end of the output.
    pub fusion_contrast_end: f64,
    /// Weight of the background clip during full fusion.
    pub fusion_weight_a: f64,
    /// Weight of the hidden clip during full fusion.
    pub fusion_weight_b: f64,
    /// Sample queries closer than this to a clip's end are pulled back by it.
    pub edge_guard_sec: f64,
    /// Step back applied to the single decode retry.
    pub retry_backoff_sec: f64,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            total_duration_sec: 15.0,
            fps: Fps::default(),
            cover_guard_end_sec: 0.2,
            guide_end_sec: 4.0,
            guide_contrast: 1.5,
            guide_weight: 0.4,
            guide_black_weight: 0.0,
            fusion_contrast_start: 2.0,
            fusion_contrast_end: 2.5,
            fusion_weight_a: 0.5,
            fusion_weight_b: 0.5,
            edge_guard_sec: 0.05,
            retry_backoff_sec: 0.1,
        }
    }
}

impl CompositionConfig {
    /// Parse a configuration from a JSON reader and validate it.
    pub fn from_reader<R: std::io::Read>(r: R) -> VeilResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| VeilError::validation(format!("parse composition config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a configuration from a JSON file on disk and validate it.
    pub fn from_path(path: impl AsRef<Path>) -> VeilResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            VeilError::validation(format!("open composition config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check that phase boundaries are ordered and all parameters are finite.
    pub fn validate(&self) -> VeilResult<()> {
        let named = [
            ("total_duration_sec", self.total_duration_sec),
            ("cover_guard_end_sec", self.cover_guard_end_sec),
            ("guide_end_sec", self.guide_end_sec),
            ("guide_contrast", self.guide_contrast),
            ("guide_weight", self.guide_weight),
            ("guide_black_weight", self.guide_black_weight),
            ("fusion_contrast_start", self.fusion_contrast_start),
            ("fusion_contrast_end", self.fusion_contrast_end),
            ("fusion_weight_a", self.fusion_weight_a),
            ("fusion_weight_b", self.fusion_weight_b),
            ("edge_guard_sec", self.edge_guard_sec),
            ("retry_backoff_sec", self.retry_backoff_sec),
        ];
        for (name, v) in named {
            if !v.is_finite() {
                return Err(VeilError::validation(format!("{name} must be finite")));
            }
        }

        Fps::new(self.fps.num, self.fps.den)?;
        if self.total_duration_sec <= 0.0 {
            return Err(VeilError::validation("total_duration_sec must be > 0"));
        }
        if self.cover_guard_end_sec < 0.0 {
            return Err(VeilError::validation("cover_guard_end_sec must be >= 0"));
        }
        if self.guide_end_sec < self.cover_guard_end_sec {
            return Err(VeilError::validation(
                "guide_end_sec must be >= cover_guard_end_sec",
            ));
        }
        if self.guide_end_sec >= self.total_duration_sec {
            return Err(VeilError::validation(
                "guide_end_sec must be < total_duration_sec",
            ));
        }
        if self.edge_guard_sec < 0.0 || self.retry_backoff_sec < 0.0 {
            return Err(VeilError::validation(
                "edge_guard_sec and retry_backoff_sec must be >= 0",
            ));
        }
        if self.frame_count() == 0 {
            return Err(VeilError::validation(
                "total_duration_sec is shorter than one output frame",
            ));
        }
        Ok(())
    }

    /// Number of frames on the output grid, `floor(total_duration * fps)`.
    pub fn frame_count(&self) -> u64 {
        self.fps.secs_to_frames_floor(self.total_duration_sec)
    }

    /// The full output grid as a frame range.
    pub fn frame_range(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(self.frame_count()),
        }
    }

    /// Timestamp of grid frame `idx`, in seconds.
    pub fn frame_time_secs(&self, idx: FrameIndex) -> f64 {
        self.fps.frame_time_secs(idx)
    }
}

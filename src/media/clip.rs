use std::sync::Arc;

use crate::foundation::error::{VeilError, VeilResult};
use crate::frame::Frame;

/// A decoded source video that can be sampled at arbitrary timestamps.
///
/// Implementations must tolerate concurrent `decode_frame` calls from render workers.
pub trait ClipDecoder: Send + Sync {
    /// Native duration in seconds.
    fn duration_sec(&self) -> f64;

    /// Decode the frame shown at `t` seconds into the clip.
    ///
    /// Timestamps at or past the end of the clip may fail; callers clamp and retry.
    fn decode_frame(&self, t: f64) -> VeilResult<Frame>;

    /// Short human-readable name used in logs and errors.
    fn describe(&self) -> String {
        "clip".to_owned()
    }
}

type PixelFn = dyn Fn(u64, u32, u32) -> [u8; 3] + Send + Sync;

/// A clip whose pixels are computed from `(source_frame, x, y)`.
///
/// Useful for previews and tests where no media file is available. Decoding past the end of the
/// clip fails the same way a real decoder does.
#[derive(Clone)]
pub struct ProceduralClip {
    width: u32,
    height: u32,
    duration_sec: f64,
    fps: f64,
    pixel: Arc<PixelFn>,
}

impl std::fmt::Debug for ProceduralClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProceduralClip")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("duration_sec", &self.duration_sec)
            .field("fps", &self.fps)
            .finish_non_exhaustive()
    }
}

impl ProceduralClip {
    /// Create a clip from a pixel function.
    pub fn new(
        width: u32,
        height: u32,
        duration_sec: f64,
        fps: f64,
        pixel: impl Fn(u64, u32, u32) -> [u8; 3] + Send + Sync + 'static,
    ) -> VeilResult<Self> {
        if width == 0 || height == 0 {
            return Err(VeilError::validation("clip width/height must be non-zero"));
        }
        if !(duration_sec.is_finite() && duration_sec > 0.0) {
            return Err(VeilError::validation("clip duration must be > 0"));
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(VeilError::validation("clip fps must be > 0"));
        }
        Ok(Self {
            width,
            height,
            duration_sec,
            fps,
            pixel: Arc::new(pixel),
        })
    }

    /// A flat single-color clip.
    pub fn solid(
        width: u32,
        height: u32,
        duration_sec: f64,
        fps: f64,
        rgb: [u8; 3],
    ) -> VeilResult<Self> {
        Self::new(width, height, duration_sec, fps, move |_, _, _| rgb)
    }

    /// A clip that encodes its source frame number in the red/green channels and a diagonal ramp
    /// in blue, so every source frame is distinguishable.
    pub fn frame_coded(width: u32, height: u32, duration_sec: f64, fps: f64) -> VeilResult<Self> {
        Self::new(width, height, duration_sec, fps, |idx, x, y| {
            [
                (idx % 256) as u8,
                ((idx / 256) % 256) as u8,
                ((x + y) % 256) as u8,
            ]
        })
    }

    /// Source frame number shown at `t`.
    pub fn source_frame_at(&self, t: f64) -> u64 {
        (t * self.fps).floor().max(0.0) as u64
    }
}

impl ClipDecoder for ProceduralClip {
    fn duration_sec(&self) -> f64 {
        self.duration_sec
    }

    fn decode_frame(&self, t: f64) -> VeilResult<Frame> {
        if !t.is_finite() || t < 0.0 || t >= self.duration_sec {
            return Err(VeilError::decode(format!(
                "timestamp {t:.3}s outside procedural clip of {:.3}s",
                self.duration_sec
            )));
        }
        let idx = self.source_frame_at(t);
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                data.extend_from_slice(&(self.pixel)(idx, x, y));
            }
        }
        Frame::from_rgb8(self.width, self.height, data)
    }

    fn describe(&self) -> String {
        format!(
            "procedural {}x{} {:.2}s",
            self.width, self.height, self.duration_sec
        )
    }
}

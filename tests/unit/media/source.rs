use super::*;
use crate::media::clip::ProceduralClip;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

/// Fails the first `failures` decode calls and records every requested timestamp.
struct FlakyClip {
    inner: ProceduralClip,
    failures: Mutex<usize>,
    requested: Arc<Mutex<Vec<f64>>>,
}

impl ClipDecoder for FlakyClip {
    fn duration_sec(&self) -> f64 {
        self.inner.duration_sec()
    }

    fn decode_frame(&self, t: f64) -> VeilResult<Frame> {
        self.requested.lock().unwrap().push(t);
        let mut left = self.failures.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(VeilError::decode("edge frame unavailable"));
        }
        self.inner.decode_frame(t)
    }
}

fn flaky(failures: usize) -> (FrameSource, Arc<Mutex<Vec<f64>>>) {
    let requested = Arc::new(Mutex::new(Vec::new()));
    let clip = FlakyClip {
        inner: ProceduralClip::frame_coded(4, 4, 5.0, 30.0).unwrap(),
        failures: Mutex::new(failures),
        requested: requested.clone(),
    };
    let src = FrameSource::new(Box::new(clip), &CompositionConfig::default()).unwrap();
    (src, requested)
}

fn coded(duration: f64) -> FrameSource {
    let clip = ProceduralClip::frame_coded(8, 6, duration, 30.0).unwrap();
    FrameSource::new(Box::new(clip), &CompositionConfig::default()).unwrap()
}

#[test]
fn short_clips_loop_and_long_clips_trim() {
    assert_eq!(coded(5.0).coverage(), Coverage::Loop);
    assert_eq!(coded(15.0).coverage(), Coverage::Trim);
    assert_eq!(coded(40.0).coverage(), Coverage::Trim);
}

#[test]
fn looping_wraps_time_modulo_native_duration() {
    let src = coded(5.0);
    assert_eq!(src.source_time_sec(12.0).unwrap(), 2.0);
    assert_eq!(src.sample(12.0).unwrap(), src.sample(2.0).unwrap());
    assert_eq!(src.sample(7.5).unwrap(), src.sample(2.5).unwrap());
}

#[test]
fn trimmed_clips_use_time_as_is() {
    let src = coded(40.0);
    assert_eq!(src.source_time_sec(12.0).unwrap(), 12.0);
    assert_ne!(src.sample(12.0).unwrap(), src.sample(2.0).unwrap());
}

#[test]
fn timestamps_near_the_end_are_pulled_back() {
    let src = coded(5.0);
    let t = src.source_time_sec(4.99).unwrap();
    assert!((t - 4.95).abs() < 1e-12);

    let src = coded(15.0);
    let t = src.source_time_sec(14.999).unwrap();
    assert!((t - 14.95).abs() < 1e-12);
}

#[test]
fn clips_shorter_than_the_guard_clamp_to_zero() {
    let src = coded(0.03);
    assert_eq!(src.source_time_sec(0.02).unwrap(), 0.0);
    assert!(src.sample(0.02).is_ok());
}

#[test]
fn invalid_timestamps_are_rejected() {
    let src = coded(5.0);
    assert!(src.source_time_sec(-0.5).is_err());
    assert!(src.source_time_sec(f64::NAN).is_err());
}

#[test]
fn one_failure_is_retried_earlier() {
    let (src, requested) = flaky(1);
    let frame = src.sample(3.0).unwrap();
    assert_eq!(frame.dims(), (4, 4));
    let requested = requested.lock().unwrap();
    assert_eq!(requested.len(), 2);
    assert_eq!(requested[0], 3.0);
    assert!((requested[1] - 2.9).abs() < 1e-12);
}

#[test]
fn retry_is_floored_at_zero() {
    let (src, requested) = flaky(1);
    src.sample(0.05).unwrap();
    assert_eq!(requested.lock().unwrap()[1], 0.0);
}

#[test]
fn two_failures_surface_a_decode_error() {
    let (src, requested) = flaky(2);
    let err = src.sample(1.0).unwrap_err();
    assert!(err.is_decode());
    assert_eq!(requested.lock().unwrap().len(), 2);
}

#[test]
fn zero_length_clips_are_rejected() {
    struct Empty;
    impl ClipDecoder for Empty {
        fn duration_sec(&self) -> f64 {
            0.0
        }
        fn decode_frame(&self, _t: f64) -> VeilResult<Frame> {
            Err(VeilError::decode("empty"))
        }
    }
    assert!(FrameSource::new(Box::new(Empty), &CompositionConfig::default()).is_err());
}

proptest! {
    #[test]
    fn looped_time_only_depends_on_phase_within_the_clip(t in 0.0f64..15.0, native in 0.5f64..14.0) {
        let clip = ProceduralClip::solid(2, 2, native, 30.0, [0, 0, 0]).unwrap();
        let src = FrameSource::new(Box::new(clip), &CompositionConfig::default()).unwrap();
        let wrapped = t % native;
        prop_assert_eq!(src.source_time_sec(t).unwrap(), src.source_time_sec(wrapped).unwrap());
        let local = src.source_time_sec(t).unwrap();
        prop_assert!(local >= 0.0 && local < native);
    }
}

/// A file whose video stream stops at `video_end` while the clip reports `reported` seconds.
struct VideoEndsEarly {
    inner: ProceduralClip,
    reported: f64,
    video_end: f64,
}

impl ClipDecoder for VideoEndsEarly {
    fn duration_sec(&self) -> f64 {
        self.reported
    }

    fn decode_frame(&self, t: f64) -> VeilResult<Frame> {
        if t >= self.video_end {
            return Err(VeilError::decode(format!("no video frame at {t}s")));
        }
        self.inner.decode_frame(t)
    }
}

fn ends_early(reported: f64) -> FrameSource {
    let clip = VideoEndsEarly {
        inner: ProceduralClip::frame_coded(4, 4, 10.0, 30.0).unwrap(),
        reported,
        video_end: 8.0,
    };
    FrameSource::new(Box::new(clip), &CompositionConfig::default()).unwrap()
}

#[test]
fn video_stream_duration_keeps_every_grid_time_decodable() {
    let src = ends_early(8.0);
    assert_eq!(src.coverage(), Coverage::Loop);
    for k in 0..450u32 {
        let t = f64::from(k) / 30.0;
        assert!(src.sample(t).is_ok(), "t = {t}");
    }
}

#[test]
fn container_duration_past_the_video_end_fails_near_the_loop_point() {
    let src = ends_early(10.0);
    assert!(matches!(src.sample(9.5), Err(VeilError::Decode(_))));
}

use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert_eq!(Fps::new(30, 1).unwrap(), Fps::default());
}

#[test]
fn grid_times_hit_phase_boundaries_exactly() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.frame_time_secs(FrameIndex(0)), 0.0);
    assert_eq!(fps.frame_time_secs(FrameIndex(6)), 0.2);
    assert_eq!(fps.frame_time_secs(FrameIndex(120)), 4.0);
}

#[test]
fn secs_to_frames_uses_floor() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_floor(15.0), 450);
    assert_eq!(fps.secs_to_frames_floor(0.05), 1);
    assert_eq!(fps.secs_to_frames_floor(-1.0), 0);
}

#[test]
fn frame_range_basics() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
    assert_eq!(r.len_frames(), 3);
    assert!(!r.is_empty());
    assert!(r.contains(FrameIndex(2)));
    assert!(!r.contains(FrameIndex(5)));
    assert!(FrameRange::new(FrameIndex(5), FrameIndex(2)).is_err());
}

use super::*;
use crate::foundation::core::FrameIndex;
use crate::media::clip::ProceduralClip;

fn cfg() -> CompositionConfig {
    CompositionConfig::default()
}

fn timeline(a: ProceduralClip, b: ProceduralClip) -> CompositionTimeline {
    CompositionTimeline::from_clips(Box::new(a), Box::new(b), cfg()).unwrap()
}

#[test]
fn phase_boundaries_belong_to_the_later_phase() {
    let cfg = cfg();
    assert_eq!(phase_for(0.0, &cfg), Phase::CoverGuard);
    assert_eq!(phase_for(0.199_999, &cfg), Phase::CoverGuard);
    assert_eq!(phase_for(0.2, &cfg), Phase::Guide);
    assert_eq!(phase_for(3.999_999, &cfg), Phase::Guide);
    assert_eq!(phase_for(4.0, &cfg), Phase::FullFusion);
    assert_eq!(phase_for(14.99, &cfg), Phase::FullFusion);
}

#[test]
fn grid_transitions_at_frames_6_and_120() {
    let cfg = cfg();
    let at = |k: u64| phase_for(cfg.frame_time_secs(FrameIndex(k)), &cfg);
    assert_eq!(at(5), Phase::CoverGuard);
    assert_eq!(at(6), Phase::Guide);
    assert_eq!(at(119), Phase::Guide);
    assert_eq!(at(120), Phase::FullFusion);
    assert_eq!(at(449), Phase::FullFusion);
}

#[test]
fn guide_parity_follows_the_output_grid() {
    let cfg = cfg();
    for k in 6..120u64 {
        let t = cfg.frame_time_secs(FrameIndex(k));
        assert_eq!(output_frame_index(t, &cfg), k);
        assert_eq!(guide_shows_hidden(t, &cfg), k % 2 == 1, "frame {k}");
    }
}

#[test]
fn off_grid_times_use_plain_floor() {
    let cfg = cfg();
    let just_before_8 = 8.0 / 30.0 - 2e-8;
    assert_eq!(output_frame_index(just_before_8, &cfg), 7);
    assert!(guide_shows_hidden(just_before_8, &cfg));
    assert_eq!(output_frame_index(8.0 / 30.0, &cfg), 8);
    assert_eq!(output_frame_index(0.25, &cfg), 7);
    assert_eq!(output_frame_index(0.0, &cfg), 0);
}

#[test]
fn fusion_contrast_ramps_from_2_to_2_5() {
    let cfg = cfg();
    assert_eq!(fusion_contrast(4.0, &cfg), 2.0);
    assert_eq!(fusion_contrast(15.0, &cfg), 2.5);
    assert_eq!(fusion_contrast(15.2, &cfg), 2.5);
    assert!((fusion_contrast(9.5, &cfg) - 2.25).abs() < 1e-12);
    assert!(fusion_contrast(15.0 - 1e-9, &cfg) > 2.5 - 1e-9);

    let mut prev = 0.0;
    for k in 120..450u64 {
        let c = fusion_contrast(cfg.frame_time_secs(FrameIndex(k)), &cfg);
        assert!(c >= prev);
        prev = c;
    }
}

#[test]
fn cover_guard_returns_raw_background() {
    let a = ProceduralClip::frame_coded(16, 8, 10.0, 30.0).unwrap();
    let b = ProceduralClip::solid(12, 6, 3.0, 24.0, [255, 255, 255]).unwrap();
    let tl = timeline(a.clone(), b);
    for t in [0.0, 0.05, 0.1, 0.19] {
        assert_eq!(tl.render_frame(t).unwrap(), a.decode_frame(t).unwrap());
    }
}

#[test]
fn guide_alternates_background_and_dimmed_hidden() {
    let a = ProceduralClip::solid(16, 8, 10.0, 30.0, [10, 200, 30]).unwrap();
    let b = ProceduralClip::solid(12, 6, 3.0, 24.0, [255, 255, 255]).unwrap();
    let tl = timeline(a, b);
    let cfg = cfg();

    let even = tl.render_frame(cfg.frame_time_secs(FrameIndex(8))).unwrap();
    assert!(even.data().chunks_exact(3).all(|p| p == [10, 200, 30]));

    let odd = tl.render_frame(cfg.frame_time_secs(FrameIndex(9))).unwrap();
    assert_eq!(odd.dims(), (16, 8));
    // White boosted to 255, scaled by 0.4, nothing from black.
    assert!(odd.data().iter().all(|&v| v == 102));
}

#[test]
fn full_fusion_blends_background_with_boosted_hidden() {
    let a = ProceduralClip::solid(8, 8, 20.0, 30.0, [100, 100, 100]).unwrap();
    let b = ProceduralClip::solid(8, 8, 20.0, 30.0, [140, 128, 0]).unwrap();
    let tl = timeline(a, b);

    // contrast 2.0: 140 -> 152, 128 -> 128, 0 -> 0
    let f = tl.render_frame(4.0).unwrap();
    assert_eq!(f.pixel(0, 0), Some([126, 114, 50]));
}

#[test]
fn output_always_has_background_dimensions() {
    let a = ProceduralClip::frame_coded(32, 18, 10.0, 30.0).unwrap();
    let b = ProceduralClip::frame_coded(21, 12, 3.0, 25.0).unwrap();
    let tl = timeline(a, b);
    for t in [0.0, 0.2, 0.3, 0.2333, 3.9, 4.0, 8.7, 14.99] {
        assert_eq!(tl.render_frame(t).unwrap().dims(), (32, 18), "t={t}");
    }
}

#[test]
fn render_is_deterministic() {
    let a = ProceduralClip::frame_coded(16, 9, 10.0, 30.0).unwrap();
    let b = ProceduralClip::frame_coded(11, 7, 3.0, 24.0).unwrap();
    let tl = timeline(a, b);
    for t in [0.1, 0.7, 5.3, 12.0] {
        assert_eq!(tl.render_frame(t).unwrap(), tl.render_frame(t).unwrap());
    }
}

#[test]
fn invalid_timestamps_are_rejected() {
    let a = ProceduralClip::solid(4, 4, 1.0, 30.0, [0, 0, 0]).unwrap();
    let b = ProceduralClip::solid(4, 4, 1.0, 30.0, [0, 0, 0]).unwrap();
    let tl = timeline(a, b);
    assert!(tl.render_frame(-1.0).is_err());
    assert!(tl.render_frame(f64::NAN).is_err());
}

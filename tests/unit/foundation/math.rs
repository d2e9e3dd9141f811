use super::*;

#[test]
fn saturate_clamps_and_rounds() {
    assert_eq!(saturate_u8(-12.0), 0);
    assert_eq!(saturate_u8(300.0), 255);
    assert_eq!(saturate_u8(101.6), 102);
    assert_eq!(saturate_u8(f32::NAN), 0);
    assert_eq!(saturate_u8(f32::INFINITY), 255);
}

#[test]
fn saturate_rounds_ties_to_even() {
    assert_eq!(saturate_u8(132.5), 132);
    assert_eq!(saturate_u8(129.5), 130);
    assert_eq!(saturate_u8(127.5), 128);
    assert_eq!(saturate_u8(0.5), 0);
    assert_eq!(saturate_u8(254.5), 254);
}

#[test]
fn lerp_clamps_progress() {
    assert_eq!(lerp_clamped(2.0, 2.5, 0.0), 2.0);
    assert_eq!(lerp_clamped(2.0, 2.5, 1.0), 2.5);
    assert_eq!(lerp_clamped(2.0, 2.5, 1.0001), 2.5);
    assert_eq!(lerp_clamped(2.0, 2.5, -3.0), 2.0);
    assert_eq!(lerp_clamped(2.0, 2.5, f64::NAN), 2.0);
}

use super::*;
use crate::foundation::error::VeilError;
use proptest::prelude::*;

fn gradient(width: u32, height: u32) -> Frame {
    let data = (0..(width * height * 3)).map(|i| (i % 256) as u8).collect();
    Frame::from_rgb8(width, height, data).unwrap()
}

#[test]
fn contrast_one_is_identity() {
    let f = gradient(16, 16);
    assert_eq!(adjust_contrast(&f, 1.0), f);
}

#[test]
fn contrast_pivots_around_mid_gray() {
    let f = Frame::solid(2, 2, [128, 0, 255]).unwrap();
    let out = adjust_contrast(&f, 2.0);
    // 128 stays, 0 -> -128 -> 0, 255 -> 382 -> 255.
    assert_eq!(out.pixel(0, 0), Some([128, 0, 255]));

    let f = Frame::solid(1, 1, [100, 150, 140]).unwrap();
    let out = adjust_contrast(&f, 1.5);
    // 100*1.5-64 = 86, 150*1.5-64 = 161, 140*1.5-64 = 146
    assert_eq!(out.pixel(0, 0), Some([86, 161, 146]));
}

#[test]
fn contrast_half_values_round_to_even() {
    // 131*1.5-64 = 132.5, 129*1.5-64 = 129.5, 133*1.5-64 = 135.5
    let f = Frame::solid(1, 1, [131, 129, 133]).unwrap();
    let out = adjust_contrast(&f, 1.5);
    assert_eq!(out.pixel(0, 0), Some([132, 130, 136]));
}

#[test]
fn contrast_below_one_flattens() {
    let f = Frame::solid(1, 1, [0, 255, 128]).unwrap();
    let out = adjust_contrast(&f, 0.0);
    assert_eq!(out.pixel(0, 0), Some([128, 128, 128]));
}

#[test]
fn blend_weights_each_channel() {
    let a = Frame::solid(2, 1, [200, 100, 0]).unwrap();
    let b = Frame::solid(2, 1, [100, 50, 255]).unwrap();
    let out = blend_weighted(&a, &b, 0.5, 0.5).unwrap();
    assert_eq!(out.pixel(1, 0), Some([150, 75, 128]));
}

#[test]
fn blend_saturates_on_overflow() {
    let a = Frame::solid(1, 1, [250, 10, 0]).unwrap();
    let b = Frame::solid(1, 1, [250, 10, 0]).unwrap();
    let out = blend_weighted(&a, &b, 1.0, 1.0).unwrap();
    assert_eq!(out.pixel(0, 0), Some([255, 20, 0]));
}

#[test]
fn blend_over_black_with_zero_weight_only_scales() {
    let b = Frame::solid(3, 3, [255, 255, 255]).unwrap();
    let out = blend_weighted(&b, &b.black_like(), 0.4, 0.0).unwrap();
    assert!(out.data().iter().all(|&v| v == 102));
}

#[test]
fn blend_rejects_mismatched_shapes() {
    let a = Frame::solid(4, 4, [0, 0, 0]).unwrap();
    let b = Frame::solid(4, 2, [0, 0, 0]).unwrap();
    assert!(matches!(
        blend_weighted(&a, &b, 0.5, 0.5),
        Err(VeilError::ShapeMismatch { .. })
    ));
}

proptest! {
    #[test]
    fn contrast_lut_matches_formula_within_rounding(factor in 0.0f64..8.0, v in 0u8..=255) {
        let lut = contrast_lut(factor);
        let exact = (f64::from(v) * factor + 128.0 * (1.0 - factor)).clamp(0.0, 255.0);
        prop_assert!((f64::from(lut[usize::from(v)]) - exact).abs() <= 0.5 + 1e-3);
    }

    #[test]
    fn contrast_is_monotone_in_pixel_value(factor in 0.0f64..16.0) {
        let lut = contrast_lut(factor);
        prop_assert!(lut.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn contrast_saturates_extremes(factor in 1.01f64..50.0) {
        let f = Frame::from_rgb8(2, 1, vec![0, 0, 0, 255, 255, 255]).unwrap();
        let out = adjust_contrast(&f, factor);
        prop_assert_eq!(out.dims(), f.dims());
        prop_assert_eq!(out.pixel(0, 0), Some([0, 0, 0]));
        prop_assert_eq!(out.pixel(1, 0), Some([255, 255, 255]));
    }
}

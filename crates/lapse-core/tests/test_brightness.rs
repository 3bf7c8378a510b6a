use approx::assert_abs_diff_eq;
use image::{DynamicImage, Rgb, RgbImage};

use lapse_core::brightness::measure::{
    exif_light, fill_gaps, lightness, luminance_from_lightness, mean_lab_luminance,
    mean_luminance,
};
use lapse_core::brightness::{
    calculate_curve, check_finite, exposure_for, propagate_edit, renormalize, CalculationMode,
    CurveParams,
};
use lapse_core::brightness::curve::moving_average;
use lapse_core::color::ColorSpace;
use lapse_core::error::LapseError;
use lapse_core::frame::Frame;
use lapse_core::io::metadata::FrameMetadata;

/// Flickering measurement series with a slow upward trend.
fn flicker_series(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 20.0 + i as f64 * 0.5 + if i % 2 == 0 { 3.0 } else { -3.0 })
        .collect()
}

// ---------------------------------------------------------------------------
// Exposure law
// ---------------------------------------------------------------------------

#[test]
fn test_exposure_doubling_is_one_stop() {
    assert_abs_diff_eq!(exposure_for(16.0, 8.0), 1.0, epsilon = 1e-12);
}

#[test]
fn test_exposure_halving_is_minus_one_stop() {
    assert_abs_diff_eq!(exposure_for(4.0, 8.0), -1.0, epsilon = 1e-12);
}

#[test]
fn test_exposure_zero_target_is_zero() {
    for reference in [0.0, 1.0, 8.0, 1000.0] {
        assert_eq!(exposure_for(0.0, reference), 0.0);
    }
}

#[test]
fn test_exposure_zero_reference() {
    // log2(1 / |target|)
    assert_abs_diff_eq!(exposure_for(4.0, 0.0), -2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(exposure_for(0.5, 0.0), 1.0, epsilon = 1e-12);
}

#[test]
fn test_exposure_sign_follows_target_not_ratio() {
    // A negative target with a positive reference: |ratio| = 2 gives +1 stop,
    // and the target's sign flips it to -1.
    assert_abs_diff_eq!(exposure_for(-16.0, 8.0), -1.0, epsilon = 1e-12);
    // |ratio| = 0.5 gives -1 stop, flipped to +1.
    assert_abs_diff_eq!(exposure_for(-4.0, 8.0), 1.0, epsilon = 1e-12);
}

#[test]
fn test_frame_exposure_uses_own_baseline() {
    let mut frame = Frame::with_brightness("a.jpg", 8.0);
    assert_eq!(frame.exposure(), 0.0);
    frame.set_alternative_brightness(16.0);
    assert_abs_diff_eq!(frame.exposure(), 1.0, epsilon = 1e-12);
    assert_eq!(frame.filename(), "a");
}

// ---------------------------------------------------------------------------
// Edit propagation and renormalization
// ---------------------------------------------------------------------------

#[test]
fn test_propagate_edit_shifts_later_frames() {
    let mut values = vec![10.0; 5];
    let delta = propagate_edit(&mut values, 1, 20.0).unwrap();
    assert_eq!(delta, 10.0);
    assert_eq!(values, vec![10.0, 20.0, 20.0, 20.0, 20.0]);
}

#[test]
fn test_propagate_edit_last_frame_only() {
    let mut values = vec![1.0, 2.0, 3.0];
    propagate_edit(&mut values, 2, 0.5).unwrap();
    assert_eq!(values, vec![1.0, 2.0, 0.5]);
}

#[test]
fn test_propagate_edit_out_of_range() {
    let mut values = vec![1.0, 2.0];
    let err = propagate_edit(&mut values, 2, 5.0).unwrap_err();
    assert!(matches!(err, LapseError::FrameIndexOutOfRange { index: 2, total: 2 }));
    assert_eq!(values, vec![1.0, 2.0]);
}

#[test]
fn test_propagate_edit_rejects_non_finite() {
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let mut values = vec![10.0, 10.0, 10.0];
        let err = propagate_edit(&mut values, 0, bad).unwrap_err();
        assert!(matches!(
            err,
            LapseError::InvalidState {
                can_proceed: false,
                ..
            }
        ));
        assert_eq!(values, vec![10.0, 10.0, 10.0]);
    }
}

#[test]
fn test_check_finite_reports_position() {
    assert!(check_finite(&[0.0, 5.0, 1e300]).is_ok());
    let err = check_finite(&[0.0, f64::NAN]).unwrap_err();
    assert!(err.to_string().contains("position 1"), "{err}");
}

#[test]
fn test_renormalize_shifts_by_abs_min_plus_margin() {
    let mut values = vec![4.0, -3.0, 0.0, 10.0];
    let shift = renormalize(&mut values);
    assert_eq!(shift, 8.0);
    assert_eq!(values, vec![12.0, 5.0, 8.0, 18.0]);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    assert_eq!(min, 5.0);
}

#[test]
fn test_renormalize_applies_once() {
    let mut values = vec![-3.0, -3.0, -3.0];
    renormalize(&mut values);
    assert_eq!(values, vec![5.0, 5.0, 5.0]);
    // Already non-negative: a second pass is a no-op.
    assert_eq!(renormalize(&mut values), 0.0);
    assert_eq!(values, vec![5.0, 5.0, 5.0]);
}

#[test]
fn test_renormalize_leaves_non_negative_values() {
    let mut values = vec![0.0, 3.0, 7.5];
    assert_eq!(renormalize(&mut values), 0.0);
    assert_eq!(values, vec![0.0, 3.0, 7.5]);
}

// ---------------------------------------------------------------------------
// Curve calculation
// ---------------------------------------------------------------------------

#[test]
fn test_keyframes_unchanged_in_every_mode() {
    let originals = flicker_series(30);
    let mut anchors = vec![None; 30];
    anchors[0] = Some(originals[0]);
    anchors[12] = Some(40.0);
    anchors[29] = Some(originals[29] * 0.8);

    for mode in CalculationMode::ALL {
        let targets =
            calculate_curve(mode, &originals, &originals, &anchors, &CurveParams::default());
        assert_eq!(targets.len(), 30);
        for (i, anchor) in anchors.iter().enumerate() {
            if let Some(a) = anchor {
                assert_eq!(targets[i], *a, "{mode}: keyframe {i} moved");
            }
        }
    }
}

#[test]
fn test_curve_is_deterministic() {
    let originals = flicker_series(20);
    let mut anchors = vec![None; 20];
    anchors[5] = Some(originals[5]);
    for mode in CalculationMode::ALL {
        let params = CurveParams::default();
        let a = calculate_curve(mode, &originals, &originals, &anchors, &params);
        let b = calculate_curve(mode, &originals, &originals, &anchors, &params);
        assert_eq!(a, b, "{mode}");
    }
}

#[test]
fn test_simple_mode_is_linear_ramp_without_keyframes() {
    let originals = vec![10.0, 30.0, 10.0, 30.0, 50.0];
    let anchors = vec![None; 5];
    let targets = calculate_curve(
        CalculationMode::Simple,
        &originals,
        &originals,
        &anchors,
        &CurveParams::default(),
    );
    let expected = [10.0, 20.0, 30.0, 40.0, 50.0];
    for (t, e) in targets.iter().zip(expected) {
        assert_abs_diff_eq!(*t, e, epsilon = 1e-9);
    }
}

#[test]
fn test_advanced_reduces_flicker() {
    let originals = flicker_series(40);
    let anchors = vec![None; 40];
    let targets = calculate_curve(
        CalculationMode::Advanced,
        &originals,
        &originals,
        &anchors,
        &CurveParams::default(),
    );
    let jitter = |v: &[f64]| -> f64 {
        v.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / (v.len() - 1) as f64
    };
    assert!(jitter(&targets[5..35]) < jitter(&originals[5..35]) / 3.0);
}

#[test]
fn test_advanced2_smooths_in_log_domain() {
    let originals = vec![10.0, 40.0, 10.0, 40.0, 10.0, 40.0, 10.0];
    let anchors = vec![None; 7];
    let params = CurveParams {
        advanced2_sigma: 100.0,
        ..CurveParams::default()
    };
    let targets =
        calculate_curve(CalculationMode::AdvancedII, &originals, &originals, &anchors, &params);
    // A very wide Gaussian approaches the geometric mean, not the arithmetic one.
    let geometric = (10.0f64.powi(4) * 40.0f64.powi(3)).powf(1.0 / 7.0);
    assert_abs_diff_eq!(targets[3], geometric, epsilon = 0.5);
}

#[test]
fn test_single_keyframe_scales_whole_curve() {
    let originals = vec![10.0; 6];
    let mut anchors = vec![None; 6];
    anchors[2] = Some(20.0);
    let targets = calculate_curve(
        CalculationMode::Advanced,
        &originals,
        &originals,
        &anchors,
        &CurveParams::default(),
    );
    for t in targets {
        assert_abs_diff_eq!(t, 20.0, epsilon = 1e-9);
    }
}

#[test]
fn test_anchor_correction_interpolates_between_keyframes() {
    let originals = vec![10.0; 5];
    let mut anchors = vec![None; 5];
    anchors[0] = Some(10.0);
    anchors[4] = Some(30.0);
    let targets = calculate_curve(
        CalculationMode::Simple,
        &originals,
        &originals,
        &anchors,
        &CurveParams::default(),
    );
    let expected = [10.0, 15.0, 20.0, 25.0, 30.0];
    for (t, e) in targets.iter().zip(expected) {
        assert_abs_diff_eq!(*t, e, epsilon = 1e-9);
    }
}

#[test]
fn test_exif_mode_follows_metadata_measurements() {
    // Shutter doubles on frame 2: the measured light jumps, the image does too.
    let light = vec![1.0, 1.0, 2.0, 2.0];
    let originals = vec![10.0, 10.0, 20.0, 20.0];
    let anchors = vec![None; 4];
    let targets = calculate_curve(
        CalculationMode::Exif,
        &originals,
        &light,
        &anchors,
        &CurveParams::default(),
    );
    let smoothed = moving_average(&light, 5);
    for i in 0..4 {
        assert_abs_diff_eq!(targets[i], originals[i] * smoothed[i] / light[i], epsilon = 1e-9);
    }
}

#[test]
fn test_moving_average_truncates_at_edges() {
    let avg = moving_average(&[0.0, 3.0, 6.0, 9.0], 3);
    assert_eq!(avg, vec![1.5, 3.0, 6.0, 7.5]);
}

#[test]
fn test_moving_average_window_one_is_identity() {
    let series = [1.0, 5.0, 2.0];
    assert_eq!(moving_average(&series, 1), series.to_vec());
}

#[test]
fn test_calculation_mode_display_and_default() {
    assert_eq!(CalculationMode::default(), CalculationMode::Simple);
    assert_eq!(format!("{}", CalculationMode::AdvancedII), "Advanced II");
    assert_eq!(CalculationMode::ALL.len(), 5);
    for mode in CalculationMode::ALL {
        assert!(!mode.description().is_empty());
    }
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

fn uniform(level: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([level, level, level])))
}

#[test]
fn test_mean_luminance_scale() {
    assert_abs_diff_eq!(mean_luminance(&uniform(0), ColorSpace::Srgb), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(mean_luminance(&uniform(255), ColorSpace::Srgb), 100.0, epsilon = 1e-3);
}

#[test]
fn test_mean_luminance_is_linear_light() {
    // sRGB 128 is about 21.6 % linear luminance.
    assert_abs_diff_eq!(mean_luminance(&uniform(128), ColorSpace::Srgb), 21.6, epsilon = 0.1);
}

#[test]
fn test_lab_luminance_matches_linear_on_uniform_image() {
    let img = uniform(90);
    assert_abs_diff_eq!(
        mean_lab_luminance(&img, ColorSpace::Srgb),
        mean_luminance(&img, ColorSpace::Srgb),
        epsilon = 1e-3
    );
}

#[test]
fn test_lab_luminance_below_linear_mean_on_contrast() {
    let mut img = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
    for x in 0..4 {
        for y in 0..8 {
            img.put_pixel(x, y, Rgb([255, 255, 255]));
        }
    }
    let img = DynamicImage::ImageRgb8(img);
    let lab = mean_lab_luminance(&img, ColorSpace::Srgb);
    let linear = mean_luminance(&img, ColorSpace::Srgb);
    assert!(lab < linear, "lab {lab} linear {linear}");
}

#[test]
fn test_lightness_round_trip() {
    for y in [0.0, 0.001, 0.008, 0.18, 0.5, 1.0] {
        assert_abs_diff_eq!(luminance_from_lightness(lightness(y)), y, epsilon = 1e-9);
    }
    assert_abs_diff_eq!(lightness(1.0), 100.0, epsilon = 1e-9);
}

#[test]
fn test_exif_light_formula() {
    let meta = FrameMetadata {
        aperture: Some("f/2.8".into()),
        shutter: Some("1/50".into()),
        iso: Some("200".into()),
    };
    let expected = (1.0 / 50.0) * 200.0 / (100.0 * 2.8 * 2.8);
    assert_abs_diff_eq!(exif_light(&meta).unwrap(), expected, epsilon = 1e-12);
}

#[test]
fn test_exif_light_unknown_without_metadata() {
    assert_eq!(exif_light(&FrameMetadata::default()), None);
}

#[test]
fn test_fill_gaps_interpolates_between_known_values() {
    let filled = fill_gaps(&[Some(1.0), None, None, Some(4.0), None]).unwrap();
    assert_eq!(filled, vec![1.0, 2.0, 3.0, 4.0, 4.0]);
}

#[test]
fn test_fill_gaps_leading_gap_takes_first_known() {
    let filled = fill_gaps(&[None, None, Some(0.002), Some(0.004)]).unwrap();
    assert_eq!(filled, vec![0.002, 0.002, 0.002, 0.004]);
}

#[test]
fn test_fill_gaps_nothing_known() {
    assert_eq!(fill_gaps(&[None, None]), None);
    assert_eq!(fill_gaps(&[]), None);
}

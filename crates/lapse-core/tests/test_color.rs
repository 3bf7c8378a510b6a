use approx::assert_abs_diff_eq;

use lapse_core::color::{apply_exposure, to_linear, to_non_linear, ColorSpace, ExposureLut};

const SPACES: [ColorSpace; 5] = [
    ColorSpace::Srgb,
    ColorSpace::AdobeRgb,
    ColorSpace::ProPhoto,
    ColorSpace::Rec709,
    ColorSpace::Gamma(2.2),
];

// ---------------------------------------------------------------------------
// Transfer functions
// ---------------------------------------------------------------------------

#[test]
fn test_round_trip_every_8bit_level() {
    for space in SPACES {
        for level in 0..=255u8 {
            let v = level as f64 / 255.0;
            let back = to_non_linear(to_linear([v, v, v], space), space);
            for c in back {
                let restored = (c * 255.0).round() as i32;
                assert!(
                    (restored - level as i32).abs() <= 1,
                    "{space}: level {level} came back as {restored}"
                );
            }
        }
    }
}

#[test]
fn test_decode_endpoints() {
    for space in SPACES {
        assert_abs_diff_eq!(space.decode(0.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(space.decode(1.0), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_decode_is_monotonic() {
    for space in SPACES {
        let mut prev = -1.0;
        for level in 0..=255 {
            let v = space.decode(level as f64 / 255.0);
            assert!(v >= prev, "{space} not monotonic at {level}");
            prev = v;
        }
    }
}

#[test]
fn test_srgb_mid_gray_is_about_21_percent_linear() {
    let [r, _, _] = to_linear([0.5, 0.5, 0.5], ColorSpace::Srgb);
    assert_abs_diff_eq!(r, 0.214, epsilon = 1e-3);
}

#[test]
fn test_gamma_space_uses_its_own_curve() {
    let g18 = ColorSpace::Gamma(1.8).decode(0.5);
    let g26 = ColorSpace::Gamma(2.6).decode(0.5);
    assert_abs_diff_eq!(g18, 0.5f64.powf(1.8), epsilon = 1e-6);
    assert!(g26 < g18);
}

#[test]
fn test_luminance_weights_sum_to_one() {
    for space in SPACES {
        let sum: f64 = space.luminance_weights().iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-3);
    }
}

// ---------------------------------------------------------------------------
// Exposure
// ---------------------------------------------------------------------------

#[test]
fn test_zero_exposure_is_exact_identity() {
    let pixels = [[0.0, 0.5, 1.0], [0.123_456_789, 1e-9, 0.999_999], [2.5, -0.1, 0.3]];
    for p in pixels {
        assert_eq!(apply_exposure(p, 0.0), p);
    }
}

#[test]
fn test_exposure_scales_by_power_of_two() {
    let p = [0.1, 0.2, 0.3];
    let up = apply_exposure(p, 1.0);
    let down = apply_exposure(p, -2.0);
    for i in 0..3 {
        assert_abs_diff_eq!(up[i], p[i] * 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(down[i], p[i] / 4.0, epsilon = 1e-12);
    }
}

// ---------------------------------------------------------------------------
// Lookup table
// ---------------------------------------------------------------------------

#[test]
fn test_lut_zero_stops_is_identity() {
    for space in SPACES {
        let lut = ExposureLut::new(0.0, space);
        assert!(lut.is_identity(), "{space}");
    }
}

#[test]
fn test_lut_matches_direct_transform() {
    let space = ColorSpace::Srgb;
    let stops = 0.7;
    let lut = ExposureLut::new(stops, space);
    for level in 0..=255u8 {
        let v = level as f64 / 255.0;
        let [l, _, _] = apply_exposure(to_linear([v, v, v], space), stops);
        let [e, _, _] = to_non_linear([l.min(1.0), 0.0, 0.0], space);
        assert_eq!(lut.map(level), (e * 255.0).round() as u8);
    }
}

#[test]
fn test_lut_positive_stops_brighten_and_clip() {
    let lut = ExposureLut::new(1.0, ColorSpace::Srgb);
    assert_eq!(lut.map(0), 0);
    assert!(lut.map(100) > 100);
    assert_eq!(lut.map(255), 255);
    assert_eq!(lut.stops(), 1.0);
    assert_eq!(lut.color_space(), ColorSpace::Srgb);
}

#[test]
fn test_lut_negative_stops_darken() {
    let lut = ExposureLut::new(-1.0, ColorSpace::AdobeRgb);
    for level in 1..=255u8 {
        assert!(lut.map(level) <= level);
    }
    assert!(lut.map(200) < 200);
}

#[test]
fn test_color_space_display() {
    assert_eq!(format!("{}", ColorSpace::Srgb), "sRGB");
    assert_eq!(format!("{}", ColorSpace::default()), "sRGB");
    assert_eq!(format!("{}", ColorSpace::Rec709), "Rec.709");
}

#[allow(dead_code)]
mod common;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, Rgba, RgbaImage};
use tempfile::TempDir;

use lapse_core::color::{ColorSpace, ExposureLut};
use lapse_core::error::LapseError;
use lapse_core::process::{
    process, process_rgb8, write_exposure_sidecar, write_output, PixelLayout, ProcessOutcome,
    SaveFormat,
};

fn processed(outcome: ProcessOutcome) -> DynamicImage {
    match outcome {
        ProcessOutcome::Processed(img) => img,
        ProcessOutcome::Deferred { .. } => panic!("expected a processed image"),
    }
}

// ---------------------------------------------------------------------------
// 8-bit paths
// ---------------------------------------------------------------------------

#[test]
fn test_zero_stops_returns_identical_pixels() {
    let src = common::gray_image(10, 7, 77);
    let out = processed(process(&src, 0.0, ColorSpace::Srgb).unwrap());
    assert_eq!(out.as_bytes(), src.as_bytes());
}

#[test]
fn test_positive_stops_brighten_rgb() {
    let src = common::gray_image(4, 4, 100);
    let out = processed(process(&src, 1.0, ColorSpace::Srgb).unwrap());
    let px = out.to_rgb8().get_pixel(0, 0).0;
    assert!(px.iter().all(|&c| c > 100));
    assert_eq!(px[0], px[1]);
}

#[test]
fn test_source_is_not_mutated() {
    let src = common::gray_image(6, 6, 120);
    let before = src.as_bytes().to_vec();
    let _ = process(&src, -1.5, ColorSpace::Srgb).unwrap();
    assert_eq!(src.as_bytes(), before.as_slice());
}

#[test]
fn test_alpha_passes_through_unchanged() {
    let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(5, 3, Rgba([100, 150, 200, 37])));
    let out = processed(process(&src, 1.0, ColorSpace::Srgb).unwrap());
    let DynamicImage::ImageRgba8(rgba) = out else {
        panic!("RGBA input must stay RGBA");
    };
    for px in rgba.pixels() {
        assert_eq!(px.0[3], 37);
        assert!(px.0[0] > 100);
    }
}

#[test]
fn test_channel_order_preserved() {
    let lut = ExposureLut::new(0.5, ColorSpace::Srgb);
    let rgb = [10u8, 120, 240];
    let bgr = [240u8, 120, 10];
    let out_rgb = process_rgb8(&rgb, PixelLayout::packed(1, 1, 3), &lut).unwrap();
    let out_bgr = process_rgb8(&bgr, PixelLayout::packed(1, 1, 3), &lut).unwrap();
    assert_eq!(out_rgb[0], out_bgr[2]);
    assert_eq!(out_rgb[2], out_bgr[0]);
}

#[test]
fn test_row_padding_untouched() {
    let lut = ExposureLut::new(1.0, ColorSpace::Srgb);
    // 2x2 RGB with 2 bytes of padding per row.
    let layout = PixelLayout {
        width: 2,
        height: 2,
        channels: 3,
        stride: 8,
    };
    let src = [50u8, 50, 50, 50, 50, 50, 9, 9, 50, 50, 50, 50, 50, 50, 9, 9];
    let out = process_rgb8(&src, layout, &lut).unwrap();
    assert_eq!(&out[6..8], &[9, 9]);
    assert_eq!(&out[14..16], &[9, 9]);
    assert!(out[0] > 50 && out[13] > 50);
}

#[test]
fn test_short_buffer_rejected() {
    let lut = ExposureLut::new(1.0, ColorSpace::Srgb);
    let err = process_rgb8(&[0u8; 5], PixelLayout::packed(2, 1, 3), &lut).unwrap_err();
    assert!(matches!(err, LapseError::UnsupportedFormat(_)));
}

// ---------------------------------------------------------------------------
// Other layouts
// ---------------------------------------------------------------------------

#[test]
fn test_grayscale_is_unsupported() {
    let src = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([80])));
    let err = process(&src, 1.0, ColorSpace::Srgb).unwrap_err();
    assert!(matches!(err, LapseError::UnsupportedFormat(_)));
}

#[test]
fn test_two_channel_layout_is_unsupported() {
    let lut = ExposureLut::new(1.0, ColorSpace::Srgb);
    let err = process_rgb8(&[0u8; 8], PixelLayout::packed(2, 2, 2), &lut).unwrap_err();
    assert!(matches!(err, LapseError::UnsupportedFormat(_)));
}

#[test]
fn test_16bit_is_deferred() {
    let src = DynamicImage::ImageRgb16(ImageBuffer::from_pixel(4, 4, Rgb([1000u16, 2000, 3000])));
    let outcome = process(&src, 1.0, ColorSpace::Srgb).unwrap();
    assert!(outcome.is_deferred());
    assert!(matches!(
        outcome,
        ProcessOutcome::Deferred {
            bit_depth: 16,
            channels: 3
        }
    ));
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[test]
fn test_write_output_formats() {
    let dir = TempDir::new().unwrap();
    let img = common::gray_image(8, 8, 60);
    for format in [SaveFormat::Jpeg, SaveFormat::Png, SaveFormat::Tiff, SaveFormat::Bmp] {
        let path = write_output(&img, dir.path(), "frame", format, 90).unwrap();
        assert_eq!(path.extension().unwrap(), format.extension());
        let back = image::open(&path).unwrap();
        assert_eq!((back.width(), back.height()), (8, 8));
    }
}

#[test]
fn test_write_png_keeps_exact_pixels() {
    let dir = TempDir::new().unwrap();
    let img = common::gray_image(3, 3, 201);
    let path = write_output(&img, dir.path(), "exact", SaveFormat::Png, 90).unwrap();
    let back = image::open(&path).unwrap().to_rgb8();
    assert_eq!(back.get_pixel(1, 1).0, [201, 201, 201]);
}

#[test]
fn test_exposure_sidecar_contents() {
    let dir = TempDir::new().unwrap();
    let path = write_exposure_sidecar(dir.path(), "IMG_0001", "pp3", -0.25).unwrap();
    assert_eq!(path.file_name().unwrap(), "IMG_0001.pp3");
    let text = std::fs::read_to_string(path).unwrap();
    assert_eq!(text, "[Exposure]\nCompensation=-0.2500\n");
}

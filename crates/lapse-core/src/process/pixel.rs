//! Exposure application on decoded pixels.

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::color::{ColorSpace, ExposureLut};
use crate::error::{LapseError, Result};

/// Result of processing one image.
#[derive(Clone, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum ProcessOutcome {
    Processed(DynamicImage),
    /// Layout is recognised but its depth has no processing path yet.
    /// Nothing was written; the source is untouched.
    Deferred { bit_depth: u8, channels: u8 },
}

impl ProcessOutcome {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred { .. })
    }
}

/// Geometry of an interleaved 8-bit buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelLayout {
    pub width: usize,
    pub height: usize,
    /// 3 (RGB/BGR) or 4 (with alpha last).
    pub channels: usize,
    /// Bytes per row, at least `width * channels`.
    pub stride: usize,
}

impl PixelLayout {
    pub fn packed(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            stride: width * channels,
        }
    }

    fn required_len(&self) -> usize {
        match self.height {
            0 => 0,
            h => self.stride * (h - 1) + self.width * self.channels,
        }
    }
}

/// Apply `stops` of exposure to `source` in linear light of `space`.
///
/// The source is never modified; the result is a fresh buffer.
pub fn process(source: &DynamicImage, stops: f64, space: ColorSpace) -> Result<ProcessOutcome> {
    process_with_lut(source, &ExposureLut::new(stops, space))
}

/// Like [`process`] with a lookup table built by the caller.
pub fn process_with_lut(source: &DynamicImage, lut: &ExposureLut) -> Result<ProcessOutcome> {
    let (w, h) = (source.width(), source.height());
    match source {
        DynamicImage::ImageRgb8(img) => {
            let layout = PixelLayout::packed(w as usize, h as usize, 3);
            let out = process_rgb8(img.as_raw(), layout, lut)?;
            RgbImage::from_raw(w, h, out)
                .map(|img| ProcessOutcome::Processed(DynamicImage::ImageRgb8(img)))
                .ok_or_else(|| LapseError::UnsupportedFormat("RGB8 buffer size mismatch".into()))
        }
        DynamicImage::ImageRgba8(img) => {
            let layout = PixelLayout::packed(w as usize, h as usize, 4);
            let out = process_rgb8(img.as_raw(), layout, lut)?;
            RgbaImage::from_raw(w, h, out)
                .map(|img| ProcessOutcome::Processed(DynamicImage::ImageRgba8(img)))
                .ok_or_else(|| LapseError::UnsupportedFormat("RGBA8 buffer size mismatch".into()))
        }
        // TODO: 16-bit processing path.
        DynamicImage::ImageRgb16(_) => Ok(ProcessOutcome::Deferred {
            bit_depth: 16,
            channels: 3,
        }),
        DynamicImage::ImageRgba16(_) => Ok(ProcessOutcome::Deferred {
            bit_depth: 16,
            channels: 4,
        }),
        other => Err(LapseError::UnsupportedFormat(format!("{:?}", other.color()))),
    }
}

/// Map the color channels of an interleaved 8-bit buffer through `lut`.
///
/// Channel order is preserved and a fourth (alpha) channel is copied
/// unchanged, as are any row padding bytes. Allocates the output once.
pub fn process_rgb8(src: &[u8], layout: PixelLayout, lut: &ExposureLut) -> Result<Vec<u8>> {
    if !matches!(layout.channels, 3 | 4) {
        return Err(LapseError::UnsupportedFormat(format!(
            "{} channel 8-bit image",
            layout.channels
        )));
    }
    let row_len = layout.width * layout.channels;
    if layout.stride < row_len || src.len() < layout.required_len() {
        return Err(LapseError::UnsupportedFormat(format!(
            "buffer of {} bytes does not fit {}x{}x{} with stride {}",
            src.len(),
            layout.width,
            layout.height,
            layout.channels,
            layout.stride
        )));
    }

    let mut out = src.to_vec();
    if layout.stride == 0 {
        return Ok(out);
    }
    for row in out.chunks_mut(layout.stride).take(layout.height) {
        for px in row[..row_len].chunks_exact_mut(layout.channels) {
            for c in &mut px[..3] {
                *c = lut.map(*c);
            }
        }
    }
    Ok(out)
}

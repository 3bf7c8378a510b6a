use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Image format processed frames are written in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveFormat {
    #[default]
    Jpeg,
    Png,
    Tiff,
    Bmp,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Tiff => ImageFormat::Tiff,
            Self::Bmp => ImageFormat::Bmp,
        }
    }

    pub fn supports_alpha(&self) -> bool {
        matches!(self, Self::Png | Self::Tiff)
    }
}

/// Path of the processed output for a frame named `stem`.
pub fn output_path(dir: &Path, stem: &str, format: SaveFormat) -> PathBuf {
    dir.join(format!("{stem}.{}", format.extension()))
}

/// Write a processed frame into `dir`, returning the written path.
///
/// Alpha is dropped for formats that cannot store it.
pub fn write_output(
    image: &DynamicImage,
    dir: &Path,
    stem: &str,
    format: SaveFormat,
    jpeg_quality: u8,
) -> Result<PathBuf> {
    let path = output_path(dir, stem, format);
    match format {
        SaveFormat::Jpeg => {
            let mut writer = BufWriter::new(File::create(&path)?);
            let mut encoder =
                JpegEncoder::new_with_quality(&mut writer, jpeg_quality.clamp(1, 100));
            encoder.encode_image(&image.to_rgb8())?;
            writer.flush()?;
        }
        _ if !format.supports_alpha() && image.color().has_alpha() => {
            DynamicImage::ImageRgb8(image.to_rgb8())
                .save_with_format(&path, format.image_format())?;
        }
        _ => image.save_with_format(&path, format.image_format())?,
    }
    Ok(path)
}

/// Write an exposure sidecar for an external raw converter.
///
/// The file uses the converter's INI-style profile layout:
/// `[Exposure]` with `Compensation=<stops>`.
pub fn write_exposure_sidecar(
    dir: &Path,
    stem: &str,
    extension: &str,
    stops: f64,
) -> Result<PathBuf> {
    let path = dir.join(format!("{stem}.{extension}"));
    let mut file = BufWriter::new(File::create(&path)?);
    writeln!(file, "[Exposure]")?;
    writeln!(file, "Compensation={stops:.4}")?;
    file.flush()?;
    Ok(path)
}

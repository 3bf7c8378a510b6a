use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::DynamicImage;

use crate::consts::{THUMB_MAX_HEIGHT, THUMB_MAX_WIDTH};
use crate::error::Result;

/// True when `path` has one of `extensions` (lowercase, without dot), ignoring case.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            extensions.iter().any(|allowed| *allowed == e)
        })
        .unwrap_or(false)
}

/// List the files of `dir` with an allowed extension, sorted by file name.
pub fn list_frame_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Decode a source image at full resolution.
pub fn load_source(path: &Path) -> Result<DynamicImage> {
    Ok(image::open(path)?)
}

/// Size of a thumbnail for a `width` x `height` source, aspect preserved.
/// Sources already inside the bounds keep their size.
pub fn thumb_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    if width <= THUMB_MAX_WIDTH && height <= THUMB_MAX_HEIGHT {
        return (width, height);
    }
    let scale =
        (THUMB_MAX_WIDTH as f64 / width as f64).min(THUMB_MAX_HEIGHT as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Build an 8-bit RGB preview bounded by the thumbnail size.
pub fn make_thumbnail(source: &DynamicImage) -> DynamicImage {
    let (w, h) = thumb_dimensions(source.width(), source.height());
    let scaled = if (w, h) == (source.width(), source.height()) {
        source.to_rgb8()
    } else {
        source.resize_exact(w, h, FilterType::Triangle).to_rgb8()
    };
    DynamicImage::ImageRgb8(scaled)
}

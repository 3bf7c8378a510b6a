use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::brightness::exposure_for;
use crate::color::ColorSpace;
use crate::io::metadata::FrameMetadata;

/// One photograph in the time-ordered sequence.
#[derive(Clone, Debug)]
pub struct Frame {
    file_path: PathBuf,
    /// Measured brightness, set once when the frame is analysed.
    pub original_brightness: f64,
    /// Target brightness the frame is corrected towards.
    pub alternative_brightness: f64,
    /// Keyframe targets are pinned and never altered by automatic calculation.
    pub is_keyframe: bool,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub metadata: FrameMetadata,
    /// Preview of the unmodified source.
    pub thumb: Option<DynamicImage>,
    /// Preview with the current exposure applied.
    pub thumb_edited: Option<DynamicImage>,
}

impl Frame {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            original_brightness: 0.0,
            alternative_brightness: 0.0,
            is_keyframe: false,
            width: 0,
            height: 0,
            color_space: ColorSpace::default(),
            metadata: FrameMetadata::default(),
            thumb: None,
            thumb_edited: None,
        }
    }

    /// Frame with a measured brightness; the target starts at the measurement.
    pub fn with_brightness(file_path: impl Into<PathBuf>, brightness: f64) -> Self {
        let mut frame = Self::new(file_path);
        frame.original_brightness = brightness;
        frame.alternative_brightness = brightness;
        frame
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// File name without extension, used to name processed output.
    pub fn filename(&self) -> String {
        self.file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Exposure correction in stops that moves this frame to its target.
    pub fn exposure(&self) -> f64 {
        exposure_for(self.alternative_brightness, self.original_brightness)
    }

    /// Set a new target and drop the now stale edited preview.
    pub fn set_alternative_brightness(&mut self, value: f64) {
        if self.alternative_brightness != value {
            self.alternative_brightness = value;
            self.thumb_edited = None;
        }
    }

    /// Replace the source preview, dropping anything derived from the old one.
    pub fn set_thumb(&mut self, thumb: DynamicImage) {
        self.thumb_edited = Some(thumb.clone());
        self.thumb = Some(thumb);
    }
}

//! Persisted project state.
//!
//! The encoding is TOML. Thumbnails are not stored; they are rebuilt when a
//! project is opened.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::brightness::CalculationMode;
use crate::color::ColorSpace;
use crate::error::{LapseError, Result};
use crate::frame::Frame;
use crate::io::metadata::FrameMetadata;
use crate::project::ProjectKind;

pub const PROJECT_FILE_VERSION: u32 = 1;

/// File extension of saved projects.
pub const PROJECT_EXTENSION: &str = "lasp";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub version: u32,
    pub is_brightness_calculated: bool,
    pub calculation_mode: Option<CalculationMode>,
    pub kind: ProjectKind,
    #[serde(default)]
    pub frames: Vec<FrameRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub path: PathBuf,
    pub original_brightness: f64,
    pub alternative_brightness: f64,
    pub is_keyframe: bool,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub metadata: FrameMetadata,
    /// Working space of the frame. Older files leave it out and take the
    /// configured space on open.
    #[serde(default)]
    pub color_space: Option<ColorSpace>,
}

impl From<&Frame> for FrameRecord {
    fn from(frame: &Frame) -> Self {
        Self {
            path: frame.file_path().to_path_buf(),
            original_brightness: frame.original_brightness,
            alternative_brightness: frame.alternative_brightness,
            is_keyframe: frame.is_keyframe,
            width: frame.width,
            height: frame.height,
            metadata: frame.metadata.clone(),
            color_space: Some(frame.color_space),
        }
    }
}

impl FrameRecord {
    /// Rebuild the frame; `fallback` applies when no color space was saved.
    pub fn into_frame(self, fallback: ColorSpace) -> Frame {
        let mut frame = Frame::new(self.path);
        frame.color_space = self.color_space.unwrap_or(fallback);
        frame.original_brightness = self.original_brightness;
        frame.alternative_brightness = self.alternative_brightness;
        frame.is_keyframe = self.is_keyframe;
        frame.width = self.width;
        frame.height = self.height;
        frame.metadata = self.metadata;
        frame
    }
}

impl ProjectFile {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        toml::to_string_pretty(self)
            .map(String::into_bytes)
            .map_err(|e| LapseError::ProjectFormat(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text =
            std::str::from_utf8(bytes).map_err(|e| LapseError::ProjectFormat(e.to_string()))?;
        let file: Self =
            toml::from_str(text).map_err(|e| LapseError::ProjectFormat(e.to_string()))?;
        if file.version > PROJECT_FILE_VERSION {
            return Err(LapseError::ProjectFormat(format!(
                "unsupported version {} (newest known: {PROJECT_FILE_VERSION})",
                file.version
            )));
        }
        Ok(file)
    }
}

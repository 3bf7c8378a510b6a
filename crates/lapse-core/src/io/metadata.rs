//! Per-frame exposure metadata.
//!
//! Extraction from EXIF/XMP lives outside this crate; a [`MetadataSource`]
//! hands over the already formatted aperture, shutter and ISO strings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Placeholder shown for a missing metadata value.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    /// Aperture, e.g. "f/2.8" or "2.8".
    pub aperture: Option<String>,
    /// Shutter time, e.g. "1/250", "0.5" or "2s".
    pub shutter: Option<String>,
    /// Sensitivity, e.g. "ISO 400" or "400".
    pub iso: Option<String>,
}

impl FrameMetadata {
    pub fn aperture_display(&self) -> &str {
        self.aperture.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn shutter_display(&self) -> &str {
        self.shutter.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn iso_display(&self) -> &str {
        self.iso.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn is_empty(&self) -> bool {
        self.aperture.is_none() && self.shutter.is_none() && self.iso.is_none()
    }

    pub fn f_number(&self) -> Option<f64> {
        let s = self.aperture.as_deref()?.trim();
        let s = s
            .strip_prefix("f/")
            .or_else(|| s.strip_prefix("F/"))
            .or_else(|| s.strip_prefix('f'))
            .or_else(|| s.strip_prefix('F'))
            .unwrap_or(s);
        positive(s.trim().parse().ok()?)
    }

    pub fn shutter_seconds(&self) -> Option<f64> {
        let s = self.shutter.as_deref()?.trim();
        let s = s.strip_suffix('s').unwrap_or(s).trim();
        let value = match s.split_once('/') {
            Some((num, den)) => {
                let num: f64 = num.trim().parse().ok()?;
                let den: f64 = den.trim().parse().ok()?;
                if den == 0.0 {
                    return None;
                }
                num / den
            }
            None => s.parse().ok()?,
        };
        positive(value)
    }

    pub fn iso_speed(&self) -> Option<f64> {
        let s = self.iso.as_deref()?.trim();
        let s = s
            .strip_prefix("ISO")
            .or_else(|| s.strip_prefix("iso"))
            .unwrap_or(s);
        positive(s.trim().parse().ok()?)
    }

    /// Relative light admitted by the camera settings, `t * ISO / (100 * N^2)`.
    ///
    /// Missing values count as neutral (t = 1 s, N = 1, ISO 100); `None` only
    /// when no value at all is present.
    pub fn admitted_light(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let n = self.f_number().unwrap_or(1.0);
        let t = self.shutter_seconds().unwrap_or(1.0);
        let iso = self.iso_speed().unwrap_or(100.0);
        Some(t * iso / (100.0 * n * n))
    }
}

fn positive(v: f64) -> Option<f64> {
    (v.is_finite() && v > 0.0).then_some(v)
}

/// Source of per-frame exposure metadata.
pub trait MetadataSource: Send + Sync {
    fn read(&self, path: &Path) -> Result<FrameMetadata>;
}

/// Source that never has metadata; every value renders as "N/A".
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMetadata;

impl MetadataSource for NoMetadata {
    fn read(&self, _path: &Path) -> Result<FrameMetadata> {
        Ok(FrameMetadata::default())
    }
}

/// Metadata supplied up front, keyed by file path.
#[derive(Clone, Debug, Default)]
pub struct StaticMetadata {
    entries: HashMap<PathBuf, FrameMetadata>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, metadata: FrameMetadata) {
        self.entries.insert(path.into(), metadata);
    }
}

impl MetadataSource for StaticMetadata {
    fn read(&self, path: &Path) -> Result<FrameMetadata> {
        Ok(self.entries.get(path).cloned().unwrap_or_default())
    }
}

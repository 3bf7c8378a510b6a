use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::brightness::CurveParams;
use crate::color::ColorSpace;
use crate::consts::DEFAULT_JPEG_QUALITY;
use crate::error::{LapseError, Result};
use crate::process::SaveFormat;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LapseConfig {
    #[serde(default)]
    pub color_space: ColorSpace,
    #[serde(default)]
    pub save_format: SaveFormat,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Worker threads for file processing. 0 = one per core.
    #[serde(default)]
    pub thread_count: usize,
    #[serde(default)]
    pub calculation: CurveParams,
    #[serde(default)]
    pub settings: Settings,
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

impl Default for LapseConfig {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::default(),
            save_format: SaveFormat::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            thread_count: 0,
            calculation: CurveParams::default(),
            settings: Settings::default(),
        }
    }
}

/// Directories remembered between runs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub last_image_dir: Option<PathBuf>,
    pub last_process_dir: Option<PathBuf>,
    pub last_project_dir: Option<PathBuf>,
}

impl LapseConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| LapseError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `path`, or fall back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LapseError::Config {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml().map_err(|e| match e {
            LapseError::Config { message, .. } => LapseError::Config {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use crate::consts::{IMAGE_EXTENSIONS, RAW_EXTENSIONS};

/// How processed frames are produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProjectKind {
    /// Exposure is applied to the pixels and new images are written.
    LapseStudio(LapseStudioSettings),
    /// An external raw converter renders the frames from exposure sidecars.
    ExternalConverter(ExternalConverterSettings),
}

impl Default for ProjectKind {
    fn default() -> Self {
        Self::LapseStudio(LapseStudioSettings::default())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LapseStudioSettings {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalConverterSettings {
    /// Extension of the sidecar profile written next to each frame.
    pub sidecar_extension: String,
}

impl Default for ExternalConverterSettings {
    fn default() -> Self {
        Self {
            sidecar_extension: "pp3".into(),
        }
    }
}

impl ProjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LapseStudio(_) => "LapseStudio",
            Self::ExternalConverter(_) => "External converter",
        }
    }

    /// File extensions accepted as frames (lowercase, without dot).
    pub fn allowed_extensions(&self) -> Vec<&'static str> {
        match self {
            Self::LapseStudio(_) => IMAGE_EXTENSIONS.to_vec(),
            Self::ExternalConverter(_) => IMAGE_EXTENSIONS
                .iter()
                .chain(RAW_EXTENSIONS)
                .copied()
                .collect(),
        }
    }

    /// Pixel rendering needs a calculated curve; sidecars may be written without one.
    pub fn requires_calculation(&self) -> bool {
        matches!(self, Self::LapseStudio(_))
    }
}

pub mod curve;
pub mod measure;

use serde::{Deserialize, Serialize};

pub use curve::{calculate_curve, check_finite, propagate_edit, renormalize, CurveParams};

/// Brightness calculation strategy. All modes honour keyframe anchors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationMode {
    /// Straight ramp between the first and last measurement.
    #[default]
    Simple,
    /// Smooths the light admitted by the camera settings.
    Exif,
    /// Measures perceptual lightness (CIE L*) instead of linear luminance.
    Lab,
    /// Centered moving average over the measured brightness.
    Advanced,
    /// Gaussian smoothing of the measured brightness in the log domain.
    AdvancedII,
}

impl CalculationMode {
    pub const ALL: [CalculationMode; 5] = [
        Self::Simple,
        Self::Exif,
        Self::Lab,
        Self::Advanced,
        Self::AdvancedII,
    ];

    /// One-line explanation shown next to the mode selector.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Simple => "Linear brightness ramp between the first and the last frame",
            Self::Exif => "Smooths steps in aperture, shutter and ISO from the frame metadata",
            Self::Lab => "Smooths perceptual lightness measured in CIE L*a*b*",
            Self::Advanced => "Moving average over the measured frame brightness",
            Self::AdvancedII => "Gaussian smoothing of the measured brightness in stops",
        }
    }
}

impl std::fmt::Display for CalculationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "Simple"),
            Self::Exif => write!(f, "Exif"),
            Self::Lab => write!(f, "Lab"),
            Self::Advanced => write!(f, "Advanced"),
            Self::AdvancedII => write!(f, "Advanced II"),
        }
    }
}

/// Stops needed to move a frame from `reference` to `target` brightness.
///
/// The direction follows the sign of the target, not of the ratio. Negative
/// targets only exist transiently before renormalization.
pub fn exposure_for(target: f64, reference: f64) -> f64 {
    if target == 0.0 {
        0.0
    } else if reference == 0.0 {
        sign(target) * (1.0 / target.abs()).log2()
    } else {
        sign(target) * (target / reference).abs().log2()
    }
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

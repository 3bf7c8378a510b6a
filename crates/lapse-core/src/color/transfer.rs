//! Transfer functions between device-encoded and linear light.
//!
//! All values are normalized to `[0, 1]`. Each working space carries its own
//! encoding curve and luminance weights; nothing here assumes a fixed gamma.

use serde::{Deserialize, Serialize};

/// Named working color space of a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ColorSpace {
    /// IEC 61966-2-1 piecewise curve.
    #[default]
    Srgb,
    /// Adobe RGB (1998), pure power law of 563/256.
    AdobeRgb,
    /// ROMM RGB, power 1.8 with a linear toe.
    ProPhoto,
    /// ITU-R BT.709 camera curve.
    Rec709,
    /// Pure power law with the given gamma over sRGB primaries.
    Gamma(f32),
}

const ADOBE_GAMMA: f64 = 563.0 / 256.0;
const PROPHOTO_GAMMA: f64 = 1.8;
const PROPHOTO_LINEAR_CUTOFF: f64 = 1.0 / 512.0;
const PROPHOTO_ENCODED_CUTOFF: f64 = 16.0 / 512.0;

impl ColorSpace {
    /// Device-encoded `[0, 1]` to linear light.
    pub fn decode(&self, encoded: f64) -> f64 {
        let e = encoded.clamp(0.0, 1.0);
        match *self {
            Self::Srgb => {
                if e <= 0.04045 {
                    e / 12.92
                } else {
                    ((e + 0.055) / 1.055).powf(2.4)
                }
            }
            Self::AdobeRgb => e.powf(ADOBE_GAMMA),
            Self::ProPhoto => {
                if e < PROPHOTO_ENCODED_CUTOFF {
                    e / 16.0
                } else {
                    e.powf(PROPHOTO_GAMMA)
                }
            }
            Self::Rec709 => {
                if e < 0.081 {
                    e / 4.5
                } else {
                    ((e + 0.099) / 1.099).powf(1.0 / 0.45)
                }
            }
            Self::Gamma(g) => e.powf(f64::from(g)),
        }
    }

    /// Linear light `[0, 1]` to device-encoded.
    pub fn encode(&self, linear: f64) -> f64 {
        let l = linear.clamp(0.0, 1.0);
        match *self {
            Self::Srgb => {
                if l <= 0.0031308 {
                    l * 12.92
                } else {
                    1.055 * l.powf(1.0 / 2.4) - 0.055
                }
            }
            Self::AdobeRgb => l.powf(1.0 / ADOBE_GAMMA),
            Self::ProPhoto => {
                if l < PROPHOTO_LINEAR_CUTOFF {
                    l * 16.0
                } else {
                    l.powf(1.0 / PROPHOTO_GAMMA)
                }
            }
            Self::Rec709 => {
                if l < 0.018 {
                    l * 4.5
                } else {
                    1.099 * l.powf(0.45) - 0.099
                }
            }
            Self::Gamma(g) => l.powf(1.0 / f64::from(g)),
        }
    }

    /// Relative luminance weights (R, G, B) of the space's primaries.
    pub fn luminance_weights(&self) -> [f64; 3] {
        match self {
            Self::Srgb | Self::Rec709 | Self::Gamma(_) => [0.2126, 0.7152, 0.0722],
            Self::AdobeRgb => [0.2974, 0.6273, 0.0753],
            Self::ProPhoto => [0.2880, 0.7119, 0.0001],
        }
    }

    /// Relative luminance of a linear RGB triple.
    pub fn luminance(&self, linear: [f64; 3]) -> f64 {
        let w = self.luminance_weights();
        w[0] * linear[0] + w[1] * linear[1] + w[2] * linear[2]
    }
}

impl std::fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Srgb => write!(f, "sRGB"),
            Self::AdobeRgb => write!(f, "Adobe RGB"),
            Self::ProPhoto => write!(f, "ProPhoto RGB"),
            Self::Rec709 => write!(f, "Rec.709"),
            Self::Gamma(g) => write!(f, "Gamma {g}"),
        }
    }
}

/// Convert an encoded RGB pixel to linear light in `space`.
pub fn to_linear(pixel: [f64; 3], space: ColorSpace) -> [f64; 3] {
    pixel.map(|c| space.decode(c))
}

/// Convert a linear RGB pixel back to the encoding of `space`.
pub fn to_non_linear(linear: [f64; 3], space: ColorSpace) -> [f64; 3] {
    linear.map(|c| space.encode(c))
}

/// Scale every channel by `2^stops`. Zero stops returns the input unchanged.
pub fn apply_exposure(linear: [f64; 3], stops: f64) -> [f64; 3] {
    if stops == 0.0 {
        return linear;
    }
    let factor = stops.exp2();
    linear.map(|c| c * factor)
}

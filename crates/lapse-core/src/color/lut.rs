use crate::consts::LEVELS_8BIT;

use super::transfer::{apply_exposure, ColorSpace};

/// Per-frame 8-bit lookup table mapping an encoded channel level to its
/// exposure-corrected encoded level.
///
/// Exposure is a uniform scale in linear light and the transfer curve acts on
/// each channel independently, so the full pixel transform for one frame
/// collapses into a single 256-entry table.
#[derive(Clone, Debug)]
pub struct ExposureLut {
    table: [u8; LEVELS_8BIT],
    stops: f64,
    space: ColorSpace,
}

impl ExposureLut {
    pub fn new(stops: f64, space: ColorSpace) -> Self {
        let max = (LEVELS_8BIT - 1) as f64;
        let mut table = [0u8; LEVELS_8BIT];
        for (level, out) in table.iter_mut().enumerate() {
            let encoded = level as f64 / max;
            let linear = space.decode(encoded);
            let [exposed, _, _] = apply_exposure([linear, 0.0, 0.0], stops);
            let back = space.encode(exposed.clamp(0.0, 1.0));
            *out = (back * max).round().clamp(0.0, max) as u8;
        }
        Self {
            table,
            stops,
            space,
        }
    }

    #[inline]
    pub fn map(&self, level: u8) -> u8 {
        self.table[level as usize]
    }

    pub fn stops(&self) -> f64 {
        self.stops
    }

    pub fn color_space(&self) -> ColorSpace {
        self.space
    }

    /// True when every level maps to itself.
    pub fn is_identity(&self) -> bool {
        self.table
            .iter()
            .enumerate()
            .all(|(level, &out)| level == out as usize)
    }
}

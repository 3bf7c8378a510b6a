pub mod lut;
pub mod transfer;

pub use lut::ExposureLut;
pub use transfer::{apply_exposure, to_linear, to_non_linear, ColorSpace};

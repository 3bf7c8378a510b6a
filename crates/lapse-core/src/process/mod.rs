pub mod output;
pub mod pixel;

pub use output::{write_exposure_sidecar, write_output, SaveFormat};
pub use pixel::{process, process_rgb8, process_with_lut, PixelLayout, ProcessOutcome};

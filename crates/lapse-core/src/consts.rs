use std::time::Duration;

/// Maximum thumbnail width in pixels. Height follows the source aspect ratio.
pub const THUMB_MAX_WIDTH: u32 = 1000;

/// Maximum thumbnail height in pixels.
pub const THUMB_MAX_HEIGHT: u32 = 1000;

/// Margin added on top of `|min|` when negative targets are shifted back up.
pub const RENORMALIZE_MARGIN: f64 = 5.0;

/// How long shutdown waits for a running job to settle before tearing down anyway.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum number of frames a sequence needs for brightness calculation.
pub const MIN_FRAME_COUNT: usize = 2;

/// Decodable still-image extensions accepted by LapseStudio projects (lowercase, no dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

/// Raw extensions additionally accepted when an external converter renders the output.
pub const RAW_EXTENSIONS: &[&str] = &[
    "dng", "cr2", "cr3", "nef", "arw", "orf", "raf", "rw2", "pef",
];

/// Brightness values are reported on a 0..100 scale of linear-light luminance.
pub const BRIGHTNESS_SCALE: f64 = 100.0;

/// Default centered moving-average window for `Advanced` calculation.
pub const DEFAULT_ADVANCED_WINDOW: usize = 9;

/// Default Gaussian sigma (in frames) for `AdvancedII` calculation.
pub const DEFAULT_ADVANCED2_SIGMA: f64 = 3.0;

/// Moving-average window used by the `Exif` and `Lab` calculation modes.
pub const METRIC_SMOOTHING_WINDOW: usize = 5;

/// Default JPEG quality for processed output.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Minimum pixel count (w*h) to measure brightness with row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Number of levels in an 8-bit channel.
pub const LEVELS_8BIT: usize = 256;

/// CIE L* constants: (6/29)^3 and (29/6)^2 / 3.
pub const LAB_EPSILON: f64 = 216.0 / 24389.0;
pub const LAB_KAPPA: f64 = 24389.0 / 27.0;

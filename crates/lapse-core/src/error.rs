use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LapseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),

    #[error("A job is already running")]
    Busy,

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    /// The request is not valid in the current project state. When
    /// `can_proceed` is set, the caller may confirm and retry with force.
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String, can_proceed: bool },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Frames have already been added to this project")]
    FramesAlreadyAdded,

    #[error("Not enough frames: need at least {required}, found {found}")]
    NotEnoughFrames { required: usize, found: usize },

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Invalid project file: {0}")]
    ProjectFormat(String),

    #[error("Invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl LapseError {
    pub fn invalid_state(reason: impl Into<String>, can_proceed: bool) -> Self {
        Self::InvalidState {
            reason: reason.into(),
            can_proceed,
        }
    }
}

pub type Result<T> = std::result::Result<T, LapseError>;

//! Terminal collaborators for the session driver.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use console::Style;
use lapse_core::session::{
    FileFilter, MessageContent, Notifier, PathMode, PathSelector, Translator, UserResponse,
};
use tracing::debug;

/// English message texts keyed like [`MessageContent::key`].
#[derive(Clone, Copy, Default)]
pub struct EnglishText;

impl Translator for EnglishText {
    fn translate(&self, key: &str) -> String {
        let text = match key {
            "IsBusy" => "Another job is still running.",
            "BusyClose" => "A job is still running. Stop it and quit?",
            "SaveQuestion" => "The project has unsaved changes. Save them?",
            "ProjectSaved" => "Project saved.",
            "FramesAlreadyAdded" => "Frames have already been added to this project.",
            "NotEnoughValidFiles" => "The folder needs at least two supported images.",
            "NotEnoughFrames" => "At least two frames are needed to calculate brightness.",
            "BrightnessAlreadyCalculated" => "Brightness is already calculated. Calculate again?",
            "BrightnessNotCalculatedError" => "Calculate the brightness before processing.",
            "BrightnessNotCalculatedWarning" => {
                "Brightness has not been calculated. Process anyway?"
            }
            "KeyframeCountLow" => "Set at least one keyframe before processing.",
            "KeyframeAdded" => "Keyframe added.",
            "KeyframeNotAdded" => "Keyframe could not be added.",
            "NewProject" => "New project",
            other => other,
        };
        text.to_string()
    }
}

/// Prints messages and answers questions from a fixed policy.
pub struct ConsoleNotifier {
    assume_yes: bool,
    text: EnglishText,
    info: Style,
    warning: Style,
    error: Style,
}

impl ConsoleNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            text: EnglishText,
            info: Style::new().cyan(),
            warning: Style::new().yellow().bold(),
            error: Style::new().red().bold(),
        }
    }

    fn is_question(content: MessageContent) -> bool {
        matches!(
            content,
            MessageContent::BusyClose
                | MessageContent::SaveQuestion
                | MessageContent::BrightnessAlreadyCalculated
                | MessageContent::BrightnessNotCalculatedWarning
        )
    }
}

impl Notifier for ConsoleNotifier {
    fn show_message(&self, content: MessageContent) -> UserResponse {
        let text = self.text.translate(content.key());
        if Self::is_question(content) {
            let response = if self.assume_yes {
                UserResponse::Yes
            } else {
                UserResponse::No
            };
            eprintln!("{} {:?}", self.warning.apply_to(text), response);
            response
        } else {
            eprintln!("{}", self.info.apply_to(text));
            UserResponse::Ok
        }
    }

    fn report_error(&self, context: &str, error: &dyn std::error::Error) {
        eprintln!("{} {}", self.error.apply_to(format!("{context}:")), error);
    }
}

/// Hands out the paths given on the command line, in order.
pub struct ArgPaths {
    paths: VecDeque<PathBuf>,
}

impl ArgPaths {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }
}

impl PathSelector for ArgPaths {
    fn select_path(
        &mut self,
        mode: PathMode,
        _initial_dir: Option<&Path>,
        _filters: &[FileFilter],
    ) -> Option<PathBuf> {
        let path = self.paths.pop_front();
        debug!(?mode, ?path, "Path selected");
        path
    }
}

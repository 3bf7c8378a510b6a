//! Driver that turns user commands into project calls.
//!
//! Presentation stays outside: dialogs go through [`PathSelector`], questions
//! and errors through [`Notifier`], labels through [`Translator`].

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use thiserror::Error;
use tracing::warn;

use crate::brightness::CalculationMode;
use crate::config::LapseConfig;
use crate::consts::{MIN_FRAME_COUNT, SETTLE_TIMEOUT};
use crate::engine::{JobStatus, ProjectEvent};
use crate::error::{LapseError, Result};
use crate::io::project_file::{ProjectFile, PROJECT_EXTENSION};
use crate::project::{Project, ProjectKind};

/// Canned messages the driver can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageContent {
    IsBusy,
    BusyClose,
    SaveQuestion,
    ProjectSaved,
    FramesAlreadyAdded,
    NotEnoughValidFiles,
    NotEnoughFrames,
    BrightnessAlreadyCalculated,
    BrightnessNotCalculatedError,
    BrightnessNotCalculatedWarning,
    KeyframeCountLow,
    KeyframeAdded,
    KeyframeNotAdded,
}

impl MessageContent {
    /// Translation key of the message text.
    pub fn key(&self) -> &'static str {
        match self {
            Self::IsBusy => "IsBusy",
            Self::BusyClose => "BusyClose",
            Self::SaveQuestion => "SaveQuestion",
            Self::ProjectSaved => "ProjectSaved",
            Self::FramesAlreadyAdded => "FramesAlreadyAdded",
            Self::NotEnoughValidFiles => "NotEnoughValidFiles",
            Self::NotEnoughFrames => "NotEnoughFrames",
            Self::BrightnessAlreadyCalculated => "BrightnessAlreadyCalculated",
            Self::BrightnessNotCalculatedError => "BrightnessNotCalculatedError",
            Self::BrightnessNotCalculatedWarning => "BrightnessNotCalculatedWarning",
            Self::KeyframeCountLow => "KeyframeCountLow",
            Self::KeyframeAdded => "KeyframeAdded",
            Self::KeyframeNotAdded => "KeyframeNotAdded",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserResponse {
    Ok,
    Yes,
    No,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathMode {
    OpenFile,
    SaveFile,
    SelectFolder,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

pub trait PathSelector {
    fn select_path(
        &mut self,
        mode: PathMode,
        initial_dir: Option<&Path>,
        filters: &[FileFilter],
    ) -> Option<PathBuf>;
}

pub trait Notifier {
    fn show_message(&self, content: MessageContent) -> UserResponse;
    fn report_error(&self, context: &str, error: &dyn std::error::Error);
}

pub trait Translator {
    fn translate(&self, key: &str) -> String;
}

/// Translator that shows the keys themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyTranslator;

impl Translator for KeyTranslator {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClosingReason {
    User,
    Error,
}

/// A job that ended in a fault, as reported to the notifier.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct JobFault(pub String);

const APP_TITLE: &str = "LapseStudio";

pub struct Session<N: Notifier, S: PathSelector> {
    project: Project,
    events: mpsc::Receiver<ProjectEvent>,
    notifier: N,
    selector: S,
    translator: Box<dyn Translator>,
    config: LapseConfig,
    project_path: Option<PathBuf>,
    saved: bool,
}

impl<N: Notifier, S: PathSelector> Session<N, S> {
    pub fn new(kind: ProjectKind, config: LapseConfig, notifier: N, selector: S) -> Self {
        let project = Project::new(kind, config.clone());
        let events = project.subscribe();
        Self {
            project,
            events,
            notifier,
            selector,
            translator: Box::new(KeyTranslator),
            config,
            project_path: None,
            saved: true,
        }
    }

    pub fn with_translator(mut self, translator: Box<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &LapseConfig {
        &self.config
    }

    pub fn events(&self) -> &mpsc::Receiver<ProjectEvent> {
        &self.events
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Drain pending project events, reporting faulted jobs to the notifier.
    pub fn pump_events(&self) -> Vec<ProjectEvent> {
        let events: Vec<ProjectEvent> = self.events.try_iter().collect();
        for event in &events {
            if let ProjectEvent::WorkDone {
                topic,
                status: JobStatus::Faulted(message),
            } = event
            {
                self.notifier
                    .report_error(&topic.to_string(), &JobFault(message.clone()));
            }
        }
        events
    }

    /// Window title: application, project name, and a star when unsaved.
    pub fn title(&self) -> String {
        let name = match &self.project_path {
            Some(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            None => self.translator.translate("NewProject"),
        };
        let star = if self.saved { "" } else { "*" };
        format!("{APP_TITLE} - {name}{star}")
    }

    /// Shows `IsBusy` and returns `true` while a job runs.
    pub fn check_busy(&self) -> bool {
        if self.project.is_working() {
            self.notifier.show_message(MessageContent::IsBusy);
            return true;
        }
        false
    }

    fn replace_project(&mut self, project: Project, events: mpsc::Receiver<ProjectEvent>) {
        self.project = project;
        self.events = events;
    }

    fn report(&self, context: &str, error: &LapseError) {
        self.notifier.report_error(context, error);
    }

    /// Offer to save unsaved work. `Ok` means go ahead, `Cancel` means abort.
    pub fn ask_for_saving(&mut self) -> UserResponse {
        if self.saved {
            return UserResponse::Ok;
        }
        match self.notifier.show_message(MessageContent::SaveQuestion) {
            UserResponse::Yes => {
                self.save_project(false);
                UserResponse::Ok
            }
            UserResponse::No => UserResponse::Ok,
            _ => UserResponse::Cancel,
        }
    }

    pub fn new_project(&mut self, kind: ProjectKind) -> UserResponse {
        if self.check_busy() {
            return UserResponse::Cancel;
        }
        let response = self.ask_for_saving();
        if response == UserResponse::Ok {
            let project = Project::new(kind, self.config.clone());
            let events = project.subscribe();
            self.replace_project(project, events);
            self.project_path = None;
            self.saved = true;
        }
        response
    }

    /// Ask for a folder and load its images as the frame sequence.
    ///
    /// Returns `true` when the `LoadFrames` job started.
    pub fn add_frames(&mut self) -> bool {
        if self.check_busy() {
            return false;
        }
        if self.project.frame_count() > 0 {
            self.notifier.show_message(MessageContent::FramesAlreadyAdded);
            return false;
        }
        let initial = self.config.settings.last_image_dir.clone();
        let Some(dir) = self
            .selector
            .select_path(PathMode::SelectFolder, initial.as_deref(), &[])
        else {
            return false;
        };
        self.config.settings.last_image_dir = Some(dir.clone());
        match self.project.add_frames_from_dir(&dir) {
            Ok(_) => {
                self.saved = false;
                true
            }
            Err(LapseError::NotEnoughFrames { .. }) => {
                self.notifier.show_message(MessageContent::NotEnoughValidFiles);
                false
            }
            Err(e) => {
                self.report("Add frames", &e);
                false
            }
        }
    }

    /// Returns `true` when the `CalculateBrightness` job started.
    pub fn calculate(&mut self, mode: CalculationMode) -> bool {
        if self.check_busy() {
            return false;
        }
        if self.project.is_brightness_calculated()
            && self
                .notifier
                .show_message(MessageContent::BrightnessAlreadyCalculated)
                == UserResponse::No
        {
            return false;
        }
        if self.project.frame_count() < MIN_FRAME_COUNT {
            self.notifier.show_message(MessageContent::NotEnoughFrames);
            return false;
        }
        match self.project.calculate_brightness(mode) {
            Ok(()) => {
                self.saved = false;
                true
            }
            Err(e) => {
                self.report("Calculate brightness", &e);
                false
            }
        }
    }

    /// Check the processing preconditions, ask for the output folder and start.
    ///
    /// Returns `true` when the `ProcessFiles` job started.
    pub fn process(&mut self) -> bool {
        if self.check_busy() {
            return false;
        }
        if self.project.keyframe_count() == 0 {
            self.notifier.show_message(MessageContent::KeyframeCountLow);
            return false;
        }
        if self.project.is_brightness_calculated() {
            self.start_processing(false)
        } else if self.project.kind().requires_calculation() {
            self.notifier
                .show_message(MessageContent::BrightnessNotCalculatedError);
            false
        } else if self
            .notifier
            .show_message(MessageContent::BrightnessNotCalculatedWarning)
            == UserResponse::Yes
        {
            self.start_processing(true)
        } else {
            false
        }
    }

    fn start_processing(&mut self, confirmed: bool) -> bool {
        let initial = self.config.settings.last_process_dir.clone();
        let Some(dir) = self
            .selector
            .select_path(PathMode::SelectFolder, initial.as_deref(), &[])
        else {
            return false;
        };
        self.config.settings.last_process_dir = Some(dir.clone());
        let started = if confirmed {
            self.project.process_files_confirmed(dir)
        } else {
            self.project.process_files(dir)
        };
        match started {
            Ok(()) => true,
            Err(e) => {
                self.report("Process files", &e);
                false
            }
        }
    }

    pub fn toggle_keyframe(&mut self, row: usize) {
        match self.project.toggle_keyframe(row) {
            Ok(true) => {
                self.saved = false;
                self.notifier.show_message(MessageContent::KeyframeAdded);
            }
            Ok(false) => self.saved = false,
            Err(LapseError::Busy) => {
                self.notifier.show_message(MessageContent::IsBusy);
            }
            Err(e) => {
                self.notifier.show_message(MessageContent::KeyframeNotAdded);
                self.report("Toggle keyframe", &e);
            }
        }
    }

    /// Apply a brightness typed into the table. Unparsable text is ignored.
    pub fn update_brightness(&mut self, row: usize, text: &str) {
        let value = match text.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => return,
        };
        match self.project.set_alternative_brightness(row, value) {
            Ok(()) => self.saved = false,
            Err(LapseError::Busy) => {
                self.notifier.show_message(MessageContent::IsBusy);
            }
            Err(e) => self.report("Update brightness", &e),
        }
    }

    fn project_filter() -> FileFilter {
        FileFilter {
            name: "LapseStudio Project".into(),
            extensions: vec![PROJECT_EXTENSION.into()],
        }
    }

    pub fn save_project(&mut self, always_ask: bool) {
        if self.check_busy() {
            return;
        }
        let path = match &self.project_path {
            Some(path) if path.exists() && !always_ask => path.clone(),
            _ => {
                let initial = self.config.settings.last_project_dir.clone();
                let Some(mut path) = self.selector.select_path(
                    PathMode::SaveFile,
                    initial.as_deref(),
                    &[Self::project_filter()],
                ) else {
                    return;
                };
                if path.extension().and_then(|e| e.to_str()) != Some(PROJECT_EXTENSION) {
                    path.set_extension(PROJECT_EXTENSION);
                }
                self.config.settings.last_project_dir = path.parent().map(Path::to_path_buf);
                path
            }
        };
        match self.project.save_to(&path) {
            Ok(()) => {
                self.project_path = Some(path);
                self.saved = true;
                self.notifier.show_message(MessageContent::ProjectSaved);
            }
            Err(e) => self.report("Save project", &e),
        }
    }

    /// Returns `true` when the `LoadProject` job started.
    pub fn open_project(&mut self) -> bool {
        if self.check_busy() {
            return false;
        }
        let initial = self.config.settings.last_project_dir.clone();
        let Some(path) = self.selector.select_path(
            PathMode::OpenFile,
            initial.as_deref(),
            &[Self::project_filter()],
        ) else {
            return false;
        };
        self.config.settings.last_project_dir = path.parent().map(Path::to_path_buf);
        let opened = std::fs::read(&path)
            .map_err(LapseError::from)
            .and_then(|bytes| ProjectFile::from_bytes(&bytes))
            .and_then(|file| Project::open(file, self.config.clone()));
        match opened {
            Ok((project, events)) => {
                self.replace_project(project, events);
                self.project_path = Some(path);
                self.saved = true;
                true
            }
            Err(e) => {
                self.report("Open project", &e);
                false
            }
        }
    }

    /// Returns `true` when quitting should be aborted.
    ///
    /// A running job is cancelled and given up to [`SETTLE_TIMEOUT`] to stop.
    pub fn quit(&mut self, reason: ClosingReason) -> bool {
        match reason {
            ClosingReason::User => {
                if self.project.is_working() {
                    match self.notifier.show_message(MessageContent::BusyClose) {
                        UserResponse::No => return true,
                        UserResponse::Yes => self.project.cancel(),
                        _ => {}
                    }
                }
                if self.ask_for_saving() == UserResponse::Cancel {
                    return true;
                }
            }
            ClosingReason::Error => self.project.cancel(),
        }
        if self.project.is_working() && !self.project.wait_settled(SETTLE_TIMEOUT) {
            warn!("Job did not settle before shutdown");
        }
        false
    }

    /// Finish and return the configuration with the remembered directories.
    pub fn into_config(self) -> LapseConfig {
        self.config
    }

    pub fn save_config(&self, path: &Path) -> Result<()> {
        self.config.save(path)
    }
}

//! A frame sequence and the background jobs that analyse and render it.

mod jobs;
mod kind;

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use crate::brightness::{check_finite, propagate_edit, renormalize, CalculationMode};
use crate::config::LapseConfig;
use crate::consts::MIN_FRAME_COUNT;
use crate::engine::{EventBus, JobKind, ProjectEvent, WorkEngine};
use crate::error::{LapseError, Result};
use crate::frame::Frame;
use crate::io::image_io::list_frame_files;
use crate::io::metadata::{MetadataSource, NoMetadata};
use crate::io::project_file::{FrameRecord, ProjectFile, PROJECT_FILE_VERSION};

pub use kind::{ExternalConverterSettings, LapseStudioSettings, ProjectKind};

/// Mutable project data shared with the running job.
#[derive(Debug, Default)]
pub struct ProjectState {
    pub frames: Vec<Frame>,
    pub is_brightness_calculated: bool,
    pub calculation_mode: Option<CalculationMode>,
    /// Directory of the last completed file processing run.
    pub processed_dir: Option<PathBuf>,
}

/// One display row of the frame table.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRow {
    /// 1-based position in the sequence.
    pub number: usize,
    pub filename: String,
    pub brightness: String,
    pub aperture: String,
    pub shutter: String,
    pub iso: String,
    pub is_keyframe: bool,
}

impl FrameRow {
    fn new(index: usize, frame: &Frame) -> Self {
        Self {
            number: index + 1,
            filename: frame.filename(),
            brightness: format!("{:.3}", frame.alternative_brightness),
            aperture: frame.metadata.aperture_display().to_string(),
            shutter: frame.metadata.shutter_display().to_string(),
            iso: frame.metadata.iso_display().to_string(),
            is_keyframe: frame.is_keyframe,
        }
    }
}

pub(crate) type SharedState = Arc<Mutex<ProjectState>>;

pub(crate) fn lock_state(state: &Mutex<ProjectState>) -> MutexGuard<'_, ProjectState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Project {
    kind: ProjectKind,
    config: LapseConfig,
    state: SharedState,
    bus: EventBus,
    engine: WorkEngine,
    metadata: Arc<dyn MetadataSource>,
}

impl Project {
    pub fn new(kind: ProjectKind, config: LapseConfig) -> Self {
        let bus = EventBus::new();
        Self {
            kind,
            config,
            state: Arc::new(Mutex::new(ProjectState::default())),
            engine: WorkEngine::new(bus.clone()),
            bus,
            metadata: Arc::new(NoMetadata),
        }
    }

    pub fn with_metadata_source(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.metadata = source;
        self
    }

    /// Build a project from saved state and start rebuilding its thumbnails.
    ///
    /// Subscribe before calling this to observe the `LoadProject` job; the
    /// returned receiver is already registered.
    pub fn open(
        file: ProjectFile,
        config: LapseConfig,
    ) -> Result<(Self, mpsc::Receiver<ProjectEvent>)> {
        let project = Self::new(file.kind.clone(), config);
        let events = project.subscribe();
        let state = Arc::clone(&project.state);
        let space = project.config.color_space;
        project
            .engine
            .submit(JobKind::LoadProject, move |ctx| jobs::load_project(ctx, &state, file, space))?;
        Ok((project, events))
    }

    /// Receive every event this project publishes. Drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> mpsc::Receiver<ProjectEvent> {
        self.bus.subscribe()
    }

    pub fn kind(&self) -> &ProjectKind {
        &self.kind
    }

    pub fn config(&self) -> &LapseConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, ProjectState> {
        lock_state(&self.state)
    }

    fn check_busy(&self) -> Result<()> {
        if self.engine.is_working() {
            return Err(LapseError::Busy);
        }
        Ok(())
    }

    // ----- queries -----

    pub fn frame_count(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn keyframe_count(&self) -> usize {
        self.lock().frames.iter().filter(|f| f.is_keyframe).count()
    }

    pub fn is_brightness_calculated(&self) -> bool {
        self.lock().is_brightness_calculated
    }

    pub fn is_working(&self) -> bool {
        self.engine.is_working()
    }

    pub fn calculation_mode(&self) -> Option<CalculationMode> {
        self.lock().calculation_mode
    }

    pub fn processed_dir(&self) -> Option<PathBuf> {
        self.lock().processed_dir.clone()
    }

    /// Run `f` with read access to the frames.
    pub fn with_frames<R>(&self, f: impl FnOnce(&[Frame]) -> R) -> R {
        f(&self.lock().frames)
    }

    pub fn frame(&self, index: usize) -> Option<Frame> {
        self.lock().frames.get(index).cloned()
    }

    /// `(original, alternative)` brightness of every frame.
    pub fn brightness_values(&self) -> Vec<(f64, f64)> {
        self.with_frames(|frames| {
            frames
                .iter()
                .map(|f| (f.original_brightness, f.alternative_brightness))
                .collect()
        })
    }

    pub fn alternative_brightness(&self) -> Vec<f64> {
        self.with_frames(|frames| frames.iter().map(|f| f.alternative_brightness).collect())
    }

    pub fn exposures(&self) -> Vec<f64> {
        self.with_frames(|frames| frames.iter().map(Frame::exposure).collect())
    }

    pub fn frame_rows(&self) -> Vec<FrameRow> {
        self.with_frames(|frames| {
            frames
                .iter()
                .enumerate()
                .map(|(i, f)| FrameRow::new(i, f))
                .collect()
        })
    }

    // ----- foreground edits -----

    /// Set frame `index`'s target; later frames shift by the same amount,
    /// then all targets are lifted once if any went negative.
    pub fn set_alternative_brightness(&self, index: usize, value: f64) -> Result<()> {
        self.check_busy()?;
        let mut state = self.lock();
        let mut values: Vec<f64> = state.frames.iter().map(|f| f.alternative_brightness).collect();
        let delta = propagate_edit(&mut values, index, value)?;
        let shift = renormalize(&mut values);
        for (frame, v) in state.frames.iter_mut().zip(values) {
            frame.set_alternative_brightness(v);
        }
        debug!(index, value, delta, shift, "Edited target brightness");
        Ok(())
    }

    /// Replace every target at once, e.g. from an edited graph.
    pub fn set_alternative_curve(&self, values: &[f64]) -> Result<()> {
        self.check_busy()?;
        let mut state = self.lock();
        if values.len() != state.frames.len() {
            return Err(LapseError::invalid_state(
                format!("expected {} values, got {}", state.frames.len(), values.len()),
                false,
            ));
        }
        check_finite(values)?;
        let mut values = values.to_vec();
        renormalize(&mut values);
        for (frame, v) in state.frames.iter_mut().zip(values) {
            frame.set_alternative_brightness(v);
        }
        Ok(())
    }

    /// Flip the keyframe flag of frame `index`, returning the new flag.
    pub fn toggle_keyframe(&self, index: usize) -> Result<bool> {
        self.check_busy()?;
        let mut state = self.lock();
        let total = state.frames.len();
        let frame = state
            .frames
            .get_mut(index)
            .ok_or(LapseError::FrameIndexOutOfRange { index, total })?;
        frame.is_keyframe = !frame.is_keyframe;
        Ok(frame.is_keyframe)
    }

    // ----- jobs -----

    /// Load `paths` as the frame sequence, in the given order.
    pub fn add_frames(&self, paths: Vec<PathBuf>) -> Result<()> {
        self.check_busy()?;
        if self.frame_count() > 0 {
            return Err(LapseError::FramesAlreadyAdded);
        }
        if paths.len() < MIN_FRAME_COUNT {
            return Err(LapseError::NotEnoughFrames {
                required: MIN_FRAME_COUNT,
                found: paths.len(),
            });
        }
        info!(count = paths.len(), kind = self.kind.name(), "Adding frames");
        let state = Arc::clone(&self.state);
        let metadata = Arc::clone(&self.metadata);
        let kind = self.kind.clone();
        let space = self.config.color_space;
        self.engine.submit(JobKind::LoadFrames, move |ctx| {
            jobs::load_frames(ctx, &state, &paths, &kind, space, metadata.as_ref())
        })
    }

    /// Load every file of `dir` with an allowed extension, sorted by name.
    /// Returns the number of files found.
    pub fn add_frames_from_dir(&self, dir: &Path) -> Result<usize> {
        self.check_busy()?;
        if self.frame_count() > 0 {
            return Err(LapseError::FramesAlreadyAdded);
        }
        let files = list_frame_files(dir, &self.kind.allowed_extensions())?;
        let count = files.len();
        self.add_frames(files)?;
        Ok(count)
    }

    pub fn calculate_brightness(&self, mode: CalculationMode) -> Result<()> {
        self.check_busy()?;
        let found = self.frame_count();
        if found < MIN_FRAME_COUNT {
            return Err(LapseError::NotEnoughFrames {
                required: MIN_FRAME_COUNT,
                found,
            });
        }
        info!(%mode, frames = found, "Calculating brightness");
        let state = Arc::clone(&self.state);
        let params = self.config.calculation.clone();
        let space = self.config.color_space;
        self.engine.submit(JobKind::CalculateBrightness, move |ctx| {
            jobs::calculate_brightness(ctx, &state, mode, &params, space)
        })
    }

    /// Re-render the edited previews with the current exposures.
    pub fn process_thumbs(&self) -> Result<()> {
        self.check_busy()?;
        let state = Arc::clone(&self.state);
        self.engine
            .submit(JobKind::ProcessThumbs, move |ctx| jobs::process_thumbs(ctx, &state))
    }

    pub fn read_metadata(&self) -> Result<()> {
        self.check_busy()?;
        let state = Arc::clone(&self.state);
        let metadata = Arc::clone(&self.metadata);
        self.engine.submit(JobKind::ReadMetadata, move |ctx| {
            jobs::read_metadata(ctx, &state, metadata.as_ref())
        })
    }

    /// Render every frame into `out_dir`.
    ///
    /// Fails with `InvalidState` when no keyframe is set or the brightness
    /// has not been calculated. For external-converter projects the latter
    /// carries `can_proceed`; confirm with [`Project::process_files_confirmed`].
    pub fn process_files(&self, out_dir: impl Into<PathBuf>) -> Result<()> {
        self.start_processing(out_dir.into(), false)
    }

    /// Like [`Project::process_files`], proceeding past checks the user confirmed.
    pub fn process_files_confirmed(&self, out_dir: impl Into<PathBuf>) -> Result<()> {
        self.start_processing(out_dir.into(), true)
    }

    fn start_processing(&self, out_dir: PathBuf, confirmed: bool) -> Result<()> {
        self.check_busy()?;
        if self.frame_count() == 0 {
            return Err(LapseError::EmptySequence);
        }
        if self.keyframe_count() == 0 {
            return Err(LapseError::invalid_state("at least one keyframe is required", false));
        }
        if !self.is_brightness_calculated() {
            let can_proceed = !self.kind.requires_calculation();
            if !(can_proceed && confirmed) {
                return Err(LapseError::invalid_state(
                    "brightness has not been calculated",
                    can_proceed,
                ));
            }
        }
        info!(out = %out_dir.display(), kind = self.kind.name(), "Processing files");
        let state = Arc::clone(&self.state);
        let kind = self.kind.clone();
        let config = self.config.clone();
        self.engine.submit(JobKind::ProcessFiles, move |ctx| {
            jobs::process_files(ctx, &state, &out_dir, &kind, &config)
        })
    }

    /// Ask the running job to stop. Does not block.
    pub fn cancel(&self) {
        self.engine.request_cancel();
    }

    /// Wait up to `timeout` for the running job to finish; `true` when idle.
    pub fn wait_settled(&self, timeout: Duration) -> bool {
        self.engine.wait_settled(timeout)
    }

    // ----- persistence -----

    /// Snapshot of the persisted project state.
    pub fn to_file(&self) -> Result<ProjectFile> {
        self.check_busy()?;
        let state = self.lock();
        Ok(ProjectFile {
            version: PROJECT_FILE_VERSION,
            is_brightness_calculated: state.is_brightness_calculated,
            calculation_mode: state.calculation_mode,
            kind: self.kind.clone(),
            frames: state.frames.iter().map(FrameRecord::from).collect(),
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_file()?.to_bytes()?;
        std::fs::write(path, bytes)?;
        info!(path = %path.display(), "Project saved");
        Ok(())
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        self.engine.request_cancel();
    }
}

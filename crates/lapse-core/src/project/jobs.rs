//! Bodies of the background jobs.
//!
//! Every job snapshots what it needs, works without holding the state lock,
//! and commits in one short critical section only when it ran to the end.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use image::DynamicImage;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::brightness::measure::{exif_light, fill_gaps, mean_lab_luminance, mean_luminance};
use crate::brightness::{calculate_curve, CalculationMode, CurveParams};
use crate::color::{ColorSpace, ExposureLut};
use crate::config::LapseConfig;
use crate::consts::RAW_EXTENSIONS;
use crate::engine::{Completion, JobContext, ProjectEvent};
use crate::error::{LapseError, Result};
use crate::frame::Frame;
use crate::io::image_io::{has_extension, load_source, make_thumbnail};
use crate::io::metadata::{FrameMetadata, MetadataSource};
use crate::io::project_file::ProjectFile;
use crate::process::{process_with_lut, write_exposure_sidecar, write_output, ProcessOutcome};

use super::{lock_state, ProjectKind, SharedState};

/// Decode `path` into a fully analysed frame.
fn load_frame(
    path: &Path,
    kind: &ProjectKind,
    space: ColorSpace,
    metadata: FrameMetadata,
) -> Result<Frame> {
    let mut frame = Frame::new(path);
    frame.color_space = space;
    frame.metadata = metadata;

    let source = match load_source(path) {
        Ok(source) => source,
        Err(e)
            if matches!(kind, ProjectKind::ExternalConverter(_))
                && has_extension(path, RAW_EXTENSIONS) =>
        {
            // Raw files are rendered by the converter; without a preview the
            // frame keeps a zero reference brightness.
            warn!(path = %path.display(), error = %e, "No preview for raw frame");
            return Ok(frame);
        }
        Err(e) => return Err(e),
    };

    frame.width = source.width();
    frame.height = source.height();
    let thumb = make_thumbnail(&source);
    let brightness = mean_luminance(&thumb, space);
    frame.original_brightness = brightness;
    frame.alternative_brightness = brightness;
    frame.set_thumb(thumb);
    Ok(frame)
}

pub(super) fn load_frames(
    ctx: &JobContext,
    state: &SharedState,
    paths: &[PathBuf],
    kind: &ProjectKind,
    space: ColorSpace,
    metadata: &dyn MetadataSource,
) -> Result<Completion> {
    let total = paths.len();
    let mut frames = Vec::with_capacity(total);
    ctx.progress().report(0);

    for (i, path) in paths.iter().enumerate() {
        if ctx.is_cancelled() {
            return Ok(Completion::Cancelled);
        }
        let meta = metadata.read(path)?;
        let frame = load_frame(path, kind, space, meta)?;
        debug!(
            index = i,
            path = %path.display(),
            brightness = frame.original_brightness,
            "Frame loaded"
        );
        frames.push(frame);
        ctx.progress().items(i + 1, total);
    }

    {
        let mut state = lock_state(state);
        state.frames = frames;
        state.is_brightness_calculated = false;
        state.calculation_mode = None;
        state.processed_dir = None;
    }
    info!(frames = total, "Frames loaded");
    ctx.publish(ProjectEvent::FramesLoaded { count: total });
    Ok(Completion::Finished)
}

pub(super) fn load_project(
    ctx: &JobContext,
    state: &SharedState,
    file: ProjectFile,
    space: ColorSpace,
) -> Result<Completion> {
    let total = file.frames.len();
    let mut frames = Vec::with_capacity(total);
    ctx.progress().report(0);

    for (i, record) in file.frames.into_iter().enumerate() {
        if ctx.is_cancelled() {
            return Ok(Completion::Cancelled);
        }
        let mut frame = record.into_frame(space);
        match load_source(frame.file_path()) {
            Ok(source) => frame.set_thumb(make_thumbnail(&source)),
            Err(e) => warn!(
                path = %frame.file_path().display(),
                error = %e,
                "Frame preview unavailable"
            ),
        }
        frames.push(frame);
        ctx.progress().items(i + 1, total);
    }

    {
        let mut state = lock_state(state);
        state.frames = frames;
        state.is_brightness_calculated = file.is_brightness_calculated;
        state.calculation_mode = file.calculation_mode;
        state.processed_dir = None;
    }
    ctx.publish(ProjectEvent::FramesLoaded { count: total });
    Ok(Completion::Finished)
}

pub(super) fn read_metadata(
    ctx: &JobContext,
    state: &SharedState,
    source: &dyn MetadataSource,
) -> Result<Completion> {
    let paths: Vec<PathBuf> = lock_state(state)
        .frames
        .iter()
        .map(|f| f.file_path().to_path_buf())
        .collect();
    let total = paths.len();
    let mut read = Vec::with_capacity(total);

    for (i, path) in paths.iter().enumerate() {
        if ctx.is_cancelled() {
            return Ok(Completion::Cancelled);
        }
        read.push(source.read(path)?);
        ctx.progress().items(i + 1, total);
    }

    let mut state = lock_state(state);
    for (frame, meta) in state.frames.iter_mut().zip(read) {
        frame.metadata = meta;
    }
    Ok(Completion::Finished)
}

/// Inputs of one frame for the brightness calculation.
struct CalcInput {
    original: f64,
    anchor: Option<f64>,
    path: PathBuf,
    thumb: Option<DynamicImage>,
    metadata: FrameMetadata,
}

/// The mode's measurement of one frame, `None` when it is unknown.
fn measure(mode: CalculationMode, input: &CalcInput, space: ColorSpace) -> Option<f64> {
    match mode {
        CalculationMode::Simple | CalculationMode::Advanced | CalculationMode::AdvancedII => {
            Some(input.original)
        }
        CalculationMode::Exif => exif_light(&input.metadata),
        CalculationMode::Lab => match &input.thumb {
            Some(thumb) => Some(mean_lab_luminance(thumb, space)),
            None => match load_source(&input.path) {
                Ok(source) => Some(mean_lab_luminance(&make_thumbnail(&source), space)),
                Err(e) => {
                    warn!(path = %input.path.display(), error = %e, "Lab measurement unavailable");
                    Some(input.original)
                }
            },
        },
    }
}

pub(super) fn calculate_brightness(
    ctx: &JobContext,
    state: &SharedState,
    mode: CalculationMode,
    params: &CurveParams,
    space: ColorSpace,
) -> Result<Completion> {
    let inputs: Vec<CalcInput> = lock_state(state)
        .frames
        .iter()
        .map(|f| CalcInput {
            original: f.original_brightness,
            anchor: f.is_keyframe.then_some(f.alternative_brightness),
            path: f.file_path().to_path_buf(),
            thumb: (mode == CalculationMode::Lab).then(|| f.thumb.clone()).flatten(),
            metadata: f.metadata.clone(),
        })
        .collect();
    let total = inputs.len();
    ctx.progress().report(0);

    let mut measurements = Vec::with_capacity(total);
    for (i, input) in inputs.iter().enumerate() {
        if ctx.is_cancelled() {
            return Ok(Completion::Cancelled);
        }
        measurements.push(measure(mode, input, space));
        ctx.progress().items(i + 1, total);
    }

    let originals: Vec<f64> = inputs.iter().map(|i| i.original).collect();
    let missing = measurements.iter().filter(|m| m.is_none()).count();
    if missing > 0 {
        warn!(%mode, missing, frames = total, "Filling unknown measurements from neighbours");
    }
    let measurements = fill_gaps(&measurements).unwrap_or_else(|| originals.clone());
    let anchors: Vec<Option<f64>> = inputs.iter().map(|i| i.anchor).collect();
    let targets = calculate_curve(mode, &originals, &measurements, &anchors, params);

    {
        let mut state = lock_state(state);
        if state.frames.len() != targets.len() {
            return Err(LapseError::invalid_state(
                "frame sequence changed during calculation",
                false,
            ));
        }
        for (frame, target) in state.frames.iter_mut().zip(targets) {
            frame.set_alternative_brightness(target);
        }
        state.is_brightness_calculated = true;
        state.calculation_mode = Some(mode);
    }
    info!(
        %mode,
        frames = total,
        keyframes = anchors.iter().flatten().count(),
        "Brightness calculated"
    );
    ctx.publish(ProjectEvent::BrightnessCalculated);
    Ok(Completion::Finished)
}

pub(super) fn process_thumbs(ctx: &JobContext, state: &SharedState) -> Result<Completion> {
    let inputs: Vec<(usize, DynamicImage, f64, ColorSpace)> = lock_state(state)
        .frames
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.thumb.clone().map(|t| (i, t, f.exposure(), f.color_space)))
        .collect();
    let total = inputs.len();
    let mut edited = Vec::with_capacity(total);

    for (n, (index, thumb, stops, space)) in inputs.into_iter().enumerate() {
        if ctx.is_cancelled() {
            return Ok(Completion::Cancelled);
        }
        match process_with_lut(&thumb, &ExposureLut::new(stops, space))? {
            ProcessOutcome::Processed(image) => edited.push((index, image)),
            ProcessOutcome::Deferred { .. } => edited.push((index, thumb)),
        }
        ctx.progress().items(n + 1, total);
    }

    let mut state = lock_state(state);
    for (index, image) in edited {
        if let Some(frame) = state.frames.get_mut(index) {
            frame.thumb_edited = Some(image);
        }
    }
    Ok(Completion::Finished)
}

/// One frame of a file processing run.
struct RenderInput {
    path: PathBuf,
    stem: String,
    stops: f64,
    space: ColorSpace,
}

enum Abort {
    Cancelled,
    Failed(LapseError),
}

impl From<LapseError> for Abort {
    fn from(e: LapseError) -> Self {
        Self::Failed(e)
    }
}

fn render_frame(input: &RenderInput, out_dir: &Path, config: &LapseConfig) -> Result<bool> {
    let source = load_source(&input.path)?;
    let lut = ExposureLut::new(input.stops, input.space);
    match process_with_lut(&source, &lut)? {
        ProcessOutcome::Processed(image) => {
            write_output(&image, out_dir, &input.stem, config.save_format, config.jpeg_quality)?;
            Ok(true)
        }
        ProcessOutcome::Deferred { bit_depth, channels } => {
            warn!(
                path = %input.path.display(),
                bit_depth,
                channels,
                "Processing deferred for this bit depth"
            );
            Ok(false)
        }
    }
}

pub(super) fn process_files(
    ctx: &JobContext,
    state: &SharedState,
    out_dir: &Path,
    kind: &ProjectKind,
    config: &LapseConfig,
) -> Result<Completion> {
    let inputs: Vec<RenderInput> = lock_state(state)
        .frames
        .iter()
        .map(|f| RenderInput {
            path: f.file_path().to_path_buf(),
            stem: f.filename(),
            stops: f.exposure(),
            space: f.color_space,
        })
        .collect();
    let total = inputs.len();
    std::fs::create_dir_all(out_dir)?;
    ctx.progress().report(0);

    let written = AtomicUsize::new(0);
    let deferred = AtomicUsize::new(0);
    let done = AtomicUsize::new(0);

    let run = |input: &RenderInput| -> std::result::Result<(), Abort> {
        if ctx.is_cancelled() {
            return Err(Abort::Cancelled);
        }
        let wrote = match kind {
            ProjectKind::LapseStudio(_) => render_frame(input, out_dir, config)?,
            ProjectKind::ExternalConverter(settings) => {
                let extension = &settings.sidecar_extension;
                write_exposure_sidecar(out_dir, &input.stem, extension, input.stops)?;
                true
            }
        };
        if wrote {
            written.fetch_add(1, Ordering::Relaxed);
        } else {
            deferred.fetch_add(1, Ordering::Relaxed);
        }
        let n = done.fetch_add(1, Ordering::AcqRel) + 1;
        ctx.progress().items(n, total);
        Ok(())
    };

    let result = match kind {
        ProjectKind::LapseStudio(_) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.thread_count)
                .thread_name(|i| format!("lapse-render-{i}"))
                .build()
                .map_err(|e| LapseError::Io(std::io::Error::other(e.to_string())))?;
            pool.install(|| inputs.par_iter().try_for_each(run))
        }
        ProjectKind::ExternalConverter(_) => inputs.iter().try_for_each(run),
    };

    match result {
        Ok(()) => {}
        Err(Abort::Cancelled) => return Ok(Completion::Cancelled),
        Err(Abort::Failed(e)) => return Err(e),
    }

    let written = written.into_inner();
    let deferred = deferred.into_inner();
    lock_state(state).processed_dir = Some(out_dir.to_path_buf());
    info!(written, deferred, out = %out_dir.display(), "Files processed");
    ctx.publish(ProjectEvent::FilesProcessed { written, deferred });
    Ok(Completion::Finished)
}

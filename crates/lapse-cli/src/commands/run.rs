use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lapse_core::engine::{JobKind, ProjectEvent};
use lapse_core::project::Project;

use super::{apply_keyframes, KindArg, ModeArg, SettingsArgs};
use crate::progress::run_job;
use crate::summary::{print_calculation, print_output_summary, print_project_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Folder with the image sequence
    pub input: PathBuf,

    /// Output folder
    #[arg(short, long, default_value = "processed")]
    pub output: PathBuf,

    /// Calculation mode
    #[arg(long, value_enum, default_value = "advanced")]
    pub mode: ModeArg,

    /// Comma-separated 0-based keyframe indices (default: first and last)
    #[arg(long, value_delimiter = ',')]
    pub keyframes: Vec<usize>,

    /// Project kind
    #[arg(long, value_enum, default_value = "lapse-studio")]
    pub kind: KindArg,

    /// Also save the project to this file
    #[arg(long)]
    pub save: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = args.settings.load()?;
    let project = Project::new(args.kind.into(), config);
    let events = project.subscribe();

    project
        .add_frames_from_dir(&args.input)
        .with_context(|| format!("Failed to add frames from {}", args.input.display()))?;
    if run_job(&project, &events, JobKind::LoadFrames)?.is_none() {
        return Ok(());
    }

    let keyframes = apply_keyframes(&project, &args.keyframes)?;
    let mode = args.mode.into();
    project.calculate_brightness(mode)?;
    if run_job(&project, &events, JobKind::CalculateBrightness)?.is_none() {
        return Ok(());
    }
    print_project_summary(&project, &args.input);
    print_calculation(mode, &keyframes);

    if let Some(ref path) = args.save {
        project
            .save_to(path)
            .with_context(|| format!("Failed to save project to {}", path.display()))?;
        println!("Project saved to {}", path.display());
    }

    project.process_files(&args.output)?;
    let Some(seen) = run_job(&project, &events, JobKind::ProcessFiles)? else {
        return Ok(());
    };
    let (written, deferred) = seen
        .iter()
        .find_map(|event| match event {
            ProjectEvent::FilesProcessed { written, deferred } => Some((*written, *deferred)),
            _ => None,
        })
        .unwrap_or_default();

    print_output_summary(&args.output, written, deferred);
    Ok(())
}

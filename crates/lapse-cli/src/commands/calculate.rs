use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lapse_core::engine::JobKind;
use lapse_core::project::Project;

use super::{apply_keyframes, KindArg, ModeArg, SettingsArgs};
use crate::progress::run_job;
use crate::summary::{print_calculation, print_frame_table, print_project_summary};

#[derive(Args)]
pub struct CalculateArgs {
    /// Folder with the image sequence
    pub input: PathBuf,

    /// Calculation mode
    #[arg(long, value_enum, default_value = "advanced")]
    pub mode: ModeArg,

    /// Comma-separated 0-based keyframe indices (default: first and last)
    #[arg(long, value_delimiter = ',')]
    pub keyframes: Vec<usize>,

    /// Project kind
    #[arg(long, value_enum, default_value = "lapse-studio")]
    pub kind: KindArg,

    /// Save the calculated project to this file
    #[arg(long)]
    pub save: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

pub fn run(args: &CalculateArgs) -> Result<()> {
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
    print_frame_table(&project.frame_rows(), &project.exposures());

    if let Some(ref path) = args.save {
        project
            .save_to(path)
            .with_context(|| format!("Failed to save project to {}", path.display()))?;
        println!("Project saved to {}", path.display());
    }
    Ok(())
}

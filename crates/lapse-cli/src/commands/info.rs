use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lapse_core::engine::JobKind;
use lapse_core::io::image_io::has_extension;
use lapse_core::io::project_file::{ProjectFile, PROJECT_EXTENSION};
use lapse_core::project::Project;

use super::{KindArg, SettingsArgs};
use crate::progress::run_job;
use crate::summary::{print_frame_table, print_project_summary};

#[derive(Args)]
pub struct InfoArgs {
    /// Image folder or saved project (.lasp)
    pub input: PathBuf,

    /// Project kind used when reading a folder
    #[arg(long, value_enum, default_value = "lapse-studio")]
    pub kind: KindArg,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let config = args.settings.load()?;

    let project = if has_extension(&args.input, &[PROJECT_EXTENSION]) {
        let bytes = std::fs::read(&args.input)
            .with_context(|| format!("Failed to read project {}", args.input.display()))?;
        let file = ProjectFile::from_bytes(&bytes)?;
        let (project, events) = Project::open(file, config)?;
        if run_job(&project, &events, JobKind::LoadProject)?.is_none() {
            return Ok(());
        }
        project
    } else {
        let project = Project::new(args.kind.into(), config);
        let events = project.subscribe();
        project
            .add_frames_from_dir(&args.input)
            .with_context(|| format!("Failed to add frames from {}", args.input.display()))?;
        if run_job(&project, &events, JobKind::LoadFrames)?.is_none() {
            return Ok(());
        }
        project
    };

    print_project_summary(&project, &args.input);
    print_frame_table(&project.frame_rows(), &project.exposures());
    Ok(())
}

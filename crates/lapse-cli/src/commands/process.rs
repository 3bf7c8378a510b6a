use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use lapse_core::engine::{JobKind, ProjectEvent};
use lapse_core::project::ProjectKind;
use lapse_core::session::{ClosingReason, Session};

use super::SettingsArgs;
use crate::notifier::{ArgPaths, ConsoleNotifier, EnglishText};
use crate::progress::run_job;
use crate::summary::{print_output_summary, print_project_summary};

#[derive(Args)]
pub struct ProcessArgs {
    /// Saved project (.lasp)
    pub project: PathBuf,

    /// Output folder
    #[arg(short, long, default_value = "processed")]
    pub output: PathBuf,

    /// Answer yes to confirmations, e.g. processing before calculation
    #[arg(short, long)]
    pub yes: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

pub fn run(args: &ProcessArgs) -> Result<()> {
    let config = args.settings.load()?;
    let paths = ArgPaths::new([args.project.clone(), args.output.clone()]);
    let mut session = Session::new(
        ProjectKind::default(),
        config,
        ConsoleNotifier::new(args.yes),
        paths,
    )
    .with_translator(Box::new(EnglishText));

    if !session.open_project() {
        bail!("Could not open {}", args.project.display());
    }
    if run_job(session.project(), session.events(), JobKind::LoadProject)?.is_none() {
        return Ok(());
    }
    print_project_summary(session.project(), &args.project);

    if !session.process() {
        bail!("Processing did not start");
    }
    let Some(seen) = run_job(session.project(), session.events(), JobKind::ProcessFiles)? else {
        return Ok(());
    };
    let (written, deferred) = seen
        .iter()
        .find_map(|event| match event {
            ProjectEvent::FilesProcessed { written, deferred } => Some((*written, *deferred)),
            _ => None,
        })
        .unwrap_or_default();

    session.quit(ClosingReason::User);
    print_output_summary(&args.output, written, deferred);
    Ok(())
}

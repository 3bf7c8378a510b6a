use std::sync::mpsc::Receiver;

use anyhow::{bail, Result};
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use lapse_core::consts::SETTLE_TIMEOUT;
use lapse_core::engine::{JobKind, JobStatus, ProjectEvent};
use lapse_core::project::Project;
use tracing::{debug, warn};

/// Follow `topic` on a progress bar until its `WorkDone`, then wait for the
/// engine to go idle. Returns the status and the other events seen meanwhile.
pub fn follow_job(
    project: &Project,
    events: &Receiver<ProjectEvent>,
    topic: JobKind,
) -> Result<(JobStatus, Vec<ProjectEvent>)> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}%")?
            .progress_chars("=> "),
    );
    pb.set_message(topic.to_string());

    let mut seen = Vec::new();
    let status = loop {
        match events.recv() {
            Ok(ProjectEvent::ProgressChanged { percent, topic: t }) if t == topic => {
                pb.set_position(u64::from(percent));
            }
            Ok(ProjectEvent::WorkDone { topic: t, status }) if t == topic => break status,
            Ok(event) => {
                debug!(?event, "Project event");
                seen.push(event);
            }
            Err(_) => bail!("Event channel closed before {topic} finished"),
        }
    };

    match &status {
        JobStatus::Completed => pb.finish_with_message("Done"),
        JobStatus::Cancelled => pb.abandon_with_message("Cancelled"),
        JobStatus::Faulted(_) => pb.abandon_with_message("Failed"),
    }
    if !project.wait_settled(SETTLE_TIMEOUT) {
        warn!(job = %topic, "Worker did not settle");
    }
    Ok((status, seen))
}

/// Like [`follow_job`], turning a faulted job into an error.
///
/// A cancelled job prints a notice and yields `None`; the caller stops there.
pub fn run_job(
    project: &Project,
    events: &Receiver<ProjectEvent>,
    topic: JobKind,
) -> Result<Option<Vec<ProjectEvent>>> {
    let (status, seen) = follow_job(project, events, topic)?;
    job_outcome(topic, status, seen)
}

fn job_outcome(
    topic: JobKind,
    status: JobStatus,
    seen: Vec<ProjectEvent>,
) -> Result<Option<Vec<ProjectEvent>>> {
    match status {
        JobStatus::Completed => Ok(Some(seen)),
        JobStatus::Cancelled => {
            println!("{}", Style::new().yellow().apply_to(format!("{topic} was cancelled")));
            Ok(None)
        }
        JobStatus::Faulted(message) => bail!("{topic} failed: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_job_is_not_an_error() {
        let outcome = job_outcome(JobKind::ProcessFiles, JobStatus::Cancelled, Vec::new());
        assert!(matches!(outcome, Ok(None)));
    }

    #[test]
    fn completed_job_returns_events() {
        let seen = vec![ProjectEvent::BrightnessCalculated];
        let outcome = job_outcome(JobKind::CalculateBrightness, JobStatus::Completed, seen);
        assert_eq!(outcome.unwrap(), Some(vec![ProjectEvent::BrightnessCalculated]));
    }

    #[test]
    fn faulted_job_is_an_error() {
        let status = JobStatus::Faulted("Unsupported pixel format: L8".into());
        let err = job_outcome(JobKind::ProcessFiles, status, Vec::new()).unwrap_err();
        assert!(err.to_string().contains("L8"));
    }
}

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::Duration;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

use lapse_core::engine::{JobKind, JobStatus, ProjectEvent};
use lapse_core::project::Project;

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Uniform RGB image of one gray level.
pub fn gray_image(width: u32, height: u32, level: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([level, level, level])))
}

/// Write one uniform PNG frame per level into `dir`, named `frame_000.png`, ...
pub fn write_gray_sequence(dir: &Path, levels: &[u8]) -> Vec<PathBuf> {
    write_sized_sequence(dir, levels, 16, 12)
}

/// Like [`write_gray_sequence`] with a chosen frame size.
pub fn write_sized_sequence(dir: &Path, levels: &[u8], width: u32, height: u32) -> Vec<PathBuf> {
    levels
        .iter()
        .enumerate()
        .map(|(i, &level)| {
            let path = dir.join(format!("frame_{i:03}.png"));
            gray_image(width, height, level).save(&path).unwrap();
            path
        })
        .collect()
}

/// Single-channel 8-bit frames, which the renderer does not accept.
pub fn write_luma_sequence(dir: &Path, levels: &[u8]) -> Vec<PathBuf> {
    levels
        .iter()
        .enumerate()
        .map(|(i, &level)| {
            let path = dir.join(format!("frame_{i:03}.png"));
            GrayImage::from_pixel(16, 12, Luma([level])).save(&path).unwrap();
            path
        })
        .collect()
}

/// Receive events until `WorkDone` for `topic`, returning everything seen.
pub fn drain_until_done(events: &Receiver<ProjectEvent>, topic: JobKind) -> Vec<ProjectEvent> {
    let mut seen = Vec::new();
    loop {
        let event = events
            .recv_timeout(EVENT_TIMEOUT)
            .expect("timed out waiting for WorkDone");
        let done = matches!(&event, ProjectEvent::WorkDone { topic: t, .. } if *t == topic);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

/// Status carried by the terminal event in `events`.
pub fn done_status(events: &[ProjectEvent]) -> JobStatus {
    match events.last() {
        Some(ProjectEvent::WorkDone { status, .. }) => status.clone(),
        other => panic!("last event is not WorkDone: {other:?}"),
    }
}

/// Wait for the job's terminal event and for the engine to return to idle.
pub fn finish_job(project: &Project, events: &Receiver<ProjectEvent>, topic: JobKind) -> JobStatus {
    let seen = drain_until_done(events, topic);
    assert!(project.wait_settled(EVENT_TIMEOUT), "engine did not settle");
    done_status(&seen)
}

/// Percent values of every `ProgressChanged` event for `topic`.
pub fn progress_of(events: &[ProjectEvent], topic: JobKind) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            ProjectEvent::ProgressChanged { percent, topic: t } if *t == topic => Some(*percent),
            _ => None,
        })
        .collect()
}

use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};

/// Tag of a background job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobKind {
    LoadFrames,
    ProcessThumbs,
    CalculateBrightness,
    LoadProject,
    ProcessFiles,
    ReadMetadata,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadFrames => write!(f, "Loading frames"),
            Self::ProcessThumbs => write!(f, "Processing thumbnails"),
            Self::CalculateBrightness => write!(f, "Calculating brightness"),
            Self::LoadProject => write!(f, "Loading project"),
            Self::ProcessFiles => write!(f, "Processing images"),
            Self::ReadMetadata => write!(f, "Reading metadata"),
        }
    }
}

/// How a job ended.
#[derive(Clone, Debug, PartialEq)]
pub enum JobStatus {
    Completed,
    Cancelled,
    Faulted(String),
}

impl JobStatus {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Notifications published by a project.
#[derive(Clone, Debug, PartialEq)]
pub enum ProjectEvent {
    FramesLoaded { count: usize },
    BrightnessCalculated,
    ProgressChanged { percent: u8, topic: JobKind },
    FilesProcessed { written: usize, deferred: usize },
    /// Terminal event, sent exactly once per submitted job.
    WorkDone { topic: JobKind, status: JobStatus },
}

/// Fan-out of project events to every live subscriber.
///
/// Dropping a receiver unsubscribes it; dead senders are pruned on the next publish.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<ProjectEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::Receiver<ProjectEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn publish(&self, event: ProjectEvent) {
        let mut subs = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Percent progress for one job run. Never reports a lower percent than
/// already reported, even when frames finish out of order on several threads.
pub struct ProgressSink {
    bus: EventBus,
    topic: JobKind,
    last: Mutex<Option<u8>>,
}

impl ProgressSink {
    pub(crate) fn new(bus: EventBus, topic: JobKind) -> Self {
        Self {
            bus,
            topic,
            last: Mutex::new(None),
        }
    }

    pub fn topic(&self) -> JobKind {
        self.topic
    }

    /// Report a percentage (clamped to 0..=100).
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.is_some_and(|prev| percent < prev) {
            return;
        }
        *last = Some(percent);
        self.bus.publish(ProjectEvent::ProgressChanged {
            percent,
            topic: self.topic,
        });
    }

    /// Report `done` of `total` items.
    pub fn items(&self, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        self.report((done.min(total) * 100 / total) as u8);
    }

    pub fn last_percent(&self) -> Option<u8> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

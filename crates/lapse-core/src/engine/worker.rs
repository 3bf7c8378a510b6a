//! Single-flight background job runner.
//!
//! `Idle -> Running -> {Completed, Cancelled, Faulted} -> Idle`. A job runs on
//! its own named thread; the submitting side never blocks and learns about the
//! outcome through the terminal `WorkDone` event.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{LapseError, Result};

use super::cancel::CancelToken;
use super::events::{EventBus, JobKind, JobStatus, ProgressSink, ProjectEvent};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Faulted,
}

/// Successful end of a job body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Finished,
    /// The job observed the cancel flag and stopped without committing.
    Cancelled,
}

/// Handle a running job uses to poll cancellation and report progress.
pub struct JobContext {
    cancel: CancelToken,
    progress: ProgressSink,
    bus: EventBus,
}

impl JobContext {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn progress(&self) -> &ProgressSink {
        &self.progress
    }

    pub fn publish(&self, event: ProjectEvent) {
        self.bus.publish(event);
    }
}

struct Shared {
    state: Mutex<EngineState>,
    settled: Condvar,
    working: AtomicBool,
    cancel: Mutex<Option<CancelToken>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn set_state(&self, state: EngineState) {
        *lock(&self.state) = state;
    }

    fn release(&self) {
        let mut state = lock(&self.state);
        *state = EngineState::Idle;
        self.working.store(false, Ordering::Release);
        *lock(&self.cancel) = None;
        self.settled.notify_all();
    }
}

/// Returns the engine to `Idle` when dropped, also while unwinding.
struct ReleaseGuard(Arc<Shared>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

pub struct WorkEngine {
    shared: Arc<Shared>,
    bus: EventBus,
}

impl WorkEngine {
    pub fn new(bus: EventBus) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState::Idle),
                settled: Condvar::new(),
                working: AtomicBool::new(false),
                cancel: Mutex::new(None),
            }),
            bus,
        }
    }

    pub fn state(&self) -> EngineState {
        *lock(&self.shared.state)
    }

    pub fn is_working(&self) -> bool {
        self.shared.working.load(Ordering::Acquire)
    }

    /// Start `job` on a background thread.
    ///
    /// Fails with [`LapseError::Busy`] unless the engine is idle; the running
    /// job is not affected by a rejected submit.
    pub fn submit<F>(&self, kind: JobKind, job: F) -> Result<()>
    where
        F: FnOnce(&JobContext) -> Result<Completion> + Send + 'static,
    {
        let token = CancelToken::new();
        {
            let mut state = lock(&self.shared.state);
            if *state != EngineState::Idle {
                debug!(job = %kind, state = ?*state, "Rejected job submit");
                return Err(LapseError::Busy);
            }
            *state = EngineState::Running;
            self.shared.working.store(true, Ordering::Release);
            *lock(&self.shared.cancel) = Some(token.clone());
        }

        let shared = Arc::clone(&self.shared);
        let bus = self.bus.clone();
        let spawned = thread::Builder::new()
            .name("lapse-worker".into())
            .spawn(move || {
                let _release = ReleaseGuard(Arc::clone(&shared));
                let ctx = JobContext {
                    cancel: token,
                    progress: ProgressSink::new(bus.clone(), kind),
                    bus: bus.clone(),
                };

                let started = Instant::now();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(&ctx)));
                let (state, status) = match outcome {
                    Ok(Ok(Completion::Finished)) => (EngineState::Completed, JobStatus::Completed),
                    Ok(Ok(Completion::Cancelled)) => (EngineState::Cancelled, JobStatus::Cancelled),
                    Ok(Err(e)) => (EngineState::Faulted, JobStatus::Faulted(e.to_string())),
                    Err(payload) => (
                        EngineState::Faulted,
                        JobStatus::Faulted(panic_message(payload.as_ref())),
                    ),
                };
                match &status {
                    JobStatus::Faulted(message) => {
                        warn!(job = %kind, error = %message, "Job faulted")
                    }
                    _ => info!(
                        job = %kind,
                        ?status,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Job finished"
                    ),
                }

                shared.set_state(state);
                bus.publish(ProjectEvent::WorkDone { topic: kind, status });
            });

        if let Err(e) = spawned {
            self.shared.release();
            return Err(LapseError::Io(e));
        }
        Ok(())
    }

    /// Ask the running job to stop at its next safe point. Never blocks.
    pub fn request_cancel(&self) {
        let state = lock(&self.shared.state);
        if *state != EngineState::Running {
            return;
        }
        if let Some(token) = lock(&self.shared.cancel).as_ref() {
            debug!("Cancellation requested");
            token.cancel();
        }
    }

    /// Wait up to `timeout` for the engine to return to idle.
    ///
    /// Returns `true` when idle, `false` when the timeout elapsed first.
    pub fn wait_settled(&self, timeout: Duration) -> bool {
        let state = lock(&self.shared.state);
        let (state, _) = self
            .shared
            .settled
            .wait_timeout_while(state, timeout, |s| *s != EngineState::Idle)
            .unwrap_or_else(PoisonError::into_inner);
        *state == EngineState::Idle
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("job panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("job panicked: {s}")
    } else {
        "job panicked".to_string()
    }
}

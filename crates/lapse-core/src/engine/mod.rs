mod cancel;
mod events;
mod worker;

pub use cancel::CancelToken;
pub use events::{EventBus, JobKind, JobStatus, ProgressSink, ProjectEvent};
pub use worker::{Completion, EngineState, JobContext, WorkEngine};

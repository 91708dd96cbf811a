//! The editing-session controller and the pieces that drive it.

mod actions;
mod controller;
mod event;
mod orchestrator;
mod runtime;
mod timer;
mod view;
mod worker;

pub use actions::{execute_copy, execute_download, execute_removal};
pub use controller::EditorController;
pub use event::{EditorEvent, Effect};
pub use orchestrator::{PendingRequest, RequestOrchestrator, StrokeMark, SubmitError, SubmitResult};
pub use runtime::HeadlessRuntime;
pub use timer::{Debouncer, COPY_FEEDBACK_PERIOD, CROP_END_QUIET_PERIOD, RESIZE_QUIET_PERIOD};
pub use view::{ControlsView, CopyState, PROCESS_BUSY_LABEL, PROCESS_LABEL};
pub use worker::{spawn_worker_action, WorkerHandle, WorkerPoll, ACTION_RESULT_POLL_INTERVAL};

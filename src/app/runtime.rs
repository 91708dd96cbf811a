//! Host loop that runs the controller without a toolkit: effects are carried
//! out immediately and removal requests go to worker threads.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::actions::{execute_copy, execute_download, execute_removal};
use super::controller::EditorController;
use super::event::{EditorEvent, Effect};
use super::worker::{spawn_worker_action, WorkerHandle, WorkerPoll, ACTION_RESULT_POLL_INTERVAL};
use crate::clipboard::ClipboardBackend;
use crate::editor::RegionCropper;
use crate::error::AppError;
use crate::notification::{Notice, Notifier};
use crate::remote::{RemovalService, RequestTicket, ServiceError};
use crate::storage::ExportStorage;

struct InFlight {
    ticket: RequestTicket,
    handle: WorkerHandle<EditorEvent>,
}

pub struct HeadlessRuntime<C: RegionCropper> {
    controller: EditorController<C>,
    service: Arc<dyn RemovalService>,
    clipboard: Box<dyn ClipboardBackend>,
    storage: Box<dyn ExportStorage>,
    notifier: Box<dyn Notifier>,
    in_flight: Vec<InFlight>,
    notices: Vec<Notice>,
    exports: Vec<PathBuf>,
}

impl<C: RegionCropper> HeadlessRuntime<C> {
    pub fn new(
        controller: EditorController<C>,
        service: Arc<dyn RemovalService>,
        clipboard: Box<dyn ClipboardBackend>,
        storage: Box<dyn ExportStorage>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            controller,
            service,
            clipboard,
            storage,
            notifier,
            in_flight: Vec::new(),
            notices: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn controller(&self) -> &EditorController<C> {
        &self.controller
    }

    /// Every notice raised so far, oldest first.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Paths of the export files written so far.
    pub fn exports(&self) -> &[PathBuf] {
        &self.exports
    }

    /// Feeds one event to the controller and runs the resulting effects,
    /// including any follow-up events they produce.
    pub fn dispatch(&mut self, event: EditorEvent) {
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            tracing::debug!(?event, "dispatch");
            let effects = self.controller.handle(event, Instant::now());
            for effect in effects {
                if let Some(follow_up) = self.perform(effect) {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    /// Blocks until every outstanding removal request has been answered,
    /// firing due timers while waiting.
    pub fn wait_for_requests(&mut self) {
        while !self.in_flight.is_empty() {
            let mut finished = Vec::new();
            self.in_flight.retain(|job| match job.handle.try_result() {
                WorkerPoll::Ready(event) => {
                    finished.push(event);
                    false
                }
                WorkerPoll::Pending => true,
                WorkerPoll::Lost => {
                    finished.push(EditorEvent::RequestFinished {
                        ticket: job.ticket,
                        outcome: Err(ServiceError::WorkerLost),
                    });
                    false
                }
            });

            if finished.is_empty() {
                if self
                    .controller
                    .next_deadline()
                    .is_some_and(|deadline| deadline <= Instant::now())
                {
                    self.dispatch(EditorEvent::Tick);
                }
                std::thread::sleep(ACTION_RESULT_POLL_INTERVAL);
                continue;
            }
            for event in finished {
                self.dispatch(event);
            }
        }
    }

    fn perform(&mut self, effect: Effect) -> Option<EditorEvent> {
        match effect {
            Effect::Submit(request) => {
                let ticket = request.ticket;
                let service = Arc::clone(&self.service);
                let handle = spawn_worker_action(move || execute_removal(&request, &*service));
                self.in_flight.push(InFlight { ticket, handle });
                None
            }
            Effect::Notify(notice) => {
                self.notifier.notify(&notice);
                self.notices.push(notice);
                None
            }
            Effect::Download(artifact) => {
                match execute_download(&artifact, self.storage.as_ref()) {
                    Ok(path) => self.exports.push(path),
                    Err(err) => {
                        let err = AppError::from(err);
                        let notice = Notice::new(
                            err.notice_kind(),
                            format!("failed to save {}: {err}", artifact.file_name),
                        );
                        self.notifier.notify(&notice);
                        self.notices.push(notice);
                    }
                }
                None
            }
            Effect::CopyToClipboard(image) => Some(EditorEvent::CopyFinished(execute_copy(
                &image,
                self.clipboard.as_ref(),
            ))),
        }
    }
}

//! Executes effects that involve I/O (removal service, storage, clipboard).

use std::path::PathBuf;

use super::event::EditorEvent;
use crate::clipboard::{ClipboardBackend, ClipboardResult};
use crate::editor::EncodedImage;
use crate::remote::{RemovalRequest, RemovalService};
use crate::storage::{ExportArtifact, ExportStorage, StorageResult};

/// Runs one removal round-trip and packages the outcome for the controller.
pub fn execute_removal<S: RemovalService + ?Sized>(
    request: &RemovalRequest,
    service: &S,
) -> EditorEvent {
    let outcome = service.remove(request);
    if let Err(err) = &outcome {
        tracing::warn!(ticket = request.ticket.0, "removal failed: {err}");
    }
    EditorEvent::RequestFinished {
        ticket: request.ticket,
        outcome,
    }
}

pub fn execute_download<S: ExportStorage + ?Sized>(
    artifact: &ExportArtifact,
    storage: &S,
) -> StorageResult<PathBuf> {
    storage.save_export(artifact)
}

pub fn execute_copy<C: ClipboardBackend + ?Sized>(
    image: &EncodedImage,
    clipboard: &C,
) -> ClipboardResult<()> {
    clipboard.copy_image(image.bytes(), image.media_type())
}

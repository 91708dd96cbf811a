use crate::clipboard::ClipboardResult;
use crate::editor::{ActionType, EncodedImage};
use crate::geometry::{ElementBox, PixelRect, PointerPosition};
use crate::input::SourceFile;
use crate::notification::Notice;
use crate::remote::{RemovalRequest, RequestTicket, ServiceResult};
use crate::state::ModeEvent;
use crate::storage::ExportArtifact;

/// Everything the surrounding UI can tell the controller.
#[derive(Debug)]
pub enum EditorEvent {
    LoadFile(SourceFile),
    PasteItems(Vec<SourceFile>),
    /// The working image finished layout at this box.
    ImageLaidOut(ElementBox),
    /// Raw viewport resize; the new box is applied after the quiet period.
    ViewportResized(ElementBox),
    SwitchMode(ModeEvent),
    PointerDown(PointerPosition),
    PointerMove(PointerPosition),
    PointerUp,
    PointerLeave,
    SetBrushSize(u32),
    SetActionType(ActionType),
    ClearMask,
    Undo,
    Process,
    /// The cropping widget finished an adjustment.
    CropEnd,
    CoordinatesEdited(PixelRect),
    RequestFinished {
        ticket: RequestTicket,
        outcome: ServiceResult<EncodedImage>,
    },
    Download,
    Copy,
    CopyFinished(ClipboardResult<()>),
    ResultLaidOut {
        image: ElementBox,
        container: ElementBox,
    },
    ResultPointerEnter,
    ResultPointerMove(PointerPosition),
    ResultPointerLeave,
    /// Lets due timers fire without any other input.
    Tick,
}

/// Work the controller hands back to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Submit(RemovalRequest),
    Notify(Notice),
    Download(ExportArtifact),
    CopyToClipboard(EncodedImage),
}

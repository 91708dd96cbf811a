use thiserror::Error;

use crate::editor::{EditSession, MaskError, MaskSurface};
use crate::geometry::PixelRect;
use crate::remote::{RemovalPayload, RemovalRequest, RequestTicket};
use crate::state::EditMode;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("load an image first")]
    NoImage,
    #[error("select a region on the image first")]
    NoSelection,
    #[error("selected region {rect:?} does not fit the {width}x{height} image")]
    SelectionOutOfBounds {
        rect: PixelRect,
        width: u32,
        height: u32,
    },
    #[error("paint over the area to remove first")]
    EmptyMask,
    #[error("a removal request is already in flight")]
    RequestInFlight,
    #[error(transparent)]
    Mask(#[from] MaskError),
}

pub type SubmitResult<T> = std::result::Result<T, SubmitError>;

/// Identifies the strokes a brush submission covered: the surface they were
/// drawn on and the newest stroke included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeMark {
    pub surface: u64,
    pub last_stroke: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub ticket: RequestTicket,
    pub mode: EditMode,
    /// Session revision of the image the request was computed from.
    pub revision: u64,
    pub strokes: Option<StrokeMark>,
}

/// Builds payloads and guards the single in-flight slot.
#[derive(Debug, Default)]
pub struct RequestOrchestrator {
    next_ticket: u64,
    in_flight: Option<PendingRequest>,
}

impl RequestOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&PendingRequest> {
        self.in_flight.as_ref()
    }

    /// Composes the request for `mode` and claims the in-flight slot. Nothing
    /// is touched when an earlier request is still outstanding.
    pub fn submit(
        &mut self,
        session: &EditSession,
        mode: EditMode,
        mask: Option<(&MaskSurface, u64)>,
    ) -> SubmitResult<RemovalRequest> {
        if self.in_flight.is_some() {
            return Err(SubmitError::RequestInFlight);
        }
        let image = session.current_image().ok_or(SubmitError::NoImage)?;

        let (payload, strokes) = match mode {
            EditMode::Rect => {
                let rect = session.selection().current().ok_or(SubmitError::NoSelection)?;
                let natural = image.size();
                if !rect.fits_within(natural) {
                    return Err(SubmitError::SelectionOutOfBounds {
                        rect,
                        width: natural.width,
                        height: natural.height,
                    });
                }
                (RemovalPayload::Region(rect), None)
            }
            EditMode::Brush => {
                let (surface, generation) = mask.ok_or(SubmitError::EmptyMask)?;
                let last_stroke = surface.last_stroke_id().ok_or(SubmitError::EmptyMask)?;
                let payload = RemovalPayload::Mask {
                    png: surface.serialize()?,
                    size: surface.size(),
                    action: session.brush().action(),
                };
                let mark = StrokeMark {
                    surface: generation,
                    last_stroke,
                };
                (payload, Some(mark))
            }
        };

        self.next_ticket = self.next_ticket.wrapping_add(1);
        let ticket = RequestTicket(self.next_ticket);
        self.in_flight = Some(PendingRequest {
            ticket,
            mode,
            revision: session.revision(),
            strokes,
        });
        tracing::info!(ticket = ticket.0, mode = %mode, "removal request submitted");

        Ok(RemovalRequest {
            ticket,
            image: image.clone(),
            payload,
        })
    }

    /// Releases the in-flight slot if `ticket` owns it.
    pub fn finish(&mut self, ticket: RequestTicket) -> Option<PendingRequest> {
        match self.in_flight {
            Some(pending) if pending.ticket == ticket => self.in_flight.take(),
            _ => None,
        }
    }
}

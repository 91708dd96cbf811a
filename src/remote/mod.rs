//! The external removal operation: request/response types, the service
//! seam and the HTTP implementation.

mod data_uri;
mod http;

use serde::Deserialize;
use thiserror::Error;

use crate::editor::{ActionType, EncodedImage};
use crate::geometry::{ImageSize, PixelRect};
use crate::state::EditMode;

pub use data_uri::{decode_data_uri, DataUriError};
pub use http::{HttpRemovalService, DEFAULT_ENDPOINT};

/// Correlates a response with the submission that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalPayload {
    /// Natural-space region to remove.
    Region(PixelRect),
    /// PNG mask at displayed size plus the requested treatment.
    Mask {
        png: Vec<u8>,
        size: ImageSize,
        action: ActionType,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRequest {
    pub ticket: RequestTicket,
    pub image: EncodedImage,
    pub payload: RemovalPayload,
}

impl RemovalRequest {
    pub fn mode(&self) -> EditMode {
        match self.payload {
            RemovalPayload::Region(_) => EditMode::Rect,
            RemovalPayload::Mask { .. } => EditMode::Brush,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to reach removal service: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("removal service answered with HTTP {status}")]
    HttpStatus { status: u16 },
    #[error("malformed removal service response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
    #[error("removal service response is missing the result image")]
    MissingImage,
    #[error("removal service reported an error: {message}")]
    Rejected { message: String },
    #[error("invalid result image: {0}")]
    InvalidImage(#[from] DataUriError),
    #[error("failed to read result image: {0}")]
    ImageDecode(#[from] image::ImageError),
    #[error("removal worker exited without a result")]
    WorkerLost,
}

impl ServiceError {
    /// Errors reported by the service itself, as opposed to transport or
    /// decoding failures.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Performs exactly one removal round-trip per call.
pub trait RemovalService: Send + Sync {
    fn remove(&self, request: &RemovalRequest) -> ServiceResult<EncodedImage>;
}

impl<S: RemovalService + ?Sized> RemovalService for std::sync::Arc<S> {
    fn remove(&self, request: &RemovalRequest) -> ServiceResult<EncodedImage> {
        (**self).remove(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    status: ResponseStatus,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Maps a JSON response body to the result image or the service's own error
/// message, verbatim.
pub fn parse_response(body: &str) -> ServiceResult<EncodedImage> {
    let body: ResponseBody = serde_json::from_str(body)?;
    match body.status {
        ResponseStatus::Success => {
            let uri = body.image.ok_or(ServiceError::MissingImage)?;
            let (media_type, bytes) = decode_data_uri(&uri)?;
            Ok(EncodedImage::from_bytes(bytes, media_type)?)
        }
        ResponseStatus::Error => Err(ServiceError::Rejected {
            message: body
                .message
                .unwrap_or_else(|| "unknown service error".to_string()),
        }),
    }
}

use crate::app::SubmitError;
use crate::clipboard::ClipboardError;
use crate::editor::{HistoryError, MaskError};
use crate::input::InputError;
use crate::notification::{Notice, NoticeKind};
use crate::remote::ServiceError;
use crate::state::StateError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Mask(#[from] MaskError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AppError {
    pub fn notice_kind(&self) -> NoticeKind {
        match self {
            Self::State(_) => NoticeKind::Mode,
            Self::Input(_) | Self::Submit(_) | Self::Mask(_) => NoticeKind::Input,
            Self::Service(err) if err.is_rejection() => NoticeKind::Service,
            Self::Service(_) => NoticeKind::Transport,
            Self::History(_) => NoticeKind::EmptyHistory,
            Self::Clipboard(_) => NoticeKind::Clipboard,
            Self::Storage(_) => NoticeKind::Export,
        }
    }

    /// User-facing form of the error; clipboard failures carry a hint.
    pub fn to_notice(&self) -> Notice {
        let message = match self {
            Self::Clipboard(err) => format!("{err} ({})", err.guidance()),
            other => other.to_string(),
        };
        Notice::new(self.notice_kind(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_split_into_service_and_transport_notices() {
        let rejected = AppError::from(ServiceError::Rejected {
            message: "No selected file".to_string(),
        });
        assert_eq!(rejected.notice_kind(), NoticeKind::Service);
        assert!(rejected.to_notice().message.ends_with("No selected file"));

        let transport = AppError::from(ServiceError::HttpStatus { status: 503 });
        assert_eq!(transport.notice_kind(), NoticeKind::Transport);
    }

    #[test]
    fn clipboard_notice_carries_guidance() {
        let notice = AppError::from(ClipboardError::UnsupportedMediaType {
            media_type: "text/plain".to_string(),
        })
        .to_notice();
        assert_eq!(notice.kind, NoticeKind::Clipboard);
        assert!(notice.message.contains("only image results can be copied"));
    }

    #[test]
    fn empty_history_and_refused_submit_map_to_their_kinds() {
        assert_eq!(
            AppError::from(HistoryError::Empty).notice_kind(),
            NoticeKind::EmptyHistory
        );
        assert_eq!(
            AppError::from(SubmitError::NoSelection).notice_kind(),
            NoticeKind::Input
        );
    }
}

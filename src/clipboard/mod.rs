use std::io::{self, Write};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::input::is_image_media_type;

const WL_COPY_COMMAND: &str = "wl-copy";

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard only accepts images, got {media_type}")]
    UnsupportedMediaType { media_type: String },
    #[error("failed to run clipboard command: {command}")]
    CommandIo {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to hand image data to {command}")]
    WriteInput {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} exited with non-zero status: {status}")]
    CommandFailed { command: String, status: String },
}

impl ClipboardError {
    /// Hint shown next to the failure message.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::UnsupportedMediaType { .. } => "only image results can be copied",
            Self::CommandIo { .. } | Self::WriteInput { .. } | Self::CommandFailed { .. } => {
                "clipboard access needs a secure context or a running clipboard service (wl-copy); use download instead"
            }
        }
    }
}

pub type ClipboardResult<T> = std::result::Result<T, ClipboardError>;

pub trait ClipboardBackend {
    fn copy_image(&self, bytes: &[u8], media_type: &str) -> ClipboardResult<()>;
}

/// Writes images through `wl-copy --type <media>`.
#[derive(Debug, Default)]
pub struct WlCopyBackend;

impl ClipboardBackend for WlCopyBackend {
    fn copy_image(&self, bytes: &[u8], media_type: &str) -> ClipboardResult<()> {
        ensure_image(media_type)?;

        let mut child = Command::new(WL_COPY_COMMAND)
            .arg("--type")
            .arg(media_type)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|err| ClipboardError::CommandIo {
                command: WL_COPY_COMMAND.to_string(),
                source: err,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(bytes)
                .map_err(|err| ClipboardError::WriteInput {
                    command: WL_COPY_COMMAND.to_string(),
                    source: err,
                })?;
        }

        let status = child.wait().map_err(|err| ClipboardError::CommandIo {
            command: WL_COPY_COMMAND.to_string(),
            source: err,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed {
                command: WL_COPY_COMMAND.to_string(),
                status: status.to_string(),
            })
        }
    }
}

fn ensure_image(media_type: &str) -> ClipboardResult<()> {
    if is_image_media_type(media_type) {
        Ok(())
    } else {
        Err(ClipboardError::UnsupportedMediaType {
            media_type: media_type.to_string(),
        })
    }
}

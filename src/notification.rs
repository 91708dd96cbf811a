//! User-visible notices and the sinks that surface them.

use std::fmt;

const APP_NAME: &str = "retouch";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// Missing file, selection or mask; the action was not attempted.
    Input,
    /// Network failure or unreadable response.
    Transport,
    /// The removal service reported a failure.
    Service,
    EmptyHistory,
    Clipboard,
    /// Writing a downloaded result failed.
    Export,
    /// A mode switch was refused.
    Mode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub trait Notifier {
    fn notify(&self, notice: &Notice);
}

/// Routes notices into the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        tracing::warn!(kind = ?notice.kind, "{}", notice.message);
    }
}

/// Desktop notification per notice, logged as well.
#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, notice: &Notice) {
        LogNotifier.notify(notice);
        send(notice.to_string());
    }
}

pub fn send(body: impl Into<String>) {
    let body = body.into();
    if let Err(err) = notify_rust::Notification::new()
        .appname(APP_NAME)
        .summary(APP_NAME)
        .body(&body)
        .show()
    {
        tracing::warn!("system notification failed: {err}");
    }
}

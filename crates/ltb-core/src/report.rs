//! Closed taxonomy of per-update platform failures.
//!
//! Every category is logged and swallowed at the dispatch boundary; none of
//! them stops the polling loop.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Token revoked, or the bot was blocked/kicked by a conversation.
    Unauthorized,
    /// Malformed outbound request (bad reply target, unusable photo URL, ...).
    BadRequest,
    TimedOut,
    NetworkError,
    /// A group was upgraded and its chat id changed.
    ChatMigrated,
    GenericPlatformError,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::BadRequest => "bad_request",
            Self::TimedOut => "timed_out",
            Self::NetworkError => "network_error",
            Self::ChatMigrated => "chat_migrated",
            Self::GenericPlatformError => "platform_error",
        }
    }

    /// Transport hiccups the polling loop recovers from on its own.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::TimedOut | Self::NetworkError)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorReport {
    pub category: ErrorCategory,
    pub message: String,
}

impl ErrorReport {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    pub fn log(&self) {
        if self.category.is_transient() {
            tracing::warn!(category = %self.category, "update failed: {}", self.message);
        } else {
            tracing::error!(category = %self.category, "update failed: {}", self.message);
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

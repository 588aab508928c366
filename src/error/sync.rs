// Sync mailbox error types and constants

use crate::error::ErrorCode;
use log::warn;
use std::fmt;

/// Sync error code constants
///
/// Error code range: 4001-4004
pub struct SyncErrorCodes {}

impl SyncErrorCodes {
    /// Tag value is not part of the message tag space
    pub const UNKNOWN_TAG: i32 = 4001;

    /// Tag exists but is not routed over this mailbox
    pub const NOT_ROUTED: i32 = 4002;

    /// Value is outside the accepted range for the tag
    pub const INVALID_VALUE: i32 = 4003;

    /// Wire frame has the wrong length
    pub const MALFORMED_FRAME: i32 = 4004;
}

/// Log a sync error
///
/// Sync errors mean a message was dropped. The sampler re-publishes its full
/// state periodically, so these are logged at warn level only.
pub fn log_sync_error(err: &SyncError, context: &str) {
    warn!(
        "Sync error in {}: code={}, component=Mailbox, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while encoding, routing or applying sync messages
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Tag value is not part of the message tag space
    UnknownTag(u16),

    /// Tag exists but is not routed over this mailbox
    NotRouted { tag: u16 },

    /// Value is outside the accepted range for the tag
    InvalidValue { tag: u16, value: u16 },

    /// Wire frame has the wrong length
    MalformedFrame { len: usize },
}

impl ErrorCode for SyncError {
    fn code(&self) -> i32 {
        match self {
            SyncError::UnknownTag(_) => SyncErrorCodes::UNKNOWN_TAG,
            SyncError::NotRouted { .. } => SyncErrorCodes::NOT_ROUTED,
            SyncError::InvalidValue { .. } => SyncErrorCodes::INVALID_VALUE,
            SyncError::MalformedFrame { .. } => SyncErrorCodes::MALFORMED_FRAME,
        }
    }

    fn message(&self) -> String {
        match self {
            SyncError::UnknownTag(tag) => format!("Unknown message tag {}", tag),
            SyncError::NotRouted { tag } => format!("Tag {} is not routed on this mailbox", tag),
            SyncError::InvalidValue { tag, value } => {
                format!("Value {} out of range for tag {}", value, tag)
            }
            SyncError::MalformedFrame { len } => {
                format!("Malformed frame: expected 4 bytes, got {}", len)
            }
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SyncError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SyncError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_codes() {
        assert_eq!(SyncError::UnknownTag(7).code(), SyncErrorCodes::UNKNOWN_TAG);
        assert_eq!(
            SyncError::NotRouted { tag: 101 }.code(),
            SyncErrorCodes::NOT_ROUTED
        );
        assert_eq!(
            SyncError::InvalidValue {
                tag: 101,
                value: 300
            }
            .code(),
            SyncErrorCodes::INVALID_VALUE
        );
        assert_eq!(
            SyncError::MalformedFrame { len: 3 }.code(),
            SyncErrorCodes::MALFORMED_FRAME
        );
    }

    #[test]
    fn test_sync_error_messages() {
        assert_eq!(
            SyncError::InvalidValue {
                tag: 102,
                value: 1500
            }
            .message(),
            "Value 1500 out of range for tag 102"
        );
        assert_eq!(
            SyncError::MalformedFrame { len: 2 }.message(),
            "Malformed frame: expected 4 bytes, got 2"
        );
    }
}

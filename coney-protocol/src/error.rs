//! Protocol error types.

use thiserror::Error;

/// Wire-level errors raised while encoding or decoding AMQP data.
///
/// Every decode failure here is fatal to the connection that produced the
/// bytes: the frame stream cannot be resynchronized after malformed input.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("truncated payload: needed {needed} more bytes")]
    Truncated { needed: usize },

    #[error("unknown field kind tag: {0:#04x}")]
    UnknownFieldKind(u8),

    #[error("unknown frame type: {0}")]
    UnknownFrameType(u8),

    #[error("unknown method: class {class_id}, method {method_id}")]
    UnknownMethod { class_id: u16, method_id: u16 },

    #[error("unknown content class: {0}")]
    UnknownClass(u16),

    #[error("bad frame-end octet: {0:#04x}")]
    BadFrameEnd(u8),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("short string too long: {0} bytes (max 255)")]
    ShortStringTooLong(usize),

    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("property flag chain too long")]
    FlagChainTooLong,

    #[error("heartbeat frame with nonzero payload length {0}")]
    NonEmptyHeartbeat(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::Truncated { needed: 4 };
        assert!(err.to_string().contains("4 more bytes"));

        let err = ProtocolError::UnknownFieldKind(0x7a);
        assert!(err.to_string().contains("0x7a"));

        let err = ProtocolError::UnknownMethod {
            class_id: 60,
            method_id: 99,
        };
        let msg = err.to_string();
        assert!(msg.contains("60") && msg.contains("99"));

        let err = ProtocolError::BadFrameEnd(0x00);
        assert!(err.to_string().contains("0x00"));

        let err = ProtocolError::FrameTooLarge {
            size: 200_000,
            max: 131_072,
        };
        assert!(err.to_string().contains("200000"));

        let err = ProtocolError::ShortStringTooLong(300);
        assert!(err.to_string().contains("300"));
    }
}

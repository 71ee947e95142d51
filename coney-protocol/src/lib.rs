//! # coney-protocol
//!
//! AMQP 0-9-1 wire protocol implementation for coney.
//!
//! This crate provides:
//! - Binary framing with a restartable frame reader
//! - Method and content-header codecs
//! - The typed field-table format with nested tables and arrays
//! - Per-channel buffer pools for decoded frame payloads
//! - Protocol constants and error types

pub mod codec;
pub mod error;
pub mod field;
pub mod frame;
pub mod method;
pub mod pool;
pub mod properties;

pub use error::ProtocolError;
pub use field::{FieldValue, Table};
pub use frame::{Frame, FrameReader, FRAME_END, FRAME_HEADER_SIZE, PROTOCOL_HEADER};
pub use method::Method;
pub use pool::{ChannelPools, Pool};
pub use properties::{BasicProperties, ContentHeader};

/// Protocol version implemented by this crate (AMQP 0-9-1).
pub const VERSION_MAJOR: u8 = 0;
/// Minor protocol version.
pub const VERSION_MINOR: u8 = 9;
/// Protocol revision.
pub const VERSION_REVISION: u8 = 1;

/// Default port for plaintext connections.
pub const DEFAULT_PORT: u16 = 5672;

/// Default port for TLS connections.
pub const DEFAULT_TLS_PORT: u16 = 5671;

/// Default maximum frame size proposed to the server (128 KiB).
pub const DEFAULT_FRAME_MAX: u32 = 131_072;

/// Smallest frame-max any peer may negotiate, fixed by the protocol.
pub const FRAME_MIN_SIZE: u32 = 4096;

/// AMQP reply codes carried by `connection.close` and `channel.close`.
///
/// These values are part of the wire contract and must remain stable.
pub mod reply_code {
    pub const REPLY_SUCCESS: u16 = 200;
    pub const CONTENT_TOO_LARGE: u16 = 311;
    pub const NO_ROUTE: u16 = 312;
    pub const NO_CONSUMERS: u16 = 313;
    pub const CONNECTION_FORCED: u16 = 320;
    pub const INVALID_PATH: u16 = 402;
    pub const ACCESS_REFUSED: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const RESOURCE_LOCKED: u16 = 405;
    pub const PRECONDITION_FAILED: u16 = 406;
    pub const FRAME_ERROR: u16 = 501;
    pub const SYNTAX_ERROR: u16 = 502;
    pub const COMMAND_INVALID: u16 = 503;
    pub const CHANNEL_ERROR: u16 = 504;
    pub const UNEXPECTED_FRAME: u16 = 505;
    pub const RESOURCE_ERROR: u16 = 506;
    pub const NOT_ALLOWED: u16 = 530;
    pub const NOT_IMPLEMENTED: u16 = 540;
    pub const INTERNAL_ERROR: u16 = 541;

    /// Returns whether a reply code is a hard error (closes the whole
    /// connection rather than a single channel).
    pub fn is_hard_error(code: u16) -> bool {
        matches!(
            code,
            CONNECTION_FORCED
                | INVALID_PATH
                | FRAME_ERROR
                | SYNTAX_ERROR
                | COMMAND_INVALID
                | CHANNEL_ERROR
                | UNEXPECTED_FRAME
                | RESOURCE_ERROR
                | NOT_ALLOWED
                | NOT_IMPLEMENTED
                | INTERNAL_ERROR
        )
    }
}

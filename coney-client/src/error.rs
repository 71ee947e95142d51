//! Client error types.

use coney_protocol::ProtocolError;
use thiserror::Error;

/// Details of a `connection.close` or `channel.close` received from the
/// server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerException {
    /// Channel the close arrived on; 0 for a connection close.
    pub channel: u16,
    pub reply_code: u16,
    pub reply_text: String,
    /// Class and method of the request the server was rejecting, when the
    /// close is tied to one.
    pub class_id: u16,
    pub method_id: u16,
}

impl ServerException {
    /// True when the server closed the whole connection rather than a
    /// single channel.
    pub fn is_connection_close(&self) -> bool {
        self.channel == 0
    }
}

impl std::fmt::Display for ServerException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "channel {}: {} {}",
            self.channel, self.reply_code, self.reply_text
        )
    }
}

/// Client errors.
///
/// An RPC has a three-way outcome: `Ok(method)` for a normal reply,
/// [`ClientError::Server`] when the peer actively rejected the request,
/// and any other variant when the engine itself failed.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("request timeout")]
    Timeout,

    #[error("heartbeat timeout: no data from peer within twice the heartbeat interval")]
    HeartbeatTimeout,

    #[error("server speaks protocol {major}.{minor}, expected 0.9")]
    VersionMismatch { major: u8, minor: u8 },

    #[error("mechanism {requested:?} not offered by server (offers: {offered})")]
    UnsupportedMechanism { requested: String, offered: String },

    #[error("server exception on {0}")]
    Server(ServerException),

    #[error("unexpected frame: {0}")]
    UnexpectedFrame(String),

    #[error("no free channel id below channel-max {0}")]
    ChannelLimit(u16),

    #[error("invalid connection URL: {0}")]
    UrlParse(String),

    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),
}

impl ClientError {
    /// Returns whether the connection must be discarded after this error.
    ///
    /// A plain RPC timeout leaves the connection open; everything that
    /// corrupts or closes the frame stream does not.
    pub fn is_fatal(&self) -> bool {
        match self {
            ClientError::Timeout => false,
            ClientError::ChannelLimit(_) => false,
            ClientError::UrlParse(_) | ClientError::TlsConfig(_) => false,
            // A channel-level exception only kills that channel.
            ClientError::Server(e) => e.is_connection_close(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_exception() -> ClientError {
        ClientError::Server(ServerException {
            channel: 1,
            reply_code: 404,
            reply_text: "NOT_FOUND".into(),
            class_id: 50,
            method_id: 10,
        })
    }

    #[test]
    fn test_fatal_classification() {
        assert!(!ClientError::Timeout.is_fatal());
        assert!(!ClientError::ChannelLimit(2047).is_fatal());
        assert!(!channel_exception().is_fatal());

        assert!(ClientError::HeartbeatTimeout.is_fatal());
        assert!(ClientError::ConnectionClosed.is_fatal());
        assert!(ClientError::Server(ServerException {
            channel: 0,
            reply_code: 320,
            reply_text: "CONNECTION_FORCED".into(),
            class_id: 0,
            method_id: 0,
        })
        .is_fatal());
    }

    #[test]
    fn test_display_includes_server_fields() {
        let msg = channel_exception().to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("channel 1"));
    }
}

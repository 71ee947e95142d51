//! # coney-client
//!
//! AMQP 0-9-1 connection engine for coney.
//!
//! This crate provides:
//! - An async connection with the full login handshake and tuning
//! - Synchronous RPC over the multiplexed frame stream
//! - Heartbeat scheduling folded into every blocking wait
//! - Per-channel buffer pools and channel lifecycle
//! - Optional TLS support

pub mod auth;
pub mod connection;
pub mod deadline;
pub mod error;
pub mod stream;
pub mod tls;
pub mod url;

pub use auth::Credentials;
pub use connection::{Connection, ConnectionConfig, TuneSettings};
pub use deadline::Deadline;
pub use error::{ClientError, ServerException};
pub use tls::TlsConfig;
pub use crate::url::{AmqpUrl, Scheme};

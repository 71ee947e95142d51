//! Connection engine.
//!
//! A connection exclusively owns its transport and runs as a
//! single-threaded cooperative state machine: every operation is
//! synchronous-with-timeout from the caller's point of view, and the only
//! suspension points are the wait-for-frame and socket-readiness awaits.
//! There is no internal locking because there is no internal concurrency.

use crate::auth::Credentials;
use crate::deadline::Deadline;
use crate::error::{ClientError, ServerException};
use crate::stream::Transport;
use crate::tls::{create_connector, TlsConfig};
use crate::url::AmqpUrl;
use bytes::{Buf, Bytes, BytesMut};
use coney_protocol::frame::FRAME_OVERHEAD;
use coney_protocol::method::{
    ChannelClose, ChannelCloseOk, ChannelOpen, ChannelOpenOk, ConnectionClose, ConnectionCloseOk,
    ConnectionOpen, ConnectionStartOk, ConnectionTuneOk,
};
use coney_protocol::{
    reply_code, ChannelPools, ContentHeader, FieldValue, Frame, FrameReader, Method, ProtocolError,
    Table, BasicProperties, DEFAULT_FRAME_MAX, PROTOCOL_HEADER, VERSION_MAJOR, VERSION_MINOR,
};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;

/// Default read buffer size (8 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Minimum read buffer size (1 KiB).
pub const MIN_READ_BUFFER_SIZE: usize = 1024;

/// Maximum read buffer size (1 MiB).
pub const MAX_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server hostname, also used for TLS SNI.
    pub host: String,
    pub port: u16,
    pub vhost: String,
    pub credentials: Credentials,
    pub locale: String,
    /// Proposed channel-max; 0 means no preference.
    pub channel_max: u16,
    /// Proposed frame-max; 0 means no preference.
    pub frame_max: u32,
    /// Proposed heartbeat interval in seconds; 0 disables heartbeats.
    pub heartbeat: u16,
    /// Extra client properties, deep-merged over the defaults.
    pub client_properties: Table,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Bound on the whole login sequence.
    pub handshake_timeout: Duration,
    /// Per-RPC timeout; `None` waits indefinitely.
    pub rpc_timeout: Option<Duration>,
    /// Read buffer size for socket reads.
    pub read_buffer_size: usize,
    /// TLS configuration (optional).
    pub tls: Option<TlsConfig>,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            vhost: "/".to_string(),
            credentials: Credentials::default(),
            locale: "en_US".to_string(),
            channel_max: 2047,
            frame_max: DEFAULT_FRAME_MAX,
            heartbeat: 60,
            client_properties: Table::new(),
            connect_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(10),
            rpc_timeout: Some(Duration::from_secs(30)),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            tls: None,
        }
    }

    /// Builds a configuration from a connection URL; the scheme selects
    /// TLS and the default port.
    pub fn from_url(input: &str) -> Result<Self, ClientError> {
        let url = AmqpUrl::parse(input)?;
        let mut config = Self::new(url.host, url.port)
            .with_vhost(url.vhost)
            .with_credentials(Credentials::plain(url.username, url.password));
        if url.scheme.is_tls() {
            config.tls = Some(TlsConfig::new());
        }
        Ok(config)
    }

    pub fn with_vhost(mut self, vhost: impl Into<String>) -> Self {
        self.vhost = vhost.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_channel_max(mut self, channel_max: u16) -> Self {
        self.channel_max = channel_max;
        self
    }

    pub fn with_frame_max(mut self, frame_max: u32) -> Self {
        self.frame_max = frame_max;
        self
    }

    pub fn with_heartbeat(mut self, seconds: u16) -> Self {
        self.heartbeat = seconds;
        self
    }

    pub fn with_client_properties(mut self, properties: Table) -> Self {
        self.client_properties = properties;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_rpc_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.clamp(MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE);
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }
}

/// Values negotiated during the tune exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuneSettings {
    pub channel_max: u16,
    /// 0 means no limit was negotiated.
    pub frame_max: u32,
    /// Heartbeat interval in seconds; 0 means heartbeats are off.
    pub heartbeat: u16,
}

/// Minimum of two proposals where zero means "no preference".
fn negotiate_max(client: u32, server: u32) -> u32 {
    if client == 0 || server == 0 {
        client.max(server)
    } else {
        client.min(server)
    }
}

/// Which of the composed timers fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Caller,
    SendHeartbeat,
    RecvHeartbeat,
}

async fn sleep_until_opt(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

fn describe(frame: &Frame) -> String {
    match frame {
        Frame::Method { channel, method } => {
            format!("{} on channel {}", method.name(), channel)
        }
        Frame::Header { channel, .. } => format!("content header on channel {channel}"),
        Frame::Body { channel, .. } => format!("body fragment on channel {channel}"),
        Frame::Heartbeat { .. } => "heartbeat".to_string(),
        Frame::ProtocolHeader { major, minor, .. } => {
            format!("protocol header {major}.{minor}")
        }
    }
}

fn default_client_properties() -> Table {
    let mut capabilities = Table::new();
    capabilities.insert("authentication_failure_close", FieldValue::Boolean(true));
    capabilities.insert("basic.nack", FieldValue::Boolean(true));
    capabilities.insert("connection.blocked", FieldValue::Boolean(true));
    capabilities.insert("consumer_cancel_notify", FieldValue::Boolean(true));
    capabilities.insert("publisher_confirms", FieldValue::Boolean(true));

    let mut properties = Table::new();
    properties.insert("capabilities", FieldValue::Table(capabilities));
    properties.insert("product", FieldValue::LongString("coney".into()));
    properties.insert(
        "version",
        FieldValue::LongString(env!("CARGO_PKG_VERSION").into()),
    );
    properties.insert("platform", FieldValue::LongString("Rust".into()));
    properties.insert(
        "information",
        FieldValue::LongString("https://github.com/coney-rs/coney".into()),
    );
    properties
}

/// A connection to an AMQP 0-9-1 server.
#[derive(Debug)]
pub struct Connection {
    config: ConnectionConfig,
    transport: Transport,
    reader: FrameReader,
    pools: ChannelPools,
    /// Raw bytes read from the socket, not yet parsed.
    inbuf: BytesMut,
    read_buf: Vec<u8>,
    /// Frames received out of turn, in arrival order.
    pending: VecDeque<Frame>,
    tune: TuneSettings,
    server_properties: Table,
    next_heartbeat_send: Deadline,
    heartbeat_recv_by: Deadline,
    channels: HashSet<u16>,
    open: bool,
}

impl Connection {
    /// Connects, performs the login sequence, and returns an open
    /// connection. Any close received mid-handshake short-circuits into a
    /// server exception and the socket is force-closed.
    pub async fn open(config: ConnectionConfig) -> Result<Self, ClientError> {
        tracing::debug!(host = %config.host, port = config.port, "connecting");
        let tcp = tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| ClientError::Timeout)??;
        tcp.set_nodelay(true).ok();

        let transport = match &config.tls {
            Some(tls) => {
                let (connector, server_name) = create_connector(tls, &config.host)?;
                tracing::debug!("performing TLS handshake");
                let stream = connector
                    .connect(server_name, tcp)
                    .await
                    .map_err(|e| ClientError::TlsHandshake(e.to_string()))?;
                Transport::Tls { stream }
            }
            None => Transport::Plain { stream: tcp },
        };

        let reader = FrameReader::new(config.frame_max);
        let read_buffer_size = config
            .read_buffer_size
            .clamp(MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE);
        let mut conn = Self {
            transport,
            reader,
            pools: ChannelPools::default(),
            inbuf: BytesMut::with_capacity(read_buffer_size),
            read_buf: vec![0u8; read_buffer_size],
            pending: VecDeque::new(),
            tune: TuneSettings {
                channel_max: 0,
                frame_max: config.frame_max,
                heartbeat: 0,
            },
            server_properties: Table::new(),
            next_heartbeat_send: Deadline::Never,
            heartbeat_recv_by: Deadline::Never,
            channels: HashSet::new(),
            open: false,
            config,
        };

        match conn.login().await {
            Ok(()) => Ok(conn),
            Err(e) => {
                conn.force_close().await;
                Err(e)
            }
        }
    }

    /// Runs the login sequence: protocol header, start/start-ok,
    /// tune/tune-ok, open/open-ok.
    async fn login(&mut self) -> Result<(), ClientError> {
        let deadline = Deadline::after(Some(self.config.handshake_timeout));

        self.transport.write_all(&PROTOCOL_HEADER).await?;
        self.transport.flush().await?;

        let start = match self.recv_frame(deadline).await? {
            Frame::Method {
                channel: 0,
                method: Method::ConnectionStart(m),
            } => m,
            Frame::ProtocolHeader { major, minor, .. } => {
                return Err(ClientError::VersionMismatch { major, minor })
            }
            Frame::Method {
                channel: 0,
                method: Method::ConnectionClose(m),
            } => return Err(self.connection_exception(m)),
            other => return Err(ClientError::UnexpectedFrame(describe(&other))),
        };

        if start.version_major != VERSION_MAJOR || start.version_minor != VERSION_MINOR {
            return Err(ClientError::VersionMismatch {
                major: start.version_major,
                minor: start.version_minor,
            });
        }

        let mechanism = self.config.credentials.mechanism();
        let offered = String::from_utf8_lossy(&start.mechanisms).into_owned();
        if !offered.split_whitespace().any(|m| m == mechanism) {
            return Err(ClientError::UnsupportedMechanism {
                requested: mechanism.to_string(),
                offered,
            });
        }
        self.server_properties = start.server_properties;

        let client_properties = Table::deep_merge(
            &default_client_properties(),
            &self.config.client_properties,
        );
        let start_ok = ConnectionStartOk {
            client_properties,
            mechanism: mechanism.to_string(),
            response: self.config.credentials.response(),
            locale: self.config.locale.clone(),
        };
        self.send_method(0, Method::ConnectionStartOk(start_ok))
            .await?;

        let tune = match self.recv_frame(deadline).await? {
            Frame::Method {
                channel: 0,
                method: Method::ConnectionTune(m),
            } => m,
            Frame::Method {
                channel: 0,
                method: Method::ConnectionClose(m),
            } => return Err(self.connection_exception(m)),
            other => return Err(ClientError::UnexpectedFrame(describe(&other))),
        };

        let mut channel_max =
            negotiate_max(self.config.channel_max as u32, tune.channel_max as u32) as u16;
        if channel_max == 0 {
            channel_max = u16::MAX;
        }
        let frame_max = negotiate_max(self.config.frame_max, tune.frame_max);
        let heartbeat = negotiate_max(self.config.heartbeat as u32, tune.heartbeat as u32) as u16;
        self.tune = TuneSettings {
            channel_max,
            frame_max,
            heartbeat,
        };
        self.reader.set_frame_max(frame_max);
        tracing::debug!(channel_max, frame_max, heartbeat, "tuned");

        self.send_method(
            0,
            Method::ConnectionTuneOk(ConnectionTuneOk {
                channel_max,
                frame_max,
                heartbeat,
            }),
        )
        .await?;
        self.reset_heartbeat_schedule();

        self.send_method(
            0,
            Method::ConnectionOpen(ConnectionOpen {
                virtual_host: self.config.vhost.clone(),
            }),
        )
        .await?;
        match self.recv_frame(deadline).await? {
            Frame::Method {
                channel: 0,
                method: Method::ConnectionOpenOk(_),
            } => {}
            Frame::Method {
                channel: 0,
                method: Method::ConnectionClose(m),
            } => return Err(self.connection_exception(m)),
            other => return Err(ClientError::UnexpectedFrame(describe(&other))),
        }

        self.open = true;
        tracing::debug!(vhost = %self.config.vhost, "connection open");
        Ok(())
    }

    // =========================================================================
    // Frame transmission
    // =========================================================================

    async fn send_frame(&mut self, frame: &Frame) -> Result<(), ClientError> {
        let mut buf = BytesMut::new();
        frame.encode(&mut buf)?;
        if self.tune.frame_max > 0 && buf.len() > self.tune.frame_max as usize {
            return Err(ClientError::Protocol(ProtocolError::FrameTooLarge {
                size: buf.len(),
                max: self.tune.frame_max as usize,
            }));
        }
        self.transport.write_all(&buf).await?;
        self.transport.flush().await?;
        self.bump_send_schedule();
        Ok(())
    }

    /// Sends a method frame without waiting for anything.
    pub async fn send_method(&mut self, channel: u16, method: Method) -> Result<(), ClientError> {
        tracing::trace!(channel, method = method.name(), "send");
        self.send_frame(&Frame::Method { channel, method }).await
    }

    /// Sends a content-bearing method followed by its header and body,
    /// splitting the body to the negotiated frame-max payload capacity.
    pub async fn send_content(
        &mut self,
        channel: u16,
        method: Method,
        properties: BasicProperties,
        body: &[u8],
    ) -> Result<(), ClientError> {
        self.send_method(channel, method).await?;
        let header = ContentHeader::new(body.len() as u64, properties);
        self.send_frame(&Frame::Header { channel, header }).await?;

        let max_payload = match self.tune.frame_max {
            0 => body.len(),
            frame_max => (frame_max as usize).saturating_sub(FRAME_OVERHEAD),
        };
        for chunk in body.chunks(max_payload.max(1)) {
            self.send_frame(&Frame::Body {
                channel,
                payload: Bytes::copy_from_slice(chunk),
            })
            .await?;
        }
        Ok(())
    }

    // =========================================================================
    // Frame reception
    // =========================================================================

    /// Receives the next non-heartbeat frame, bounded by the earliest of
    /// the caller deadline, the next heartbeat send, and the heartbeat
    /// receive cutoff.
    async fn recv_frame(&mut self, caller: Deadline) -> Result<Frame, ClientError> {
        loop {
            while !self.inbuf.is_empty() {
                let step = self.reader.feed(&self.inbuf, &mut self.pools);
                let (consumed, frame) = match step {
                    Ok(v) => v,
                    Err(e) => {
                        // Malformed wire data is unrecoverable.
                        self.force_close().await;
                        return Err(e.into());
                    }
                };
                self.inbuf.advance(consumed);
                match frame {
                    Some(Frame::Heartbeat { .. }) => {
                        tracing::trace!("heartbeat received");
                    }
                    Some(frame) => return Ok(frame),
                    None => {}
                }
            }

            let (wake_at, wake_kind) = self.next_wake(caller);
            let read = tokio::select! {
                r = self.transport.read(&mut self.read_buf) => Some(r?),
                _ = sleep_until_opt(wake_at.instant()) => None,
            };
            match read {
                Some(0) => {
                    self.open = false;
                    return Err(ClientError::ConnectionClosed);
                }
                Some(n) => {
                    self.bump_recv_deadline();
                    self.inbuf.extend_from_slice(&self.read_buf[..n]);
                }
                None => match wake_kind {
                    Wake::Caller => return Err(ClientError::Timeout),
                    Wake::SendHeartbeat => {
                        tracing::trace!("heartbeat sent");
                        self.send_frame(&Frame::Heartbeat { channel: 0 }).await?;
                    }
                    Wake::RecvHeartbeat => {
                        tracing::debug!("no data within twice the heartbeat interval");
                        self.force_close().await;
                        return Err(ClientError::HeartbeatTimeout);
                    }
                },
            }
        }
    }

    fn next_wake(&self, caller: Deadline) -> (Deadline, Wake) {
        let mut wake = (caller, Wake::Caller);
        if self.next_heartbeat_send < wake.0 {
            wake = (self.next_heartbeat_send, Wake::SendHeartbeat);
        }
        if self.heartbeat_recv_by < wake.0 {
            wake = (self.heartbeat_recv_by, Wake::RecvHeartbeat);
        }
        wake
    }

    fn reset_heartbeat_schedule(&mut self) {
        self.bump_send_schedule();
        self.bump_recv_deadline();
    }

    fn bump_send_schedule(&mut self) {
        self.next_heartbeat_send = match self.tune.heartbeat {
            0 => Deadline::Never,
            secs => Deadline::At(Instant::now() + Duration::from_secs(secs as u64)),
        };
    }

    fn bump_recv_deadline(&mut self) {
        self.heartbeat_recv_by = match self.tune.heartbeat {
            0 => Deadline::Never,
            secs => Deadline::At(Instant::now() + Duration::from_secs(2 * secs as u64)),
        };
    }

    // =========================================================================
    // Synchronous RPC over the multiplexed stream
    // =========================================================================

    /// A frame answers a wait on `channel` iff it is on that channel and
    /// (when ids are expected) is one of the expected methods or a channel
    /// close — or it is a connection close on channel 0. Everything else
    /// is queued for a later wait.
    fn is_answer(frame: &Frame, channel: u16, expected: Option<&[u32]>) -> bool {
        match frame {
            Frame::Method {
                channel: 0, method, ..
            } if method.is_connection_close() => true,
            Frame::Method {
                channel: frame_channel,
                method,
            } if *frame_channel == channel => match expected {
                Some(ids) => ids.contains(&method.id()) || method.is_channel_close(),
                None => true,
            },
            Frame::Header {
                channel: frame_channel,
                ..
            }
            | Frame::Body {
                channel: frame_channel,
                ..
            } if *frame_channel == channel => expected.is_none(),
            _ => false,
        }
    }

    fn take_pending(&mut self, channel: u16, expected: Option<&[u32]>) -> Option<Frame> {
        let pos = self
            .pending
            .iter()
            .position(|f| Self::is_answer(f, channel, expected))?;
        self.pending.remove(pos)
    }

    async fn wait_matching(
        &mut self,
        channel: u16,
        expected: Option<&[u32]>,
        deadline: Deadline,
    ) -> Result<Frame, ClientError> {
        if let Some(frame) = self.take_pending(channel, expected) {
            return Ok(frame);
        }
        loop {
            let frame = self.recv_frame(deadline).await?;
            if Self::is_answer(&frame, channel, expected) {
                return Ok(frame);
            }
            tracing::trace!(
                channel = frame.channel(),
                frame = %describe(&frame),
                "queueing out-of-turn frame"
            );
            self.pending.push_back(frame);
        }
    }

    /// Converts received close methods into server exceptions, replying
    /// with the matching close-ok first so the peer never stalls.
    async fn check_close(&mut self, frame: Frame) -> Result<Frame, ClientError> {
        match frame {
            Frame::Method {
                channel: 0,
                method: Method::ConnectionClose(m),
            } => {
                let _ = self
                    .send_method(0, Method::ConnectionCloseOk(ConnectionCloseOk {}))
                    .await;
                self.force_close().await;
                Err(self.connection_exception(m))
            }
            Frame::Method {
                channel,
                method: Method::ChannelClose(m),
            } => {
                let _ = self
                    .send_method(channel, Method::ChannelCloseOk(ChannelCloseOk {}))
                    .await;
                self.channels.remove(&channel);
                self.pools.remove(channel);
                Err(ClientError::Server(ServerException {
                    channel,
                    reply_code: m.reply_code,
                    reply_text: m.reply_text,
                    class_id: m.class_id,
                    method_id: m.method_id,
                }))
            }
            other => Ok(other),
        }
    }

    fn connection_exception(&self, m: ConnectionClose) -> ClientError {
        ClientError::Server(ServerException {
            channel: 0,
            reply_code: m.reply_code,
            reply_text: m.reply_text,
            class_id: m.class_id,
            method_id: m.method_id,
        })
    }

    /// Sends a request method and waits for one of the expected replies on
    /// the same channel.
    ///
    /// Frames for other channels arriving in between are queued, never
    /// dropped, preserving their per-channel order; heartbeats never
    /// surface here.
    pub async fn rpc(
        &mut self,
        channel: u16,
        request: Method,
        expected: &[u32],
    ) -> Result<Method, ClientError> {
        if !self.open {
            return Err(ClientError::ConnectionClosed);
        }
        let deadline = Deadline::after(self.config.rpc_timeout);
        self.send_method(channel, request).await?;
        let frame = self.wait_matching(channel, Some(expected), deadline).await?;
        let frame = self.check_close(frame).await?;
        match frame {
            Frame::Method { method, .. } => Ok(method),
            other => Err(ClientError::UnexpectedFrame(describe(&other))),
        }
    }

    /// Returns the next frame on a channel: a queued one first, else the
    /// next from the wire. Deliveries, content headers, and body
    /// fragments all arrive through here in order.
    pub async fn wait_frame(
        &mut self,
        channel: u16,
        timeout: Option<Duration>,
    ) -> Result<Frame, ClientError> {
        let deadline = Deadline::after(timeout);
        let frame = self.wait_matching(channel, None, deadline).await?;
        self.check_close(frame).await
    }

    // =========================================================================
    // Channel lifecycle
    // =========================================================================

    /// Opens the lowest free channel id and returns it.
    pub async fn open_channel(&mut self) -> Result<u16, ClientError> {
        let channel = (1..=self.tune.channel_max)
            .find(|id| !self.channels.contains(id))
            .ok_or(ClientError::ChannelLimit(self.tune.channel_max))?;
        self.rpc(
            channel,
            Method::ChannelOpen(ChannelOpen {}),
            &[ChannelOpenOk::ID],
        )
        .await?;
        self.channels.insert(channel);
        tracing::debug!(channel, "channel open");
        Ok(channel)
    }

    pub async fn close_channel(&mut self, channel: u16) -> Result<(), ClientError> {
        self.rpc(
            channel,
            Method::ChannelClose(ChannelClose {
                reply_code: reply_code::REPLY_SUCCESS,
                reply_text: "OK".to_string(),
                class_id: 0,
                method_id: 0,
            }),
            &[ChannelCloseOk::ID],
        )
        .await?;
        self.channels.remove(&channel);
        self.pools.remove(channel);
        tracing::debug!(channel, "channel closed");
        Ok(())
    }

    pub fn is_channel_open(&self, channel: u16) -> bool {
        self.channels.contains(&channel)
    }

    /// Recycles every channel pool, provided no decoded frames are still
    /// queued.
    pub fn recycle_buffers(&mut self) {
        if self.pending.is_empty() {
            self.pools.recycle_all();
        }
    }

    /// Recycles one channel's pool, provided none of its frames are still
    /// queued.
    pub fn recycle_channel_buffers(&mut self, channel: u16) {
        if !self.pending.iter().any(|f| f.channel() == channel) {
            self.pools.recycle_channel(channel);
        }
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Graceful close: connection.close RPC, then transport shutdown.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        if !self.open {
            return Ok(());
        }
        tracing::debug!("closing connection");
        let result = self
            .rpc(
                0,
                Method::ConnectionClose(ConnectionClose {
                    reply_code: reply_code::REPLY_SUCCESS,
                    reply_text: "OK".to_string(),
                    class_id: 0,
                    method_id: 0,
                }),
                &[ConnectionCloseOk::ID],
            )
            .await;
        self.force_close().await;
        result.map(|_| ())
    }

    /// Drops the transport immediately. Queued frames and pools stay
    /// readable until the connection itself is dropped.
    pub async fn force_close(&mut self) {
        if self.open {
            tracing::debug!("force closing transport");
        }
        self.open = false;
        let _ = self.transport.shutdown().await;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The channel-max/frame-max/heartbeat agreed during tuning.
    pub fn tune_settings(&self) -> TuneSettings {
        self.tune
    }

    /// The server-properties table from `connection.start`.
    pub fn server_properties(&self) -> &Table {
        &self.server_properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coney_protocol::method::QueueDeclareOk;

    #[test]
    fn test_negotiate_max() {
        assert_eq!(negotiate_max(5, 3), 3);
        assert_eq!(negotiate_max(3, 5), 3);
        assert_eq!(negotiate_max(0, 8), 8);
        assert_eq!(negotiate_max(8, 0), 8);
        assert_eq!(negotiate_max(0, 0), 0);
    }

    #[test]
    fn test_channel_max_both_zero_resolves_to_max() {
        // The engine maps a 0/0 channel-max negotiation to the maximum
        // representable channel count.
        let mut channel_max = negotiate_max(0, 0) as u16;
        if channel_max == 0 {
            channel_max = u16::MAX;
        }
        assert_eq!(channel_max, 65_535);
    }

    #[test]
    fn test_config_defaults_and_clamping() {
        let config = ConnectionConfig::new("localhost", 5672);
        assert_eq!(config.vhost, "/");
        assert_eq!(config.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
        assert_eq!(config.heartbeat, 60);

        let config = config.with_read_buffer_size(100);
        assert_eq!(config.read_buffer_size, MIN_READ_BUFFER_SIZE);
        let config = config.with_read_buffer_size(10 * 1024 * 1024);
        assert_eq!(config.read_buffer_size, MAX_READ_BUFFER_SIZE);
    }

    #[test]
    fn test_config_from_url() {
        let config = ConnectionConfig::from_url("amqps://bob:pw@mq.example.com/prod").unwrap();
        assert_eq!(config.host, "mq.example.com");
        assert_eq!(config.port, 5671);
        assert_eq!(config.vhost, "prod");
        assert!(config.tls.is_some());
        assert_eq!(config.credentials, Credentials::plain("bob", "pw"));

        let config = ConnectionConfig::from_url("amqp://mq.example.com").unwrap();
        assert!(config.tls.is_none());
        assert_eq!(config.port, 5672);
    }

    #[test]
    fn test_default_properties_merge() {
        let mut extra_caps = Table::new();
        extra_caps.insert("publisher_confirms", FieldValue::Boolean(false));
        let mut extras = Table::new();
        extras.insert("product", FieldValue::LongString("my-app".into()));
        extras.insert("capabilities", FieldValue::Table(extra_caps));

        let merged = Table::deep_merge(&default_client_properties(), &extras);
        assert_eq!(
            merged.get("product"),
            Some(&FieldValue::LongString("my-app".into()))
        );
        // Nested capability tables merge rather than replace.
        match merged.get("capabilities") {
            Some(FieldValue::Table(caps)) => {
                assert_eq!(
                    caps.get("publisher_confirms"),
                    Some(&FieldValue::Boolean(false))
                );
                assert_eq!(caps.get("basic.nack"), Some(&FieldValue::Boolean(true)));
            }
            other => panic!("expected capabilities table, got {:?}", other),
        }
        // Defaults that were not overridden survive.
        assert_eq!(
            merged.get("platform"),
            Some(&FieldValue::LongString("Rust".into()))
        );
    }

    fn method_frame(channel: u16) -> Frame {
        Frame::Method {
            channel,
            method: Method::QueueDeclareOk(QueueDeclareOk {
                queue: "q".into(),
                message_count: 0,
                consumer_count: 0,
            }),
        }
    }

    #[test]
    fn test_answer_predicate() {
        let reply = method_frame(1);
        assert!(Connection::is_answer(
            &reply,
            1,
            Some(&[QueueDeclareOk::ID])
        ));
        // Same channel, unexpected method: not an answer for an RPC wait.
        assert!(!Connection::is_answer(&reply, 1, Some(&[ChannelOpenOk::ID])));
        // Different channel: never an answer.
        assert!(!Connection::is_answer(
            &reply,
            2,
            Some(&[QueueDeclareOk::ID])
        ));
        // Plain wait takes any frame on its channel.
        assert!(Connection::is_answer(&reply, 1, None));

        let close = Frame::Method {
            channel: 1,
            method: Method::ChannelClose(ChannelClose::default()),
        };
        assert!(Connection::is_answer(&close, 1, Some(&[QueueDeclareOk::ID])));

        let conn_close = Frame::Method {
            channel: 0,
            method: Method::ConnectionClose(ConnectionClose::default()),
        };
        // Connection close answers a wait on any channel.
        assert!(Connection::is_answer(
            &conn_close,
            5,
            Some(&[QueueDeclareOk::ID])
        ));
        assert!(Connection::is_answer(&conn_close, 5, None));

        let body = Frame::Body {
            channel: 1,
            payload: Bytes::from_static(b"x"),
        };
        assert!(Connection::is_answer(&body, 1, None));
        assert!(!Connection::is_answer(&body, 1, Some(&[QueueDeclareOk::ID])));
    }
}

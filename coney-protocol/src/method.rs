//! Method codec.
//!
//! A method's numeric id packs the class id into the high 16 bits and the
//! method id into the low 16 bits. The literal values below are the wire
//! contract and are written out exactly, never derived.
//!
//! Consecutive boolean fields of one method share a single octet, one bit
//! per field in declaration order; the encoder and decoder must agree on
//! the bit positions exactly.

use crate::codec::{
    put_longstr, put_shortstr, take_longstr, take_shortstr, take_u16, take_u32, take_u64, take_u8,
};
use crate::error::ProtocolError;
use crate::field::{decode_table, encode_table, Table};
use bytes::{BufMut, Bytes, BytesMut};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionStart {
    pub version_major: u8,
    pub version_minor: u8,
    pub server_properties: Table,
    /// Space-separated list of SASL mechanism names.
    pub mechanisms: Bytes,
    pub locales: Bytes,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionStartOk {
    pub client_properties: Table,
    pub mechanism: String,
    /// Mechanism-specific credential blob.
    pub response: Bytes,
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionSecure {
    pub challenge: Bytes,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionSecureOk {
    pub response: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionTune {
    pub channel_max: u16,
    pub frame_max: u32,
    pub heartbeat: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionTuneOk {
    pub channel_max: u16,
    pub frame_max: u32,
    pub heartbeat: u16,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionOpen {
    pub virtual_host: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionOpenOk {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionClose {
    pub reply_code: u16,
    pub reply_text: String,
    /// Class and method of the request that provoked the close, zero when
    /// the close is not tied to a specific method.
    pub class_id: u16,
    pub method_id: u16,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionCloseOk {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionBlocked {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionUnblocked {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelOpen {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelOpenOk {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelFlow {
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelFlowOk {
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelClose {
    pub reply_code: u16,
    pub reply_text: String,
    pub class_id: u16,
    pub method_id: u16,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelCloseOk {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExchangeDeclare {
    pub exchange: String,
    /// Exchange type, e.g. `direct`, `fanout`, `topic`.
    pub kind: String,
    pub passive: bool,
    pub durable: bool,
    pub auto_delete: bool,
    pub internal: bool,
    pub no_wait: bool,
    pub arguments: Table,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExchangeDeclareOk {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExchangeDelete {
    pub exchange: String,
    pub if_unused: bool,
    pub no_wait: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExchangeDeleteOk {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExchangeBind {
    pub destination: String,
    pub source: String,
    pub routing_key: String,
    pub no_wait: bool,
    pub arguments: Table,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExchangeBindOk {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExchangeUnbind {
    pub destination: String,
    pub source: String,
    pub routing_key: String,
    pub no_wait: bool,
    pub arguments: Table,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExchangeUnbindOk {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueDeclare {
    pub queue: String,
    pub passive: bool,
    pub durable: bool,
    pub exclusive: bool,
    pub auto_delete: bool,
    pub no_wait: bool,
    pub arguments: Table,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueDeclareOk {
    pub queue: String,
    pub message_count: u32,
    pub consumer_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueBind {
    pub queue: String,
    pub exchange: String,
    pub routing_key: String,
    pub no_wait: bool,
    pub arguments: Table,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueBindOk {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueuePurge {
    pub queue: String,
    pub no_wait: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueuePurgeOk {
    pub message_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueDelete {
    pub queue: String,
    pub if_unused: bool,
    pub if_empty: bool,
    pub no_wait: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueDeleteOk {
    pub message_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueUnbind {
    pub queue: String,
    pub exchange: String,
    pub routing_key: String,
    pub arguments: Table,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueUnbindOk {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasicQos {
    pub prefetch_size: u32,
    pub prefetch_count: u16,
    pub global: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicQosOk {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicConsume {
    pub queue: String,
    pub consumer_tag: String,
    pub no_local: bool,
    pub no_ack: bool,
    pub exclusive: bool,
    pub no_wait: bool,
    pub arguments: Table,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicConsumeOk {
    pub consumer_tag: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicCancel {
    pub consumer_tag: String,
    pub no_wait: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicCancelOk {
    pub consumer_tag: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicPublish {
    pub exchange: String,
    pub routing_key: String,
    pub mandatory: bool,
    pub immediate: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicReturn {
    pub reply_code: u16,
    pub reply_text: String,
    pub exchange: String,
    pub routing_key: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicDeliver {
    pub consumer_tag: String,
    pub delivery_tag: u64,
    pub redelivered: bool,
    pub exchange: String,
    pub routing_key: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicGet {
    pub queue: String,
    pub no_ack: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicGetOk {
    pub delivery_tag: u64,
    pub redelivered: bool,
    pub exchange: String,
    pub routing_key: String,
    pub message_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicGetEmpty {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasicAck {
    pub delivery_tag: u64,
    pub multiple: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasicReject {
    pub delivery_tag: u64,
    pub requeue: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasicRecoverAsync {
    pub requeue: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasicRecover {
    pub requeue: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicRecoverOk {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasicNack {
    pub delivery_tag: u64,
    pub multiple: bool,
    pub requeue: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TxSelect {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TxSelectOk {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TxCommit {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TxCommitOk {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TxRollback {}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TxRollbackOk {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfirmSelect {
    pub no_wait: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfirmSelectOk {}

impl ConnectionStart {
    pub const ID: u32 = 0x000A_000A;
}
impl ConnectionStartOk {
    pub const ID: u32 = 0x000A_000B;
}
impl ConnectionSecure {
    pub const ID: u32 = 0x000A_0014;
}
impl ConnectionSecureOk {
    pub const ID: u32 = 0x000A_0015;
}
impl ConnectionTune {
    pub const ID: u32 = 0x000A_001E;
}
impl ConnectionTuneOk {
    pub const ID: u32 = 0x000A_001F;
}
impl ConnectionOpen {
    pub const ID: u32 = 0x000A_0028;
}
impl ConnectionOpenOk {
    pub const ID: u32 = 0x000A_0029;
}
impl ConnectionClose {
    pub const ID: u32 = 0x000A_0032;
}
impl ConnectionCloseOk {
    pub const ID: u32 = 0x000A_0033;
}
impl ConnectionBlocked {
    pub const ID: u32 = 0x000A_003C;
}
impl ConnectionUnblocked {
    pub const ID: u32 = 0x000A_003D;
}
impl ChannelOpen {
    pub const ID: u32 = 0x0014_000A;
}
impl ChannelOpenOk {
    pub const ID: u32 = 0x0014_000B;
}
impl ChannelFlow {
    pub const ID: u32 = 0x0014_0014;
}
impl ChannelFlowOk {
    pub const ID: u32 = 0x0014_0015;
}
impl ChannelClose {
    pub const ID: u32 = 0x0014_0028;
}
impl ChannelCloseOk {
    pub const ID: u32 = 0x0014_0029;
}
impl ExchangeDeclare {
    pub const ID: u32 = 0x0028_000A;
}
impl ExchangeDeclareOk {
    pub const ID: u32 = 0x0028_000B;
}
impl ExchangeDelete {
    pub const ID: u32 = 0x0028_0014;
}
impl ExchangeDeleteOk {
    pub const ID: u32 = 0x0028_0015;
}
impl ExchangeBind {
    pub const ID: u32 = 0x0028_001E;
}
impl ExchangeBindOk {
    pub const ID: u32 = 0x0028_001F;
}
impl ExchangeUnbind {
    pub const ID: u32 = 0x0028_0028;
}
impl ExchangeUnbindOk {
    pub const ID: u32 = 0x0028_0033;
}
impl QueueDeclare {
    pub const ID: u32 = 0x0032_000A;
}
impl QueueDeclareOk {
    pub const ID: u32 = 0x0032_000B;
}
impl QueueBind {
    pub const ID: u32 = 0x0032_0014;
}
impl QueueBindOk {
    pub const ID: u32 = 0x0032_0015;
}
impl QueuePurge {
    pub const ID: u32 = 0x0032_001E;
}
impl QueuePurgeOk {
    pub const ID: u32 = 0x0032_001F;
}
impl QueueDelete {
    pub const ID: u32 = 0x0032_0028;
}
impl QueueDeleteOk {
    pub const ID: u32 = 0x0032_0029;
}
impl QueueUnbind {
    pub const ID: u32 = 0x0032_0032;
}
impl QueueUnbindOk {
    pub const ID: u32 = 0x0032_0033;
}
impl BasicQos {
    pub const ID: u32 = 0x003C_000A;
}
impl BasicQosOk {
    pub const ID: u32 = 0x003C_000B;
}
impl BasicConsume {
    pub const ID: u32 = 0x003C_0014;
}
impl BasicConsumeOk {
    pub const ID: u32 = 0x003C_0015;
}
impl BasicCancel {
    pub const ID: u32 = 0x003C_001E;
}
impl BasicCancelOk {
    pub const ID: u32 = 0x003C_001F;
}
impl BasicPublish {
    pub const ID: u32 = 0x003C_0028;
}
impl BasicReturn {
    pub const ID: u32 = 0x003C_0032;
}
impl BasicDeliver {
    pub const ID: u32 = 0x003C_003C;
}
impl BasicGet {
    pub const ID: u32 = 0x003C_0046;
}
impl BasicGetOk {
    pub const ID: u32 = 0x003C_0047;
}
impl BasicGetEmpty {
    pub const ID: u32 = 0x003C_0048;
}
impl BasicAck {
    pub const ID: u32 = 0x003C_0050;
}
impl BasicReject {
    pub const ID: u32 = 0x003C_005A;
}
impl BasicRecoverAsync {
    pub const ID: u32 = 0x003C_0064;
}
impl BasicRecover {
    pub const ID: u32 = 0x003C_006E;
}
impl BasicRecoverOk {
    pub const ID: u32 = 0x003C_006F;
}
impl BasicNack {
    pub const ID: u32 = 0x003C_0078;
}
impl TxSelect {
    pub const ID: u32 = 0x005A_000A;
}
impl TxSelectOk {
    pub const ID: u32 = 0x005A_000B;
}
impl TxCommit {
    pub const ID: u32 = 0x005A_0014;
}
impl TxCommitOk {
    pub const ID: u32 = 0x005A_0015;
}
impl TxRollback {
    pub const ID: u32 = 0x005A_001E;
}
impl TxRollbackOk {
    pub const ID: u32 = 0x005A_001F;
}
impl ConfirmSelect {
    pub const ID: u32 = 0x0055_000A;
}
impl ConfirmSelectOk {
    pub const ID: u32 = 0x0055_000B;
}

/// A decoded method frame payload.
///
/// One variant per supported method, decoded exhaustively by id at parse
/// time.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    ConnectionStart(ConnectionStart),
    ConnectionStartOk(ConnectionStartOk),
    ConnectionSecure(ConnectionSecure),
    ConnectionSecureOk(ConnectionSecureOk),
    ConnectionTune(ConnectionTune),
    ConnectionTuneOk(ConnectionTuneOk),
    ConnectionOpen(ConnectionOpen),
    ConnectionOpenOk(ConnectionOpenOk),
    ConnectionClose(ConnectionClose),
    ConnectionCloseOk(ConnectionCloseOk),
    ConnectionBlocked(ConnectionBlocked),
    ConnectionUnblocked(ConnectionUnblocked),
    ChannelOpen(ChannelOpen),
    ChannelOpenOk(ChannelOpenOk),
    ChannelFlow(ChannelFlow),
    ChannelFlowOk(ChannelFlowOk),
    ChannelClose(ChannelClose),
    ChannelCloseOk(ChannelCloseOk),
    ExchangeDeclare(ExchangeDeclare),
    ExchangeDeclareOk(ExchangeDeclareOk),
    ExchangeDelete(ExchangeDelete),
    ExchangeDeleteOk(ExchangeDeleteOk),
    ExchangeBind(ExchangeBind),
    ExchangeBindOk(ExchangeBindOk),
    ExchangeUnbind(ExchangeUnbind),
    ExchangeUnbindOk(ExchangeUnbindOk),
    QueueDeclare(QueueDeclare),
    QueueDeclareOk(QueueDeclareOk),
    QueueBind(QueueBind),
    QueueBindOk(QueueBindOk),
    QueuePurge(QueuePurge),
    QueuePurgeOk(QueuePurgeOk),
    QueueDelete(QueueDelete),
    QueueDeleteOk(QueueDeleteOk),
    QueueUnbind(QueueUnbind),
    QueueUnbindOk(QueueUnbindOk),
    BasicQos(BasicQos),
    BasicQosOk(BasicQosOk),
    BasicConsume(BasicConsume),
    BasicConsumeOk(BasicConsumeOk),
    BasicCancel(BasicCancel),
    BasicCancelOk(BasicCancelOk),
    BasicPublish(BasicPublish),
    BasicReturn(BasicReturn),
    BasicDeliver(BasicDeliver),
    BasicGet(BasicGet),
    BasicGetOk(BasicGetOk),
    BasicGetEmpty(BasicGetEmpty),
    BasicAck(BasicAck),
    BasicReject(BasicReject),
    BasicRecoverAsync(BasicRecoverAsync),
    BasicRecover(BasicRecover),
    BasicRecoverOk(BasicRecoverOk),
    BasicNack(BasicNack),
    TxSelect(TxSelect),
    TxSelectOk(TxSelectOk),
    TxCommit(TxCommit),
    TxCommitOk(TxCommitOk),
    TxRollback(TxRollback),
    TxRollbackOk(TxRollbackOk),
    ConfirmSelect(ConfirmSelect),
    ConfirmSelectOk(ConfirmSelectOk),
}

impl Method {
    /// The packed class/method id of this method.
    pub fn id(&self) -> u32 {
        match self {
            Method::ConnectionStart(_) => ConnectionStart::ID,
            Method::ConnectionStartOk(_) => ConnectionStartOk::ID,
            Method::ConnectionSecure(_) => ConnectionSecure::ID,
            Method::ConnectionSecureOk(_) => ConnectionSecureOk::ID,
            Method::ConnectionTune(_) => ConnectionTune::ID,
            Method::ConnectionTuneOk(_) => ConnectionTuneOk::ID,
            Method::ConnectionOpen(_) => ConnectionOpen::ID,
            Method::ConnectionOpenOk(_) => ConnectionOpenOk::ID,
            Method::ConnectionClose(_) => ConnectionClose::ID,
            Method::ConnectionCloseOk(_) => ConnectionCloseOk::ID,
            Method::ConnectionBlocked(_) => ConnectionBlocked::ID,
            Method::ConnectionUnblocked(_) => ConnectionUnblocked::ID,
            Method::ChannelOpen(_) => ChannelOpen::ID,
            Method::ChannelOpenOk(_) => ChannelOpenOk::ID,
            Method::ChannelFlow(_) => ChannelFlow::ID,
            Method::ChannelFlowOk(_) => ChannelFlowOk::ID,
            Method::ChannelClose(_) => ChannelClose::ID,
            Method::ChannelCloseOk(_) => ChannelCloseOk::ID,
            Method::ExchangeDeclare(_) => ExchangeDeclare::ID,
            Method::ExchangeDeclareOk(_) => ExchangeDeclareOk::ID,
            Method::ExchangeDelete(_) => ExchangeDelete::ID,
            Method::ExchangeDeleteOk(_) => ExchangeDeleteOk::ID,
            Method::ExchangeBind(_) => ExchangeBind::ID,
            Method::ExchangeBindOk(_) => ExchangeBindOk::ID,
            Method::ExchangeUnbind(_) => ExchangeUnbind::ID,
            Method::ExchangeUnbindOk(_) => ExchangeUnbindOk::ID,
            Method::QueueDeclare(_) => QueueDeclare::ID,
            Method::QueueDeclareOk(_) => QueueDeclareOk::ID,
            Method::QueueBind(_) => QueueBind::ID,
            Method::QueueBindOk(_) => QueueBindOk::ID,
            Method::QueuePurge(_) => QueuePurge::ID,
            Method::QueuePurgeOk(_) => QueuePurgeOk::ID,
            Method::QueueDelete(_) => QueueDelete::ID,
            Method::QueueDeleteOk(_) => QueueDeleteOk::ID,
            Method::QueueUnbind(_) => QueueUnbind::ID,
            Method::QueueUnbindOk(_) => QueueUnbindOk::ID,
            Method::BasicQos(_) => BasicQos::ID,
            Method::BasicQosOk(_) => BasicQosOk::ID,
            Method::BasicConsume(_) => BasicConsume::ID,
            Method::BasicConsumeOk(_) => BasicConsumeOk::ID,
            Method::BasicCancel(_) => BasicCancel::ID,
            Method::BasicCancelOk(_) => BasicCancelOk::ID,
            Method::BasicPublish(_) => BasicPublish::ID,
            Method::BasicReturn(_) => BasicReturn::ID,
            Method::BasicDeliver(_) => BasicDeliver::ID,
            Method::BasicGet(_) => BasicGet::ID,
            Method::BasicGetOk(_) => BasicGetOk::ID,
            Method::BasicGetEmpty(_) => BasicGetEmpty::ID,
            Method::BasicAck(_) => BasicAck::ID,
            Method::BasicReject(_) => BasicReject::ID,
            Method::BasicRecoverAsync(_) => BasicRecoverAsync::ID,
            Method::BasicRecover(_) => BasicRecover::ID,
            Method::BasicRecoverOk(_) => BasicRecoverOk::ID,
            Method::BasicNack(_) => BasicNack::ID,
            Method::TxSelect(_) => TxSelect::ID,
            Method::TxSelectOk(_) => TxSelectOk::ID,
            Method::TxCommit(_) => TxCommit::ID,
            Method::TxCommitOk(_) => TxCommitOk::ID,
            Method::TxRollback(_) => TxRollback::ID,
            Method::TxRollbackOk(_) => TxRollbackOk::ID,
            Method::ConfirmSelect(_) => ConfirmSelect::ID,
            Method::ConfirmSelectOk(_) => ConfirmSelectOk::ID,
        }
    }

    /// The class half of the packed id.
    pub fn class_id(&self) -> u16 {
        (self.id() >> 16) as u16
    }

    /// The method half of the packed id.
    pub fn method_id(&self) -> u16 {
        (self.id() & 0xFFFF) as u16
    }

    pub fn is_connection_close(&self) -> bool {
        matches!(self, Method::ConnectionClose(_))
    }

    pub fn is_channel_close(&self) -> bool {
        matches!(self, Method::ChannelClose(_))
    }

    /// Human-readable `class.method` name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Method::ConnectionStart(_) => "connection.start",
            Method::ConnectionStartOk(_) => "connection.start-ok",
            Method::ConnectionSecure(_) => "connection.secure",
            Method::ConnectionSecureOk(_) => "connection.secure-ok",
            Method::ConnectionTune(_) => "connection.tune",
            Method::ConnectionTuneOk(_) => "connection.tune-ok",
            Method::ConnectionOpen(_) => "connection.open",
            Method::ConnectionOpenOk(_) => "connection.open-ok",
            Method::ConnectionClose(_) => "connection.close",
            Method::ConnectionCloseOk(_) => "connection.close-ok",
            Method::ConnectionBlocked(_) => "connection.blocked",
            Method::ConnectionUnblocked(_) => "connection.unblocked",
            Method::ChannelOpen(_) => "channel.open",
            Method::ChannelOpenOk(_) => "channel.open-ok",
            Method::ChannelFlow(_) => "channel.flow",
            Method::ChannelFlowOk(_) => "channel.flow-ok",
            Method::ChannelClose(_) => "channel.close",
            Method::ChannelCloseOk(_) => "channel.close-ok",
            Method::ExchangeDeclare(_) => "exchange.declare",
            Method::ExchangeDeclareOk(_) => "exchange.declare-ok",
            Method::ExchangeDelete(_) => "exchange.delete",
            Method::ExchangeDeleteOk(_) => "exchange.delete-ok",
            Method::ExchangeBind(_) => "exchange.bind",
            Method::ExchangeBindOk(_) => "exchange.bind-ok",
            Method::ExchangeUnbind(_) => "exchange.unbind",
            Method::ExchangeUnbindOk(_) => "exchange.unbind-ok",
            Method::QueueDeclare(_) => "queue.declare",
            Method::QueueDeclareOk(_) => "queue.declare-ok",
            Method::QueueBind(_) => "queue.bind",
            Method::QueueBindOk(_) => "queue.bind-ok",
            Method::QueuePurge(_) => "queue.purge",
            Method::QueuePurgeOk(_) => "queue.purge-ok",
            Method::QueueDelete(_) => "queue.delete",
            Method::QueueDeleteOk(_) => "queue.delete-ok",
            Method::QueueUnbind(_) => "queue.unbind",
            Method::QueueUnbindOk(_) => "queue.unbind-ok",
            Method::BasicQos(_) => "basic.qos",
            Method::BasicQosOk(_) => "basic.qos-ok",
            Method::BasicConsume(_) => "basic.consume",
            Method::BasicConsumeOk(_) => "basic.consume-ok",
            Method::BasicCancel(_) => "basic.cancel",
            Method::BasicCancelOk(_) => "basic.cancel-ok",
            Method::BasicPublish(_) => "basic.publish",
            Method::BasicReturn(_) => "basic.return",
            Method::BasicDeliver(_) => "basic.deliver",
            Method::BasicGet(_) => "basic.get",
            Method::BasicGetOk(_) => "basic.get-ok",
            Method::BasicGetEmpty(_) => "basic.get-empty",
            Method::BasicAck(_) => "basic.ack",
            Method::BasicReject(_) => "basic.reject",
            Method::BasicRecoverAsync(_) => "basic.recover-async",
            Method::BasicRecover(_) => "basic.recover",
            Method::BasicRecoverOk(_) => "basic.recover-ok",
            Method::BasicNack(_) => "basic.nack",
            Method::TxSelect(_) => "tx.select",
            Method::TxSelectOk(_) => "tx.select-ok",
            Method::TxCommit(_) => "tx.commit",
            Method::TxCommitOk(_) => "tx.commit-ok",
            Method::TxRollback(_) => "tx.rollback",
            Method::TxRollbackOk(_) => "tx.rollback-ok",
            Method::ConfirmSelect(_) => "confirm.select",
            Method::ConfirmSelectOk(_) => "confirm.select-ok",
        }
    }

    /// Encodes the 4-byte id followed by the method's fields.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        buf.put_u32(self.id());
        match self {
            Method::ConnectionStart(m) => {
                buf.put_u8(m.version_major);
                buf.put_u8(m.version_minor);
                encode_table(buf, &m.server_properties)?;
                put_longstr(buf, &m.mechanisms);
                put_longstr(buf, &m.locales);
            }
            Method::ConnectionStartOk(m) => {
                encode_table(buf, &m.client_properties)?;
                put_shortstr(buf, &m.mechanism)?;
                put_longstr(buf, &m.response);
                put_shortstr(buf, &m.locale)?;
            }
            Method::ConnectionSecure(m) => put_longstr(buf, &m.challenge),
            Method::ConnectionSecureOk(m) => put_longstr(buf, &m.response),
            Method::ConnectionTune(m) => {
                buf.put_u16(m.channel_max);
                buf.put_u32(m.frame_max);
                buf.put_u16(m.heartbeat);
            }
            Method::ConnectionTuneOk(m) => {
                buf.put_u16(m.channel_max);
                buf.put_u32(m.frame_max);
                buf.put_u16(m.heartbeat);
            }
            Method::ConnectionOpen(m) => {
                put_shortstr(buf, &m.virtual_host)?;
                // reserved capabilities + reserved insist bit
                put_shortstr(buf, "")?;
                buf.put_u8(0);
            }
            Method::ConnectionOpenOk(_) => put_shortstr(buf, "")?,
            Method::ConnectionClose(m) => {
                buf.put_u16(m.reply_code);
                put_shortstr(buf, &m.reply_text)?;
                buf.put_u16(m.class_id);
                buf.put_u16(m.method_id);
            }
            Method::ConnectionCloseOk(_) => {}
            Method::ConnectionBlocked(m) => put_shortstr(buf, &m.reason)?,
            Method::ConnectionUnblocked(_) => {}
            Method::ChannelOpen(_) => put_shortstr(buf, "")?,
            Method::ChannelOpenOk(_) => put_longstr(buf, b""),
            Method::ChannelFlow(m) => buf.put_u8(m.active as u8),
            Method::ChannelFlowOk(m) => buf.put_u8(m.active as u8),
            Method::ChannelClose(m) => {
                buf.put_u16(m.reply_code);
                put_shortstr(buf, &m.reply_text)?;
                buf.put_u16(m.class_id);
                buf.put_u16(m.method_id);
            }
            Method::ChannelCloseOk(_) => {}
            Method::ExchangeDeclare(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.exchange)?;
                put_shortstr(buf, &m.kind)?;
                let mut bits = 0u8;
                if m.passive {
                    bits |= 1 << 0;
                }
                if m.durable {
                    bits |= 1 << 1;
                }
                if m.auto_delete {
                    bits |= 1 << 2;
                }
                if m.internal {
                    bits |= 1 << 3;
                }
                if m.no_wait {
                    bits |= 1 << 4;
                }
                buf.put_u8(bits);
                encode_table(buf, &m.arguments)?;
            }
            Method::ExchangeDeclareOk(_) => {}
            Method::ExchangeDelete(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.exchange)?;
                let mut bits = 0u8;
                if m.if_unused {
                    bits |= 1 << 0;
                }
                if m.no_wait {
                    bits |= 1 << 1;
                }
                buf.put_u8(bits);
            }
            Method::ExchangeDeleteOk(_) => {}
            Method::ExchangeBind(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.destination)?;
                put_shortstr(buf, &m.source)?;
                put_shortstr(buf, &m.routing_key)?;
                buf.put_u8(m.no_wait as u8);
                encode_table(buf, &m.arguments)?;
            }
            Method::ExchangeBindOk(_) => {}
            Method::ExchangeUnbind(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.destination)?;
                put_shortstr(buf, &m.source)?;
                put_shortstr(buf, &m.routing_key)?;
                buf.put_u8(m.no_wait as u8);
                encode_table(buf, &m.arguments)?;
            }
            Method::ExchangeUnbindOk(_) => {}
            Method::QueueDeclare(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.queue)?;
                let mut bits = 0u8;
                if m.passive {
                    bits |= 1 << 0;
                }
                if m.durable {
                    bits |= 1 << 1;
                }
                if m.exclusive {
                    bits |= 1 << 2;
                }
                if m.auto_delete {
                    bits |= 1 << 3;
                }
                if m.no_wait {
                    bits |= 1 << 4;
                }
                buf.put_u8(bits);
                encode_table(buf, &m.arguments)?;
            }
            Method::QueueDeclareOk(m) => {
                put_shortstr(buf, &m.queue)?;
                buf.put_u32(m.message_count);
                buf.put_u32(m.consumer_count);
            }
            Method::QueueBind(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.queue)?;
                put_shortstr(buf, &m.exchange)?;
                put_shortstr(buf, &m.routing_key)?;
                buf.put_u8(m.no_wait as u8);
                encode_table(buf, &m.arguments)?;
            }
            Method::QueueBindOk(_) => {}
            Method::QueuePurge(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.queue)?;
                buf.put_u8(m.no_wait as u8);
            }
            Method::QueuePurgeOk(m) => buf.put_u32(m.message_count),
            Method::QueueDelete(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.queue)?;
                let mut bits = 0u8;
                if m.if_unused {
                    bits |= 1 << 0;
                }
                if m.if_empty {
                    bits |= 1 << 1;
                }
                if m.no_wait {
                    bits |= 1 << 2;
                }
                buf.put_u8(bits);
            }
            Method::QueueDeleteOk(m) => buf.put_u32(m.message_count),
            Method::QueueUnbind(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.queue)?;
                put_shortstr(buf, &m.exchange)?;
                put_shortstr(buf, &m.routing_key)?;
                encode_table(buf, &m.arguments)?;
            }
            Method::QueueUnbindOk(_) => {}
            Method::BasicQos(m) => {
                buf.put_u32(m.prefetch_size);
                buf.put_u16(m.prefetch_count);
                buf.put_u8(m.global as u8);
            }
            Method::BasicQosOk(_) => {}
            Method::BasicConsume(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.queue)?;
                put_shortstr(buf, &m.consumer_tag)?;
                let mut bits = 0u8;
                if m.no_local {
                    bits |= 1 << 0;
                }
                if m.no_ack {
                    bits |= 1 << 1;
                }
                if m.exclusive {
                    bits |= 1 << 2;
                }
                if m.no_wait {
                    bits |= 1 << 3;
                }
                buf.put_u8(bits);
                encode_table(buf, &m.arguments)?;
            }
            Method::BasicConsumeOk(m) => put_shortstr(buf, &m.consumer_tag)?,
            Method::BasicCancel(m) => {
                put_shortstr(buf, &m.consumer_tag)?;
                buf.put_u8(m.no_wait as u8);
            }
            Method::BasicCancelOk(m) => put_shortstr(buf, &m.consumer_tag)?,
            Method::BasicPublish(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.exchange)?;
                put_shortstr(buf, &m.routing_key)?;
                let mut bits = 0u8;
                if m.mandatory {
                    bits |= 1 << 0;
                }
                if m.immediate {
                    bits |= 1 << 1;
                }
                buf.put_u8(bits);
            }
            Method::BasicReturn(m) => {
                buf.put_u16(m.reply_code);
                put_shortstr(buf, &m.reply_text)?;
                put_shortstr(buf, &m.exchange)?;
                put_shortstr(buf, &m.routing_key)?;
            }
            Method::BasicDeliver(m) => {
                put_shortstr(buf, &m.consumer_tag)?;
                buf.put_u64(m.delivery_tag);
                buf.put_u8(m.redelivered as u8);
                put_shortstr(buf, &m.exchange)?;
                put_shortstr(buf, &m.routing_key)?;
            }
            Method::BasicGet(m) => {
                buf.put_u16(0);
                put_shortstr(buf, &m.queue)?;
                buf.put_u8(m.no_ack as u8);
            }
            Method::BasicGetOk(m) => {
                buf.put_u64(m.delivery_tag);
                buf.put_u8(m.redelivered as u8);
                put_shortstr(buf, &m.exchange)?;
                put_shortstr(buf, &m.routing_key)?;
                buf.put_u32(m.message_count);
            }
            Method::BasicGetEmpty(_) => put_shortstr(buf, "")?,
            Method::BasicAck(m) => {
                buf.put_u64(m.delivery_tag);
                buf.put_u8(m.multiple as u8);
            }
            Method::BasicReject(m) => {
                buf.put_u64(m.delivery_tag);
                buf.put_u8(m.requeue as u8);
            }
            Method::BasicRecoverAsync(m) => buf.put_u8(m.requeue as u8),
            Method::BasicRecover(m) => buf.put_u8(m.requeue as u8),
            Method::BasicRecoverOk(_) => {}
            Method::BasicNack(m) => {
                buf.put_u64(m.delivery_tag);
                let mut bits = 0u8;
                if m.multiple {
                    bits |= 1 << 0;
                }
                if m.requeue {
                    bits |= 1 << 1;
                }
                buf.put_u8(bits);
            }
            Method::TxSelect(_)
            | Method::TxSelectOk(_)
            | Method::TxCommit(_)
            | Method::TxCommitOk(_)
            | Method::TxRollback(_)
            | Method::TxRollbackOk(_) => {}
            Method::ConfirmSelect(m) => buf.put_u8(m.no_wait as u8),
            Method::ConfirmSelectOk(_) => {}
        }
        Ok(())
    }

    /// Decodes the 4-byte id, then the fields of the identified method.
    pub fn decode(buf: &mut Bytes) -> Result<Method, ProtocolError> {
        let id = take_u32(buf)?;
        let method = match id {
            ConnectionStart::ID => Method::ConnectionStart(ConnectionStart {
                version_major: take_u8(buf)?,
                version_minor: take_u8(buf)?,
                server_properties: decode_table(buf)?,
                mechanisms: take_longstr(buf)?,
                locales: take_longstr(buf)?,
            }),
            ConnectionStartOk::ID => Method::ConnectionStartOk(ConnectionStartOk {
                client_properties: decode_table(buf)?,
                mechanism: take_shortstr(buf)?,
                response: take_longstr(buf)?,
                locale: take_shortstr(buf)?,
            }),
            ConnectionSecure::ID => Method::ConnectionSecure(ConnectionSecure {
                challenge: take_longstr(buf)?,
            }),
            ConnectionSecureOk::ID => Method::ConnectionSecureOk(ConnectionSecureOk {
                response: take_longstr(buf)?,
            }),
            ConnectionTune::ID => Method::ConnectionTune(ConnectionTune {
                channel_max: take_u16(buf)?,
                frame_max: take_u32(buf)?,
                heartbeat: take_u16(buf)?,
            }),
            ConnectionTuneOk::ID => Method::ConnectionTuneOk(ConnectionTuneOk {
                channel_max: take_u16(buf)?,
                frame_max: take_u32(buf)?,
                heartbeat: take_u16(buf)?,
            }),
            ConnectionOpen::ID => {
                let virtual_host = take_shortstr(buf)?;
                let _reserved = take_shortstr(buf)?;
                let _insist = take_u8(buf)?;
                Method::ConnectionOpen(ConnectionOpen { virtual_host })
            }
            ConnectionOpenOk::ID => {
                let _reserved = take_shortstr(buf)?;
                Method::ConnectionOpenOk(ConnectionOpenOk {})
            }
            ConnectionClose::ID => Method::ConnectionClose(ConnectionClose {
                reply_code: take_u16(buf)?,
                reply_text: take_shortstr(buf)?,
                class_id: take_u16(buf)?,
                method_id: take_u16(buf)?,
            }),
            ConnectionCloseOk::ID => Method::ConnectionCloseOk(ConnectionCloseOk {}),
            ConnectionBlocked::ID => Method::ConnectionBlocked(ConnectionBlocked {
                reason: take_shortstr(buf)?,
            }),
            ConnectionUnblocked::ID => Method::ConnectionUnblocked(ConnectionUnblocked {}),
            ChannelOpen::ID => {
                let _reserved = take_shortstr(buf)?;
                Method::ChannelOpen(ChannelOpen {})
            }
            ChannelOpenOk::ID => {
                let _reserved = take_longstr(buf)?;
                Method::ChannelOpenOk(ChannelOpenOk {})
            }
            ChannelFlow::ID => Method::ChannelFlow(ChannelFlow {
                active: take_u8(buf)? & 1 != 0,
            }),
            ChannelFlowOk::ID => Method::ChannelFlowOk(ChannelFlowOk {
                active: take_u8(buf)? & 1 != 0,
            }),
            ChannelClose::ID => Method::ChannelClose(ChannelClose {
                reply_code: take_u16(buf)?,
                reply_text: take_shortstr(buf)?,
                class_id: take_u16(buf)?,
                method_id: take_u16(buf)?,
            }),
            ChannelCloseOk::ID => Method::ChannelCloseOk(ChannelCloseOk {}),
            ExchangeDeclare::ID => {
                let _reserved = take_u16(buf)?;
                let exchange = take_shortstr(buf)?;
                let kind = take_shortstr(buf)?;
                let bits = take_u8(buf)?;
                Method::ExchangeDeclare(ExchangeDeclare {
                    exchange,
                    kind,
                    passive: bits & (1 << 0) != 0,
                    durable: bits & (1 << 1) != 0,
                    auto_delete: bits & (1 << 2) != 0,
                    internal: bits & (1 << 3) != 0,
                    no_wait: bits & (1 << 4) != 0,
                    arguments: decode_table(buf)?,
                })
            }
            ExchangeDeclareOk::ID => Method::ExchangeDeclareOk(ExchangeDeclareOk {}),
            ExchangeDelete::ID => {
                let _reserved = take_u16(buf)?;
                let exchange = take_shortstr(buf)?;
                let bits = take_u8(buf)?;
                Method::ExchangeDelete(ExchangeDelete {
                    exchange,
                    if_unused: bits & (1 << 0) != 0,
                    no_wait: bits & (1 << 1) != 0,
                })
            }
            ExchangeDeleteOk::ID => Method::ExchangeDeleteOk(ExchangeDeleteOk {}),
            ExchangeBind::ID => {
                let _reserved = take_u16(buf)?;
                Method::ExchangeBind(ExchangeBind {
                    destination: take_shortstr(buf)?,
                    source: take_shortstr(buf)?,
                    routing_key: take_shortstr(buf)?,
                    no_wait: take_u8(buf)? & 1 != 0,
                    arguments: decode_table(buf)?,
                })
            }
            ExchangeBindOk::ID => Method::ExchangeBindOk(ExchangeBindOk {}),
            ExchangeUnbind::ID => {
                let _reserved = take_u16(buf)?;
                Method::ExchangeUnbind(ExchangeUnbind {
                    destination: take_shortstr(buf)?,
                    source: take_shortstr(buf)?,
                    routing_key: take_shortstr(buf)?,
                    no_wait: take_u8(buf)? & 1 != 0,
                    arguments: decode_table(buf)?,
                })
            }
            ExchangeUnbindOk::ID => Method::ExchangeUnbindOk(ExchangeUnbindOk {}),
            QueueDeclare::ID => {
                let _reserved = take_u16(buf)?;
                let queue = take_shortstr(buf)?;
                let bits = take_u8(buf)?;
                Method::QueueDeclare(QueueDeclare {
                    queue,
                    passive: bits & (1 << 0) != 0,
                    durable: bits & (1 << 1) != 0,
                    exclusive: bits & (1 << 2) != 0,
                    auto_delete: bits & (1 << 3) != 0,
                    no_wait: bits & (1 << 4) != 0,
                    arguments: decode_table(buf)?,
                })
            }
            QueueDeclareOk::ID => Method::QueueDeclareOk(QueueDeclareOk {
                queue: take_shortstr(buf)?,
                message_count: take_u32(buf)?,
                consumer_count: take_u32(buf)?,
            }),
            QueueBind::ID => {
                let _reserved = take_u16(buf)?;
                Method::QueueBind(QueueBind {
                    queue: take_shortstr(buf)?,
                    exchange: take_shortstr(buf)?,
                    routing_key: take_shortstr(buf)?,
                    no_wait: take_u8(buf)? & 1 != 0,
                    arguments: decode_table(buf)?,
                })
            }
            QueueBindOk::ID => Method::QueueBindOk(QueueBindOk {}),
            QueuePurge::ID => {
                let _reserved = take_u16(buf)?;
                Method::QueuePurge(QueuePurge {
                    queue: take_shortstr(buf)?,
                    no_wait: take_u8(buf)? & 1 != 0,
                })
            }
            QueuePurgeOk::ID => Method::QueuePurgeOk(QueuePurgeOk {
                message_count: take_u32(buf)?,
            }),
            QueueDelete::ID => {
                let _reserved = take_u16(buf)?;
                let queue = take_shortstr(buf)?;
                let bits = take_u8(buf)?;
                Method::QueueDelete(QueueDelete {
                    queue,
                    if_unused: bits & (1 << 0) != 0,
                    if_empty: bits & (1 << 1) != 0,
                    no_wait: bits & (1 << 2) != 0,
                })
            }
            QueueDeleteOk::ID => Method::QueueDeleteOk(QueueDeleteOk {
                message_count: take_u32(buf)?,
            }),
            QueueUnbind::ID => {
                let _reserved = take_u16(buf)?;
                Method::QueueUnbind(QueueUnbind {
                    queue: take_shortstr(buf)?,
                    exchange: take_shortstr(buf)?,
                    routing_key: take_shortstr(buf)?,
                    arguments: decode_table(buf)?,
                })
            }
            QueueUnbindOk::ID => Method::QueueUnbindOk(QueueUnbindOk {}),
            BasicQos::ID => Method::BasicQos(BasicQos {
                prefetch_size: take_u32(buf)?,
                prefetch_count: take_u16(buf)?,
                global: take_u8(buf)? & 1 != 0,
            }),
            BasicQosOk::ID => Method::BasicQosOk(BasicQosOk {}),
            BasicConsume::ID => {
                let _reserved = take_u16(buf)?;
                let queue = take_shortstr(buf)?;
                let consumer_tag = take_shortstr(buf)?;
                let bits = take_u8(buf)?;
                Method::BasicConsume(BasicConsume {
                    queue,
                    consumer_tag,
                    no_local: bits & (1 << 0) != 0,
                    no_ack: bits & (1 << 1) != 0,
                    exclusive: bits & (1 << 2) != 0,
                    no_wait: bits & (1 << 3) != 0,
                    arguments: decode_table(buf)?,
                })
            }
            BasicConsumeOk::ID => Method::BasicConsumeOk(BasicConsumeOk {
                consumer_tag: take_shortstr(buf)?,
            }),
            BasicCancel::ID => Method::BasicCancel(BasicCancel {
                consumer_tag: take_shortstr(buf)?,
                no_wait: take_u8(buf)? & 1 != 0,
            }),
            BasicCancelOk::ID => Method::BasicCancelOk(BasicCancelOk {
                consumer_tag: take_shortstr(buf)?,
            }),
            BasicPublish::ID => {
                let _reserved = take_u16(buf)?;
                let exchange = take_shortstr(buf)?;
                let routing_key = take_shortstr(buf)?;
                let bits = take_u8(buf)?;
                Method::BasicPublish(BasicPublish {
                    exchange,
                    routing_key,
                    mandatory: bits & (1 << 0) != 0,
                    immediate: bits & (1 << 1) != 0,
                })
            }
            BasicReturn::ID => Method::BasicReturn(BasicReturn {
                reply_code: take_u16(buf)?,
                reply_text: take_shortstr(buf)?,
                exchange: take_shortstr(buf)?,
                routing_key: take_shortstr(buf)?,
            }),
            BasicDeliver::ID => Method::BasicDeliver(BasicDeliver {
                consumer_tag: take_shortstr(buf)?,
                delivery_tag: take_u64(buf)?,
                redelivered: take_u8(buf)? & 1 != 0,
                exchange: take_shortstr(buf)?,
                routing_key: take_shortstr(buf)?,
            }),
            BasicGet::ID => {
                let _reserved = take_u16(buf)?;
                Method::BasicGet(BasicGet {
                    queue: take_shortstr(buf)?,
                    no_ack: take_u8(buf)? & 1 != 0,
                })
            }
            BasicGetOk::ID => Method::BasicGetOk(BasicGetOk {
                delivery_tag: take_u64(buf)?,
                redelivered: take_u8(buf)? & 1 != 0,
                exchange: take_shortstr(buf)?,
                routing_key: take_shortstr(buf)?,
                message_count: take_u32(buf)?,
            }),
            BasicGetEmpty::ID => {
                let _reserved = take_shortstr(buf)?;
                Method::BasicGetEmpty(BasicGetEmpty {})
            }
            BasicAck::ID => Method::BasicAck(BasicAck {
                delivery_tag: take_u64(buf)?,
                multiple: take_u8(buf)? & 1 != 0,
            }),
            BasicReject::ID => Method::BasicReject(BasicReject {
                delivery_tag: take_u64(buf)?,
                requeue: take_u8(buf)? & 1 != 0,
            }),
            BasicRecoverAsync::ID => Method::BasicRecoverAsync(BasicRecoverAsync {
                requeue: take_u8(buf)? & 1 != 0,
            }),
            BasicRecover::ID => Method::BasicRecover(BasicRecover {
                requeue: take_u8(buf)? & 1 != 0,
            }),
            BasicRecoverOk::ID => Method::BasicRecoverOk(BasicRecoverOk {}),
            BasicNack::ID => {
                let delivery_tag = take_u64(buf)?;
                let bits = take_u8(buf)?;
                Method::BasicNack(BasicNack {
                    delivery_tag,
                    multiple: bits & (1 << 0) != 0,
                    requeue: bits & (1 << 1) != 0,
                })
            }
            TxSelect::ID => Method::TxSelect(TxSelect {}),
            TxSelectOk::ID => Method::TxSelectOk(TxSelectOk {}),
            TxCommit::ID => Method::TxCommit(TxCommit {}),
            TxCommitOk::ID => Method::TxCommitOk(TxCommitOk {}),
            TxRollback::ID => Method::TxRollback(TxRollback {}),
            TxRollbackOk::ID => Method::TxRollbackOk(TxRollbackOk {}),
            ConfirmSelect::ID => Method::ConfirmSelect(ConfirmSelect {
                no_wait: take_u8(buf)? & 1 != 0,
            }),
            ConfirmSelectOk::ID => Method::ConfirmSelectOk(ConfirmSelectOk {}),
            other => {
                return Err(ProtocolError::UnknownMethod {
                    class_id: (other >> 16) as u16,
                    method_id: (other & 0xFFFF) as u16,
                })
            }
        };
        Ok(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;

    fn roundtrip(method: Method) -> Method {
        let mut buf = BytesMut::new();
        method.encode(&mut buf).unwrap();
        let mut cursor = buf.freeze();
        let decoded = Method::decode(&mut cursor).unwrap();
        assert!(cursor.is_empty(), "trailing bytes after {}", method.name());
        decoded
    }

    #[test]
    fn test_id_packing_literals() {
        // Class in the high half, method in the low half.
        assert_eq!(ConnectionStart::ID, 0x000A_000A);
        assert_eq!(ChannelClose::ID, 0x0014_0028);
        assert_eq!(BasicNack::ID, 0x003C_0078);
        assert_eq!(ConfirmSelect::ID, 0x0055_000A);

        let m = Method::BasicDeliver(BasicDeliver::default());
        assert_eq!(m.class_id(), 60);
        assert_eq!(m.method_id(), 60);
    }

    #[test]
    fn test_tune_roundtrip() {
        let m = Method::ConnectionTune(ConnectionTune {
            channel_max: 2047,
            frame_max: 131_072,
            heartbeat: 60,
        });
        assert_eq!(roundtrip(m.clone()), m);
    }

    #[test]
    fn test_start_ok_roundtrip() {
        let mut props = Table::new();
        props.insert("product", FieldValue::LongString("coney".into()));
        let m = Method::ConnectionStartOk(ConnectionStartOk {
            client_properties: props,
            mechanism: "PLAIN".into(),
            response: Bytes::from_static(b"\x00guest\x00guest"),
            locale: "en_US".into(),
        });
        assert_eq!(roundtrip(m.clone()), m);
    }

    #[test]
    fn test_queue_declare_bit_packing() {
        let m = Method::QueueDeclare(QueueDeclare {
            queue: "jobs".into(),
            passive: false,
            durable: true,
            exclusive: false,
            auto_delete: true,
            no_wait: false,
            arguments: Table::new(),
        });

        let mut buf = BytesMut::new();
        m.encode(&mut buf).unwrap();
        // id (4) + reserved (2) + "jobs" (5) puts the bit octet at offset 11.
        assert_eq!(buf[11], 0b0000_1010);
        assert_eq!(roundtrip(m.clone()), m);
    }

    #[test]
    fn test_exchange_declare_all_bits() {
        let m = Method::ExchangeDeclare(ExchangeDeclare {
            exchange: "logs".into(),
            kind: "topic".into(),
            passive: true,
            durable: true,
            auto_delete: true,
            internal: true,
            no_wait: true,
            arguments: Table::new(),
        });
        assert_eq!(roundtrip(m.clone()), m);
    }

    #[test]
    fn test_basic_nack_bits() {
        let m = Method::BasicNack(BasicNack {
            delivery_tag: 42,
            multiple: false,
            requeue: true,
        });
        let mut buf = BytesMut::new();
        m.encode(&mut buf).unwrap();
        assert_eq!(buf[12], 0b0000_0010);
        assert_eq!(roundtrip(m.clone()), m);
    }

    #[test]
    fn test_close_roundtrip() {
        let m = Method::ConnectionClose(ConnectionClose {
            reply_code: 320,
            reply_text: "CONNECTION_FORCED - shutdown".into(),
            class_id: 0,
            method_id: 0,
        });
        assert_eq!(roundtrip(m.clone()), m);

        let m = Method::ChannelClose(ChannelClose {
            reply_code: 404,
            reply_text: "NOT_FOUND - no queue 'missing'".into(),
            class_id: 50,
            method_id: 10,
        });
        assert_eq!(roundtrip(m.clone()), m);
    }

    #[test]
    fn test_deliver_roundtrip() {
        let m = Method::BasicDeliver(BasicDeliver {
            consumer_tag: "ctag-1".into(),
            delivery_tag: 7,
            redelivered: true,
            exchange: "amq.topic".into(),
            routing_key: "a.b.c".into(),
        });
        assert_eq!(roundtrip(m.clone()), m);
    }

    #[test]
    fn test_reserved_fields_consumed() {
        // connection.open carries two reserved trailing fields that must be
        // written and consumed even though they are not exposed.
        let m = Method::ConnectionOpen(ConnectionOpen {
            virtual_host: "/".into(),
        });
        assert_eq!(roundtrip(m.clone()), m);

        let m = Method::ChannelOpen(ChannelOpen {});
        assert_eq!(roundtrip(m.clone()), m);
    }

    #[test]
    fn test_empty_bodied_methods() {
        for m in [
            Method::TxSelect(TxSelect {}),
            Method::TxCommitOk(TxCommitOk {}),
            Method::ConnectionCloseOk(ConnectionCloseOk {}),
            Method::ChannelCloseOk(ChannelCloseOk {}),
            Method::ConfirmSelectOk(ConfirmSelectOk {}),
        ] {
            assert_eq!(roundtrip(m.clone()), m);
        }
    }

    #[test]
    fn test_unknown_method_id() {
        let mut buf = BytesMut::new();
        buf.put_u32(0x0063_0001);
        let mut cursor = buf.freeze();
        assert!(matches!(
            Method::decode(&mut cursor),
            Err(ProtocolError::UnknownMethod {
                class_id: 99,
                method_id: 1
            })
        ));
    }

    #[test]
    fn test_truncated_method_aborts() {
        let m = Method::QueueDeclareOk(QueueDeclareOk {
            queue: "jobs".into(),
            message_count: 3,
            consumer_count: 1,
        });
        let mut buf = BytesMut::new();
        m.encode(&mut buf).unwrap();
        let full = buf.freeze();

        let mut cursor = full.slice(0..full.len() - 2);
        assert!(matches!(
            Method::decode(&mut cursor),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(
            Method::ConnectionStart(ConnectionStart::default()).name(),
            "connection.start"
        );
        assert_eq!(Method::BasicGetEmpty(BasicGetEmpty {}).name(), "basic.get-empty");
        assert!(Method::ChannelClose(ChannelClose::default()).is_channel_close());
        assert!(Method::ConnectionClose(ConnectionClose::default()).is_connection_close());
    }
}

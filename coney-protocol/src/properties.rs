//! Content-header codec.
//!
//! A content header carries the class id, the total body size, and a
//! property list gated by a chained flag bitmask: 16-bit words where the
//! low bit of each word means another word follows. Only fields whose flag
//! bit is set appear on the wire; absent fields are skipped entirely.

use crate::codec::{put_shortstr, take_shortstr, take_u16, take_u64, take_u8};
use crate::error::ProtocolError;
use crate::field::{decode_table, encode_table, Table};
use bytes::{BufMut, Bytes, BytesMut};

/// Content class carrying message properties.
pub const BASIC_CLASS: u16 = 60;

/// Flag bits for [`BasicProperties`], first flag word, highest bit first in
/// declaration order. Bit 0 is the continuation bit and never a field.
mod flag {
    pub const CONTENT_TYPE: u64 = 1 << 15;
    pub const CONTENT_ENCODING: u64 = 1 << 14;
    pub const HEADERS: u64 = 1 << 13;
    pub const DELIVERY_MODE: u64 = 1 << 12;
    pub const PRIORITY: u64 = 1 << 11;
    pub const CORRELATION_ID: u64 = 1 << 10;
    pub const REPLY_TO: u64 = 1 << 9;
    pub const EXPIRATION: u64 = 1 << 8;
    pub const MESSAGE_ID: u64 = 1 << 7;
    pub const TIMESTAMP: u64 = 1 << 6;
    pub const KIND: u64 = 1 << 5;
    pub const USER_ID: u64 = 1 << 4;
    pub const APP_ID: u64 = 1 << 3;
    pub const CLUSTER_ID: u64 = 1 << 2;
}

const MAX_FLAG_WORDS: usize = 4;

/// Message properties of the basic content class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicProperties {
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub headers: Option<Table>,
    /// 1 transient, 2 persistent.
    pub delivery_mode: Option<u8>,
    pub priority: Option<u8>,
    pub correlation_id: Option<String>,
    pub reply_to: Option<String>,
    pub expiration: Option<String>,
    pub message_id: Option<String>,
    /// Seconds since the Unix epoch.
    pub timestamp: Option<u64>,
    pub kind: Option<String>,
    pub user_id: Option<String>,
    pub app_id: Option<String>,
    pub cluster_id: Option<String>,
}

impl BasicProperties {
    fn flags(&self) -> u64 {
        let mut flags = 0;
        if self.content_type.is_some() {
            flags |= flag::CONTENT_TYPE;
        }
        if self.content_encoding.is_some() {
            flags |= flag::CONTENT_ENCODING;
        }
        if self.headers.is_some() {
            flags |= flag::HEADERS;
        }
        if self.delivery_mode.is_some() {
            flags |= flag::DELIVERY_MODE;
        }
        if self.priority.is_some() {
            flags |= flag::PRIORITY;
        }
        if self.correlation_id.is_some() {
            flags |= flag::CORRELATION_ID;
        }
        if self.reply_to.is_some() {
            flags |= flag::REPLY_TO;
        }
        if self.expiration.is_some() {
            flags |= flag::EXPIRATION;
        }
        if self.message_id.is_some() {
            flags |= flag::MESSAGE_ID;
        }
        if self.timestamp.is_some() {
            flags |= flag::TIMESTAMP;
        }
        if self.kind.is_some() {
            flags |= flag::KIND;
        }
        if self.user_id.is_some() {
            flags |= flag::USER_ID;
        }
        if self.app_id.is_some() {
            flags |= flag::APP_ID;
        }
        if self.cluster_id.is_some() {
            flags |= flag::CLUSTER_ID;
        }
        flags
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        // All basic flags fit the first word, so no continuation bit.
        buf.put_u16(self.flags() as u16);

        if let Some(v) = &self.content_type {
            put_shortstr(buf, v)?;
        }
        if let Some(v) = &self.content_encoding {
            put_shortstr(buf, v)?;
        }
        if let Some(v) = &self.headers {
            encode_table(buf, v)?;
        }
        if let Some(v) = self.delivery_mode {
            buf.put_u8(v);
        }
        if let Some(v) = self.priority {
            buf.put_u8(v);
        }
        if let Some(v) = &self.correlation_id {
            put_shortstr(buf, v)?;
        }
        if let Some(v) = &self.reply_to {
            put_shortstr(buf, v)?;
        }
        if let Some(v) = &self.expiration {
            put_shortstr(buf, v)?;
        }
        if let Some(v) = &self.message_id {
            put_shortstr(buf, v)?;
        }
        if let Some(v) = self.timestamp {
            buf.put_u64(v);
        }
        if let Some(v) = &self.kind {
            put_shortstr(buf, v)?;
        }
        if let Some(v) = &self.user_id {
            put_shortstr(buf, v)?;
        }
        if let Some(v) = &self.app_id {
            put_shortstr(buf, v)?;
        }
        if let Some(v) = &self.cluster_id {
            put_shortstr(buf, v)?;
        }
        Ok(())
    }

    fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        let flags = decode_flags(buf)?;
        let mut props = BasicProperties::default();
        if flags & flag::CONTENT_TYPE != 0 {
            props.content_type = Some(take_shortstr(buf)?);
        }
        if flags & flag::CONTENT_ENCODING != 0 {
            props.content_encoding = Some(take_shortstr(buf)?);
        }
        if flags & flag::HEADERS != 0 {
            props.headers = Some(decode_table(buf)?);
        }
        if flags & flag::DELIVERY_MODE != 0 {
            props.delivery_mode = Some(take_u8(buf)?);
        }
        if flags & flag::PRIORITY != 0 {
            props.priority = Some(take_u8(buf)?);
        }
        if flags & flag::CORRELATION_ID != 0 {
            props.correlation_id = Some(take_shortstr(buf)?);
        }
        if flags & flag::REPLY_TO != 0 {
            props.reply_to = Some(take_shortstr(buf)?);
        }
        if flags & flag::EXPIRATION != 0 {
            props.expiration = Some(take_shortstr(buf)?);
        }
        if flags & flag::MESSAGE_ID != 0 {
            props.message_id = Some(take_shortstr(buf)?);
        }
        if flags & flag::TIMESTAMP != 0 {
            props.timestamp = Some(take_u64(buf)?);
        }
        if flags & flag::KIND != 0 {
            props.kind = Some(take_shortstr(buf)?);
        }
        if flags & flag::USER_ID != 0 {
            props.user_id = Some(take_shortstr(buf)?);
        }
        if flags & flag::APP_ID != 0 {
            props.app_id = Some(take_shortstr(buf)?);
        }
        if flags & flag::CLUSTER_ID != 0 {
            props.cluster_id = Some(take_shortstr(buf)?);
        }
        Ok(props)
    }
}

/// Reads the chained flag words. The first word lands in the low 16 bits.
fn decode_flags(buf: &mut Bytes) -> Result<u64, ProtocolError> {
    let mut flags = 0u64;
    for word_index in 0.. {
        if word_index == MAX_FLAG_WORDS {
            return Err(ProtocolError::FlagChainTooLong);
        }
        let word = take_u16(buf)?;
        flags |= (word as u64) << (16 * word_index);
        if word & 1 == 0 {
            break;
        }
    }
    Ok(flags)
}

/// A decoded content-header frame payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentHeader {
    pub class_id: u16,
    /// Total size of the message body across all body frames.
    pub body_size: u64,
    pub properties: BasicProperties,
}

impl ContentHeader {
    pub fn new(body_size: u64, properties: BasicProperties) -> Self {
        Self {
            class_id: BASIC_CLASS,
            body_size,
            properties,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        buf.put_u16(self.class_id);
        buf.put_u16(0); // weight, unused
        buf.put_u64(self.body_size);
        self.properties.encode(buf)
    }

    pub fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        let class_id = take_u16(buf)?;
        if class_id != BASIC_CLASS {
            return Err(ProtocolError::UnknownClass(class_id));
        }
        let _weight = take_u16(buf)?;
        let body_size = take_u64(buf)?;
        let properties = BasicProperties::decode(buf)?;
        Ok(Self {
            class_id,
            body_size,
            properties,
        })
    }
}

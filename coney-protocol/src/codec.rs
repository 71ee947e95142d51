//! Primitive readers and writers for the wire format.
//!
//! All multi-byte integers on the wire are big-endian. Readers operate on a
//! `Bytes` cursor and never consume past the remaining range: any read that
//! would cross it fails with [`ProtocolError::Truncated`] instead.

use crate::error::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

fn check(buf: &Bytes, need: usize) -> Result<(), ProtocolError> {
    if buf.remaining() < need {
        Err(ProtocolError::Truncated {
            needed: need - buf.remaining(),
        })
    } else {
        Ok(())
    }
}

pub fn take_u8(buf: &mut Bytes) -> Result<u8, ProtocolError> {
    check(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn take_u16(buf: &mut Bytes) -> Result<u16, ProtocolError> {
    check(buf, 2)?;
    Ok(buf.get_u16())
}

pub fn take_u32(buf: &mut Bytes) -> Result<u32, ProtocolError> {
    check(buf, 4)?;
    Ok(buf.get_u32())
}

pub fn take_u64(buf: &mut Bytes) -> Result<u64, ProtocolError> {
    check(buf, 8)?;
    Ok(buf.get_u64())
}

pub fn take_f32(buf: &mut Bytes) -> Result<f32, ProtocolError> {
    check(buf, 4)?;
    Ok(buf.get_f32())
}

pub fn take_f64(buf: &mut Bytes) -> Result<f64, ProtocolError> {
    check(buf, 8)?;
    Ok(buf.get_f64())
}

/// Splits off exactly `len` bytes from the front of the cursor.
pub fn take_bytes(buf: &mut Bytes, len: usize) -> Result<Bytes, ProtocolError> {
    check(buf, len)?;
    Ok(buf.split_to(len))
}

/// Reads a short string: 1-byte length, then that many UTF-8 bytes.
pub fn take_shortstr(buf: &mut Bytes) -> Result<String, ProtocolError> {
    let len = take_u8(buf)? as usize;
    let raw = take_bytes(buf, len)?;
    String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidUtf8("short string"))
}

/// Reads a long string: 4-byte length, then that many raw bytes.
///
/// Long strings may carry binary data (SASL responses), so the bytes are
/// returned unvalidated.
pub fn take_longstr(buf: &mut Bytes) -> Result<Bytes, ProtocolError> {
    let len = take_u32(buf)? as usize;
    take_bytes(buf, len)
}

pub fn put_shortstr(buf: &mut BytesMut, s: &str) -> Result<(), ProtocolError> {
    if s.len() > u8::MAX as usize {
        return Err(ProtocolError::ShortStringTooLong(s.len()));
    }
    buf.put_u8(s.len() as u8);
    buf.put_slice(s.as_bytes());
    Ok(())
}

pub fn put_longstr(buf: &mut BytesMut, s: &[u8]) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s);
}

/// Reserves a 4-byte length slot and returns its offset for
/// [`backfill_length`] once the prefixed region has been written.
pub fn reserve_length(buf: &mut BytesMut) -> usize {
    let at = buf.len();
    buf.put_u32(0);
    at
}

/// Writes the number of bytes appended since `reserve_length` into the
/// reserved slot.
pub fn backfill_length(buf: &mut BytesMut, at: usize) {
    let len = (buf.len() - at - 4) as u32;
    buf[at..at + 4].copy_from_slice(&len.to_be_bytes());
}

//! Frame envelope and the restartable frame reader.
//!
//! Wire layout: 1-byte frame type, 2-byte channel, 4-byte payload length,
//! the payload, then the fixed end octet `0xCE`. An encoded frame is
//! always exactly `7 + payload length + 1` bytes.

use crate::codec::{backfill_length, reserve_length};
use crate::error::ProtocolError;
use crate::method::Method;
use crate::pool::ChannelPools;
use crate::properties::ContentHeader;
use bytes::{BufMut, Bytes, BytesMut};

pub const FRAME_METHOD: u8 = 1;
pub const FRAME_HEADER: u8 = 2;
pub const FRAME_BODY: u8 = 3;
pub const FRAME_HEARTBEAT: u8 = 8;

/// Fixed frame-end octet.
pub const FRAME_END: u8 = 0xCE;

/// Size of the envelope preceding the payload.
pub const FRAME_HEADER_SIZE: usize = 7;

/// Envelope plus end octet, the per-frame overhead around a payload.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_SIZE + 1;

/// The 8-byte protocol header sent to open a connection: "AMQP" then
/// protocol id 0 and version 0-9-1.
pub const PROTOCOL_HEADER: [u8; 8] = *b"AMQP\x00\x00\x09\x01";

/// A decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Method { channel: u16, method: Method },
    Header { channel: u16, header: ContentHeader },
    /// A body fragment; the payload is a zero-copy view of the buffer the
    /// reader filled from the channel's pool.
    Body { channel: u16, payload: Bytes },
    Heartbeat { channel: u16 },
    /// A peer protocol header, seen instead of a frame when the server
    /// rejects the client's proposed protocol version.
    ProtocolHeader { major: u8, minor: u8, revision: u8 },
}

impl Frame {
    pub fn channel(&self) -> u16 {
        match self {
            Frame::Method { channel, .. }
            | Frame::Header { channel, .. }
            | Frame::Body { channel, .. }
            | Frame::Heartbeat { channel } => *channel,
            Frame::ProtocolHeader { .. } => 0,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), ProtocolError> {
        let (frame_type, channel) = match self {
            Frame::ProtocolHeader {
                major,
                minor,
                revision,
            } => {
                buf.put_slice(b"AMQP\x00");
                buf.put_u8(*major);
                buf.put_u8(*minor);
                buf.put_u8(*revision);
                return Ok(());
            }
            Frame::Method { channel, .. } => (FRAME_METHOD, *channel),
            Frame::Header { channel, .. } => (FRAME_HEADER, *channel),
            Frame::Body { channel, .. } => (FRAME_BODY, *channel),
            Frame::Heartbeat { channel } => (FRAME_HEARTBEAT, *channel),
        };

        buf.put_u8(frame_type);
        buf.put_u16(channel);
        let at = reserve_length(buf);
        match self {
            Frame::Method { method, .. } => method.encode(buf)?,
            Frame::Header { header, .. } => header.encode(buf)?,
            Frame::Body { payload, .. } => buf.put_slice(payload),
            Frame::Heartbeat { .. } | Frame::ProtocolHeader { .. } => {}
        }
        backfill_length(buf, at);
        buf.put_u8(FRAME_END);
        Ok(())
    }
}

/// Parser states. `Header` with an empty scratch buffer is the idle
/// sentinel between frames; `Initial` differs from it only in also
/// accepting a peer protocol header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Initial,
    ProtocolTail,
    Header,
    Body,
    Footer,
}

/// Incremental frame parser.
///
/// [`FrameReader::feed`] produces at most one complete frame per call and,
/// given insufficient input, consumes everything offered — so input may
/// arrive in arbitrarily small increments (down to one byte) and yields
/// the same frames.
#[derive(Debug)]
pub struct FrameReader {
    state: ReadState,
    scratch: [u8; FRAME_HEADER_SIZE],
    scratch_len: usize,
    frame_type: u8,
    channel: u16,
    size: u32,
    payload: BytesMut,
    /// Largest acceptable total frame size; zero means unlimited.
    frame_max: u32,
}

impl FrameReader {
    pub fn new(frame_max: u32) -> Self {
        Self {
            state: ReadState::Initial,
            scratch: [0; FRAME_HEADER_SIZE],
            scratch_len: 0,
            frame_type: 0,
            channel: 0,
            size: 0,
            payload: BytesMut::new(),
            frame_max,
        }
    }

    /// Applies a newly negotiated frame-max to subsequent frames.
    pub fn set_frame_max(&mut self, frame_max: u32) {
        self.frame_max = frame_max;
    }

    /// Returns the parser to its connection-start state.
    pub fn reset(&mut self) {
        self.state = ReadState::Initial;
        self.scratch_len = 0;
        self.payload = BytesMut::new();
    }

    /// Consumes bytes from `input`, returning how many were consumed and
    /// at most one completed frame. Payload buffers are allocated from the
    /// pool of the frame's channel.
    pub fn feed(
        &mut self,
        input: &[u8],
        pools: &mut ChannelPools,
    ) -> Result<(usize, Option<Frame>), ProtocolError> {
        let mut consumed = 0;
        loop {
            let frame = match self.state {
                ReadState::Initial | ReadState::Header => {
                    let fill = (FRAME_HEADER_SIZE - self.scratch_len).min(input.len() - consumed);
                    self.scratch[self.scratch_len..self.scratch_len + fill]
                        .copy_from_slice(&input[consumed..consumed + fill]);
                    self.scratch_len += fill;
                    consumed += fill;
                    if self.scratch_len < FRAME_HEADER_SIZE {
                        return Ok((consumed, None));
                    }
                    if self.state == ReadState::Initial && self.scratch[0..4] == *b"AMQP" {
                        self.state = ReadState::ProtocolTail;
                    } else {
                        // An ordinary envelope; same handling in both states.
                        self.enter_body(pools)?;
                    }
                    None
                }
                ReadState::ProtocolTail => {
                    if consumed == input.len() {
                        return Ok((consumed, None));
                    }
                    let revision = input[consumed];
                    consumed += 1;
                    let frame = Frame::ProtocolHeader {
                        major: self.scratch[5],
                        minor: self.scratch[6],
                        revision,
                    };
                    self.scratch_len = 0;
                    self.state = ReadState::Header;
                    Some(frame)
                }
                ReadState::Body => {
                    let need = self.size as usize - self.payload.len();
                    let fill = need.min(input.len() - consumed);
                    self.payload
                        .extend_from_slice(&input[consumed..consumed + fill]);
                    consumed += fill;
                    if self.payload.len() < self.size as usize {
                        return Ok((consumed, None));
                    }
                    self.state = ReadState::Footer;
                    None
                }
                ReadState::Footer => {
                    if consumed == input.len() {
                        return Ok((consumed, None));
                    }
                    let octet = input[consumed];
                    consumed += 1;
                    if octet != FRAME_END {
                        return Err(ProtocolError::BadFrameEnd(octet));
                    }
                    let payload = std::mem::take(&mut self.payload).freeze();
                    self.state = ReadState::Header;
                    Some(self.dispatch(payload)?)
                }
            };
            if frame.is_some() {
                return Ok((consumed, frame));
            }
        }
    }

    /// Parses the accumulated envelope and prepares payload accumulation.
    fn enter_body(&mut self, pools: &mut ChannelPools) -> Result<(), ProtocolError> {
        self.frame_type = self.scratch[0];
        self.channel = u16::from_be_bytes([self.scratch[1], self.scratch[2]]);
        self.size = u32::from_be_bytes([
            self.scratch[3],
            self.scratch[4],
            self.scratch[5],
            self.scratch[6],
        ]);
        self.scratch_len = 0;

        // Reject unknown types before trusting their declared length.
        if !matches!(
            self.frame_type,
            FRAME_METHOD | FRAME_HEADER | FRAME_BODY | FRAME_HEARTBEAT
        ) {
            return Err(ProtocolError::UnknownFrameType(self.frame_type));
        }
        if self.frame_max > 0 && self.size as usize + FRAME_OVERHEAD > self.frame_max as usize {
            return Err(ProtocolError::FrameTooLarge {
                size: self.size as usize + FRAME_OVERHEAD,
                max: self.frame_max as usize,
            });
        }
        if self.frame_type == FRAME_HEARTBEAT && self.size != 0 {
            return Err(ProtocolError::NonEmptyHeartbeat(self.size));
        }

        self.payload = pools.get(self.channel).alloc(self.size as usize);
        self.state = ReadState::Body;
        Ok(())
    }

    fn dispatch(&self, payload: Bytes) -> Result<Frame, ProtocolError> {
        let channel = self.channel;
        match self.frame_type {
            FRAME_METHOD => {
                let mut cursor = payload;
                let method = Method::decode(&mut cursor)?;
                Ok(Frame::Method { channel, method })
            }
            FRAME_HEADER => {
                let mut cursor = payload;
                let header = ContentHeader::decode(&mut cursor)?;
                Ok(Frame::Header { channel, header })
            }
            FRAME_BODY => Ok(Frame::Body { channel, payload }),
            FRAME_HEARTBEAT => Ok(Frame::Heartbeat { channel }),
            other => Err(ProtocolError::UnknownFrameType(other)),
        }
    }
}

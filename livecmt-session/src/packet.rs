//! Outbound packet framing
//!
//! Frame layout (all integers big-endian):
//!
//! ```text
//! | total length u32 | header length u16 | version u16 | operation u32 | sequence u32 | payload |
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Header length in bytes
pub const HEADER_LEN: u16 = 16;
const PROTOCOL_VERSION: u16 = 1;
const SEQUENCE: u32 = 1;

/// Packet operation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PacketMsgType {
    Heartbeat = 2,
    HeartbeatReply = 3,
    Message = 5,
    /// Join room
    Handshake = 7,
    HandshakeReply = 8,
}

impl PacketMsgType {
    #[must_use]
    pub const fn operation(self) -> u32 {
        self as u32
    }
}

/// Turns a (message type, payload) pair into wire-ready bytes.
///
/// Implementations must be stateless: the same input always yields the same
/// frame, and one encoder may be shared by any number of sessions.
pub trait FrameEncoder: Send + Sync {
    fn pack(&self, kind: PacketMsgType, payload: &[u8]) -> Bytes;
}

/// Legacy danmaku TCP framing
#[derive(Debug, Clone, Copy, Default)]
pub struct DanmakuFrameEncoder;

impl FrameEncoder for DanmakuFrameEncoder {
    fn pack(&self, kind: PacketMsgType, payload: &[u8]) -> Bytes {
        let total = usize::from(HEADER_LEN) + payload.len();
        let mut buf = BytesMut::with_capacity(total);
        // Frames are tiny; a payload above u32::MAX is not representable anyway.
        buf.put_u32(u32::try_from(total).unwrap_or(u32::MAX));
        buf.put_u16(HEADER_LEN);
        buf.put_u16(PROTOCOL_VERSION);
        buf.put_u32(kind.operation());
        buf.put_u32(SEQUENCE);
        buf.put_slice(payload);
        buf.freeze()
    }
}

/// Handshake body binding the connection to a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakePayload {
    pub roomid: u64,
    pub uid: u64,
}

impl HandshakePayload {
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

//! Chat connection keepalive
//!
//! Drives the handshake-then-heartbeat lifecycle of one chat connection.
//! The transport and the frame encoder are consumed through traits so the
//! session can run over any connection type.

pub mod error;
pub mod identity;
pub mod keepalive;
pub mod packet;
pub mod transport;

pub use error::{Result, SessionError, TransportError};
pub use identity::{FixedIdentity, IdentityGenerator, RandomIdentity};
pub use keepalive::{HeartbeatExit, KeepaliveSession, SessionState, HEARTBEAT_INTERVAL, RETRY_LIMIT};
pub use packet::{DanmakuFrameEncoder, FrameEncoder, HandshakePayload, PacketMsgType};
pub use transport::{Connection, TcpConnection};

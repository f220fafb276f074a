//! Handshake-then-heartbeat keepalive for one chat connection
//!
//! Lifecycle: `Connecting -> Active -> Closed`. A closed session is terminal;
//! reconnecting means building a new session.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, trace, warn};

use crate::error::{Result, SessionError};
use crate::identity::IdentityGenerator;
use crate::packet::{FrameEncoder, HandshakePayload, PacketMsgType};
use crate::transport::Connection;

/// Delay between two successful heartbeats
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// Heartbeat failures tolerated before the loop gives up
pub const RETRY_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closed,
}

/// Why the heartbeat loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatExit {
    /// The connection stopped reporting itself active
    ConnectionClosed { errors: u32 },
    /// Too many failed heartbeat writes
    RetryBudgetExhausted { errors: u32 },
}

/// Keepalive session bound to one room
pub struct KeepaliveSession {
    channel_id: u64,
    encoder: Arc<dyn FrameEncoder>,
    identity: Box<dyn IdentityGenerator>,
    state: watch::Sender<SessionState>,
}

impl KeepaliveSession {
    pub fn new(
        channel_id: u64,
        encoder: Arc<dyn FrameEncoder>,
        identity: impl IdentityGenerator + 'static,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Connecting);
        Self {
            channel_id,
            encoder,
            identity: Box::new(identity),
            state,
        }
    }

    #[must_use]
    pub const fn channel_id(&self) -> u64 {
        self.channel_id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch state changes; subscribe before calling `on_connected`.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Take ownership of a freshly connected transport.
    ///
    /// Writes the handshake frame and, once it is on the wire, spawns the
    /// heartbeat loop. A failed handshake closes the connection and no
    /// heartbeat is ever sent. The returned handle resolves when the loop
    /// has closed the connection.
    pub async fn on_connected<C: Connection>(
        self,
        connection: C,
    ) -> Result<JoinHandle<HeartbeatExit>> {
        let Self {
            channel_id,
            encoder,
            identity,
            state,
        } = self;

        let uid = identity.generate_uid();
        let payload = match (HandshakePayload { roomid: channel_id, uid }).to_json() {
            Ok(payload) => payload,
            Err(e) => {
                error!(channel_id, error = %e, "Failed to encode handshake payload");
                connection.close().await;
                state.send_replace(SessionState::Closed);
                return Err(SessionError::Encode(e));
            }
        };

        let handshake = encoder.pack(PacketMsgType::Handshake, &payload);
        if let Err(e) = connection.write_and_flush(handshake).await {
            error!(channel_id, error = %e, "Handshake failed, closing connection");
            connection.close().await;
            state.send_replace(SessionState::Closed);
            return Err(SessionError::Handshake(e));
        }

        info!(channel_id, uid, "Handshake sent");
        state.send_replace(SessionState::Active);

        let ping = encoder.pack(PacketMsgType::Heartbeat, &[]);
        Ok(tokio::spawn(heartbeat_loop(channel_id, connection, ping, state)))
    }
}

async fn heartbeat_loop<C: Connection>(
    channel_id: u64,
    connection: C,
    ping: Bytes,
    state: watch::Sender<SessionState>,
) -> HeartbeatExit {
    // Never reset on success, so sparse failures add up over the whole
    // session. Resetting would change when long-lived sessions shut down.
    let mut errors: u32 = 0;

    let exit = loop {
        if !connection.is_active() {
            break HeartbeatExit::ConnectionClosed { errors };
        }

        match connection.write_and_flush(ping.clone()).await {
            Ok(()) => {
                trace!(channel_id, "Heartbeat...");
                sleep(HEARTBEAT_INTERVAL).await;
            }
            Err(e) => {
                warn!(channel_id, errors, error = %e, "Heartbeat failed");
                if errors > RETRY_LIMIT {
                    break HeartbeatExit::RetryBudgetExhausted { errors };
                }
                errors += 1;
            }
        }
    };

    connection.close().await;
    state.send_replace(SessionState::Closed);
    info!(channel_id, ?exit, "Keepalive session closed");
    exit
}

//! Connection abstraction consumed by the keepalive session

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::TransportError;

/// An open chat connection
///
/// The session owns its connection exclusively; `close` must be idempotent.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Write one frame and flush it
    async fn write_and_flush(&self, frame: Bytes) -> Result<(), TransportError>;

    fn is_active(&self) -> bool;

    async fn close(&self);
}

/// Shared handle, so a caller can keep a clone for closing the connection
/// early while the session owns the other.
#[async_trait]
impl<T: Connection> Connection for Arc<T> {
    async fn write_and_flush(&self, frame: Bytes) -> Result<(), TransportError> {
        (**self).write_and_flush(frame).await
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    async fn close(&self) {
        (**self).close().await;
    }
}

/// TCP connection to a chat server
///
/// Inbound data is drained and discarded; the connection turns inactive as
/// soon as the peer closes or a read fails.
pub struct TcpConnection {
    writer: Mutex<Option<OwnedWriteHalf>>,
    active: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl TcpConnection {
    /// Connect to a chat server
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        debug!(%peer, "Chat connection established");

        let (mut read_half, write_half) = stream.into_split();
        let active = Arc::new(AtomicBool::new(true));

        let reader_active = Arc::clone(&active);
        let reader = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                match read_half.read(&mut buf).await {
                    Ok(0) => {
                        debug!(%peer, "Chat server closed the connection");
                        break;
                    }
                    Ok(n) => trace!(%peer, bytes = n, "Discarding inbound data"),
                    Err(e) => {
                        debug!(%peer, error = %e, "Chat connection read failed");
                        break;
                    }
                }
            }
            reader_active.store(false, Ordering::Release);
        });

        Ok(Self {
            writer: Mutex::new(Some(write_half)),
            active,
            reader,
        })
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn write_and_flush(&self, frame: Bytes) -> Result<(), TransportError> {
        if !self.is_active() {
            return Err(TransportError::Closed);
        }

        let mut writer = self.writer.lock().await;
        let writer = writer.as_mut().ok_or(TransportError::Closed)?;
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    async fn close(&self) {
        self.active.store(false, Ordering::Release);
        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                debug!(error = %e, "Chat connection shutdown failed");
            }
        }
        self.reader.abort();
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

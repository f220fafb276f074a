//! Room discovery and chat keepalive wiring

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{error, info, warn};

use livecmt_core::{BilibiliConfig, Config};
use livecmt_providers::{BilibiliClient, ChatServerAddress, ChatServerLookup, ClientOptions};
use livecmt_session::{Connection, DanmakuFrameEncoder, KeepaliveSession, RandomIdentity, TcpConnection};

fn client_options(config: &BilibiliConfig) -> ClientOptions {
    ClientOptions {
        base_url: config.base_url.clone(),
        user_agent: config.user_agent.clone(),
        app_key: config.app_key.clone(),
        secret_key: config.secret_key.clone(),
        timeout: config.request_timeout(),
    }
}

/// Resolve `alias`, connect to its chat server and keep the connection alive
/// until the server drops it, heartbeats give up, or the process is signalled.
pub async fn run(config: &Config, alias: &str) -> Result<()> {
    let client = BilibiliClient::new(client_options(&config.bilibili))?;

    let discovery = client.discover(alias).await;
    let room_id = discovery
        .room_id()
        .ok_or_else(|| anyhow!("Could not resolve room {alias}"))?
        .to_string();
    match discovery.stream_url() {
        Some(url) => info!(room_id = %room_id, stream_url = url, "Room is streaming"),
        None => warn!(room_id = %room_id, "No playable stream URL for this room"),
    }

    let channel_id: u64 = room_id
        .parse()
        .with_context(|| format!("Room id {room_id} is not numeric"))?;

    let candidates = match client.locate_chat_server(&room_id).await {
        ChatServerLookup::Found(address) => {
            let mut candidates = vec![address];
            candidates.extend(ChatServerAddress::fallbacks());
            candidates
        }
        ChatServerLookup::NotFound => bail!("Room {room_id} does not exist"),
        ChatServerLookup::Unavailable => {
            warn!(room_id = %room_id, "Chat server lookup failed, trying well-known hosts");
            ChatServerAddress::fallbacks()
        }
    };

    let connection = Arc::new(connect_any(&candidates, config.bilibili.request_timeout()).await?);

    let session = KeepaliveSession::new(channel_id, Arc::new(DanmakuFrameEncoder), RandomIdentity);
    let mut heartbeat = session.on_connected(Arc::clone(&connection)).await?;

    tokio::select! {
        exit = &mut heartbeat => {
            let exit = exit?;
            info!(room_id = %room_id, ?exit, "Keepalive session ended");
        }
        () = shutdown_signal() => {
            // The heartbeat loop notices at its next iteration.
            info!(room_id = %room_id, "Closing chat connection");
            connection.close().await;
        }
    }

    Ok(())
}

async fn connect_any(
    candidates: &[ChatServerAddress],
    timeout: std::time::Duration,
) -> Result<TcpConnection> {
    for address in candidates {
        let addr = address.socket_addr();
        match tokio::time::timeout(timeout, TcpConnection::connect(addr.as_str())).await {
            Ok(Ok(connection)) => {
                info!(%addr, "Connected to chat server");
                return Ok(connection);
            }
            Ok(Err(e)) => warn!(%addr, error = %e, "Failed to connect to chat server"),
            Err(_) => warn!(%addr, "Timed out connecting to chat server"),
        }
    }

    error!("No chat server reachable");
    Err(anyhow!("No chat server reachable out of {} candidate(s)", candidates.len()))
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}

//! Bilibili Live Client Types

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://live.bilibili.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.8,en;q=0.6,ja;q=0.4";

/// Well-known chat hosts, tried when the lookup endpoint is unreachable.
pub const FALLBACK_CHAT_HOSTS: [&str; 3] = [
    "livecmt-2.bilibili.com",
    "livecmt-1.bilibili.com",
    "chat.bilibili.com",
];
pub const DEFAULT_CHAT_PORT: u16 = 2243;

/// Client options
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Scheme and host of the live site, without trailing slash
    pub base_url: String,
    pub user_agent: String,
    pub app_key: String,
    pub secret_key: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            app_key: String::new(),
            secret_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Chat server address as reported by the player endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatServerAddress {
    pub host: String,
    pub port: String,
}

impl ChatServerAddress {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }

    /// Parse the port; `None` when the server sent something non-numeric.
    #[must_use]
    pub fn port_number(&self) -> Option<u16> {
        self.port.trim().parse().ok()
    }

    /// `host:port` form suitable for `TcpStream::connect`
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port.trim())
    }

    /// Well-known chat servers in preference order
    #[must_use]
    pub fn fallbacks() -> Vec<ChatServerAddress> {
        FALLBACK_CHAT_HOSTS
            .iter()
            .map(|host| ChatServerAddress::new(*host, DEFAULT_CHAT_PORT.to_string()))
            .collect()
    }
}

/// Outcome of a chat server lookup
///
/// `NotFound` is reserved for an explicit 404 from the upstream, so callers
/// can stop retrying rooms that do not exist while still retrying rooms that
/// were only temporarily unreachable (`Unavailable`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatServerLookup {
    Found(ChatServerAddress),
    NotFound,
    Unavailable,
}

impl ChatServerLookup {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, ChatServerLookup::Found(_))
    }

    #[must_use]
    pub const fn may_not_exist(&self) -> bool {
        matches!(self, ChatServerLookup::NotFound)
    }

    #[must_use]
    pub fn address(&self) -> Option<&ChatServerAddress> {
        match self {
            ChatServerLookup::Found(addr) => Some(addr),
            _ => None,
        }
    }
}

/// Outcome of alias to stream URL discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Resolved { room_id: String, stream_url: String },
    /// Room id resolved but no playable URL
    RoomOnly { room_id: String },
    Unresolved,
}

impl Discovery {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Discovery::Resolved { .. })
    }

    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Discovery::Resolved { room_id, .. } | Discovery::RoomOnly { room_id } => {
                Some(room_id.as_str())
            }
            Discovery::Unresolved => None,
        }
    }

    #[must_use]
    pub fn stream_url(&self) -> Option<&str> {
        match self {
            Discovery::Resolved { stream_url, .. } => Some(stream_url.as_str()),
            _ => None,
        }
    }
}

//! Bilibili Live HTTP Client

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, warn};

use super::error::BilibiliError;
use super::sign::SignedRequest;
use super::types::{ChatServerAddress, ChatServerLookup, ClientOptions, Discovery, ACCEPT_LANGUAGE as ACCEPT_LANGUAGE_VALUE};

#[allow(clippy::unwrap_used)]
static ROOM_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"var ROOMID = (\d+);").unwrap());

/// Result marker the play URL endpoint uses for success.
const PLAY_URL_SUCCESS: &str = "suee";

/// Bilibili Live HTTP Client
///
/// Provides:
/// - Room alias resolution (`resolve_room_id`)
/// - Chat server lookup (`locate_chat_server`)
/// - Signed play URL resolution (`resolve_stream_url`)
/// - One-shot discovery (`discover`)
pub struct BilibiliClient {
    client: Client,
    options: ClientOptions,
    page_headers: HeaderMap,
    api_headers: HeaderMap,
}

impl BilibiliClient {
    /// Create a new client
    pub fn new(options: ClientOptions) -> Result<Self, BilibiliError> {
        if options.base_url.is_empty() {
            return Err(BilibiliError::InvalidConfig("base_url is empty".to_string()));
        }

        let client = Client::builder().timeout(options.timeout).build()?;
        let page_headers = build_headers("text/html", &options.user_agent)?;
        let api_headers = build_headers("*/*", &options.user_agent)?;

        Ok(Self {
            client,
            options: ClientOptions {
                base_url: options.base_url.trim_end_matches('/').to_string(),
                ..options
            },
            page_headers,
            api_headers,
        })
    }

    /// Create a client with default options and the given user agent
    pub fn with_user_agent(user_agent: impl Into<String>) -> Result<Self, BilibiliError> {
        Self::new(ClientOptions {
            user_agent: user_agent.into(),
            ..ClientOptions::default()
        })
    }

    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    async fn fetch_text(&self, url: &str, headers: &HeaderMap) -> Result<String, reqwest::Error> {
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await?
            .error_for_status()?;
        response.text().await
    }

    /// Resolve a room alias to its canonical numeric id.
    ///
    /// Best effort: returns `None` when the page cannot be fetched or carries
    /// no embedded room id.
    pub async fn resolve_room_id(&self, alias: &str) -> Option<String> {
        info!(alias, "Resolving canonical room id");

        let url = format!("{}/{alias}", self.options.base_url);
        let html = match self.fetch_text(&url, &self.page_headers).await {
            Ok(html) => html,
            Err(e) => {
                error!(alias, error = %e, "Failed to open live page");
                return None;
            }
        };

        match extract_room_id(&html) {
            Some(room_id) => {
                info!(alias, room_id = %room_id, "Resolved canonical room id");
                Some(room_id)
            }
            None => {
                error!(alias, "Live page carries no room id");
                None
            }
        }
    }

    /// Look up the chat server for a canonical room id.
    pub async fn locate_chat_server(&self, room_id: &str) -> ChatServerLookup {
        let url = format!("{}/api/player?id=cid:{room_id}", self.options.base_url);

        let fragment = match self.fetch_text(&url, &self.api_headers).await {
            Ok(text) => text,
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
                warn!(room_id, "Chat server lookup returned 404, room may not exist");
                return ChatServerLookup::NotFound;
            }
            Err(e) => {
                error!(room_id, error = %e, "Failed to download chat server info");
                return ChatServerLookup::Unavailable;
            }
        };

        if fragment.is_empty() {
            error!(room_id, "Chat server info is empty");
            return ChatServerLookup::Unavailable;
        }

        match parse_chat_server(&fragment) {
            Ok(address) => {
                debug!(room_id, host = %address.host, port = %address.port, "Located chat server");
                ChatServerLookup::Found(address)
            }
            Err(e) => {
                error!(room_id, error = %e, "Failed to parse chat server info");
                ChatServerLookup::Unavailable
            }
        }
    }

    /// Build the signed play URL request for `room_id` at `timestamp`
    #[must_use]
    pub fn signed_request(&self, room_id: &str, timestamp: i64) -> SignedRequest {
        SignedRequest::new(
            &self.options.base_url,
            &self.options.app_key,
            &self.options.secret_key,
            room_id,
            timestamp,
        )
    }

    /// Resolve a playable stream URL for a canonical room id.
    ///
    /// Unlike the lookups above this propagates every failure. An empty URL
    /// in an otherwise successful response is returned as `Ok("")`.
    pub async fn resolve_stream_url(&self, room_id: &str) -> Result<String, BilibiliError> {
        if room_id.is_empty() {
            error!("Stream URL requested without a room id");
            return Err(BilibiliError::InvalidInput("room id is empty".to_string()));
        }

        let request = self.signed_request(room_id, Utc::now().timestamp());

        let body = match self.fetch_text(&request.url, &self.api_headers).await {
            Ok(body) => body,
            Err(e) => {
                error!(room_id, error = %e, "Failed to send play URL request");
                return Err(e.into());
            }
        };

        match parse_play_url(&body) {
            Ok(url) => {
                if !url.is_empty() {
                    info!(room_id, url = %url, "Resolved stream URL");
                }
                Ok(url)
            }
            Err(e) => {
                error!(room_id, error = %e, "Failed to analyze play URL response");
                Err(e)
            }
        }
    }

    /// Resolve an alias all the way to a stream URL without propagating errors
    pub async fn discover(&self, alias: &str) -> Discovery {
        let Some(room_id) = self.resolve_room_id(alias).await else {
            return Discovery::Unresolved;
        };

        match self.resolve_stream_url(&room_id).await {
            Ok(stream_url) if !stream_url.is_empty() => Discovery::Resolved { room_id, stream_url },
            Ok(_) => {
                warn!(room_id = %room_id, "Play URL response carried an empty URL");
                Discovery::RoomOnly { room_id }
            }
            Err(e) => {
                error!(room_id = %room_id, error = %e, "Failed to get stream URL");
                Discovery::RoomOnly { room_id }
            }
        }
    }
}

fn build_headers(accept: &'static str, user_agent: &str) -> Result<HeaderMap, BilibiliError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(accept));
    headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
    Ok(headers)
}

/// Extract the first `var ROOMID = <digits>;` assignment from a live page
#[must_use]
pub fn extract_room_id(html: &str) -> Option<String> {
    ROOM_ID_PATTERN
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse the player endpoint response.
///
/// The endpoint returns a sequence of sibling elements rather than a
/// document, so it is wrapped in a synthetic root before parsing.
pub(crate) fn parse_chat_server(fragment: &str) -> Result<ChatServerAddress, BilibiliError> {
    let wrapped = format!("<root>{fragment}</root>");
    let doc = roxmltree::Document::parse(&wrapped)?;
    let root = doc.root_element();

    let child_text = |name: &str| -> Result<String, BilibiliError> {
        root.children()
            .find(|n| n.has_tag_name(name))
            .map(|n| n.text().unwrap_or_default().to_string())
            .ok_or_else(|| BilibiliError::Parse(format!("missing <{name}> element")))
    };

    Ok(ChatServerAddress {
        host: child_text("dm_server")?,
        port: child_text("dm_port")?,
    })
}

/// Parse the play URL response and return `/video/durl/url`.
pub(crate) fn parse_play_url(xml: &str) -> Result<String, BilibiliError> {
    let doc = roxmltree::Document::parse(xml)?;
    let video = doc.root_element();

    let result = if video.has_tag_name("video") {
        video.children().find(|n| n.has_tag_name("result"))
    } else {
        None
    };

    match result.map(|n| n.text().unwrap_or_default()) {
        Some(PLAY_URL_SUCCESS) => {}
        Some(other) => {
            return Err(BilibiliError::Protocol(format!(
                "no playable url, result marker is {other:?}"
            )));
        }
        None => {
            return Err(BilibiliError::Protocol(
                "no playable url, result marker is missing".to_string(),
            ));
        }
    }

    video
        .children()
        .filter(|n| n.has_tag_name("durl"))
        .flat_map(|durl| durl.children())
        .find(|n| n.has_tag_name("url"))
        .map(|n| n.text().unwrap_or_default().to_string())
        .ok_or_else(|| BilibiliError::Parse("missing <video><durl><url> element".to_string()))
}

//! Bilibili Live Client
//!
//! Pure HTTP client for the legacy live-room API.
//!
//! # Features
//! - Room alias resolution (page scraping)
//! - Chat (danmaku) server lookup
//! - Signed play URL requests
//! - Alias to stream URL discovery

pub mod client;
pub mod error;
pub mod sign;
pub mod types;

pub use client::{extract_room_id, BilibiliClient};
pub use error::BilibiliError;
pub use sign::{sign_params, SignedRequest};
pub use types::*;

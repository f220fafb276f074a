// livecmt Provider Clients
//
// Pure HTTP clients for live-site discovery. Nothing in here knows about the
// chat connection itself; callers take the resolved room id and chat server
// address and hand them to livecmt-session.
//
// Conventions:
// - Room lookup, chat server lookup and discovery never fail: they log and
//   return a negative result (Option / typed enum).
// - Stream URL resolution returns Result so callers can tell why it failed.

pub mod bilibili;

// Re-export client types for convenience
pub use bilibili::{
    BilibiliClient, BilibiliError, ChatServerAddress, ChatServerLookup, ClientOptions, Discovery,
    SignedRequest,
};

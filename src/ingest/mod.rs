//! Playlist ingestion: fetching and parsing M3U sources, and reconciling
//! parsed channels against the known league catalog.

pub mod channel_matcher;
pub mod m3u;

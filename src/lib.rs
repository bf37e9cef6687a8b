//! Sports Stream Routing & Source Federation subsystem.
//!
//! This crate implements the hard-engineering core of the larger Roost
//! streaming platform in isolation: Source Registry, Playlist
//! Ingestor/Channel Matcher, Health Worker, Stream Router, Schedule &
//! Score Sync, and Live-Event SSE Fan-out. Billing, auth, VOD, and the
//! rest of the platform are external collaborators, consumed only
//! through the opaque interfaces documented alongside the HTTP surface.

pub mod broadcast;
pub mod config;
pub mod db;
pub mod errors;
pub mod health;
pub mod http;
pub mod ingest;
pub mod matching;
pub mod models;
pub mod registry;
pub mod router;
pub mod schedule;

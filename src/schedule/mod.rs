//! Schedule Sync and Live Score Poller workers, plus the tolerant
//! decoder shared by both for the upstream sports API's payloads.

pub mod score_poller;
pub mod sync;
pub mod upstream;

//! Core domain entities for the sports stream routing subsystem.
//!
//! Source, Channel, League, Event, Assignment and EventLog. All
//! timestamps are UTC; foreign keys are stored as opaque UUID strings
//! (see `db`).

pub mod assignment;
pub mod channel;
pub mod event;
pub mod event_log;
pub mod league;
pub mod source;

pub use assignment::{AssignedBy, Assignment};
pub use channel::{Channel, RawChannel};
pub use event::{Event, EventStatus};
pub use event_log::EventLog;
pub use league::League;
pub use source::{HealthStatus, Source, SourceCreateRequest, SourceHealthView, SourceKind};

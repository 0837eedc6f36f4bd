//! Reconnoiter core: comparison-tracking state machine and view-model helpers.
mod config;
mod effect;
mod event;
mod msg;
mod query;
mod session;
mod state;
mod update;
mod view_model;

pub use config::TrackerConfig;
pub use effect::Effect;
pub use event::{ComparisonId, ComparisonResult, JobEvent, ProgressSnapshot, Step};
pub use msg::Msg;
pub use query::{validate_query, QueryError};
pub use session::{JobSession, JobTicket, SessionId, TransportKind};
pub use state::{Phase, TrackerState};
pub use update::update;
pub use view_model::{ProgressView, StepMarker, TrackerView, DEFAULT_TITLE};

use reconnoiter_core::{JobEvent, JobSession, SessionId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    /// Non-success response. `message` is the backend's own message when it
    /// sent one, otherwise `API Error: <code> <reason>`.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// A comparison job the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedJob {
    pub session_id: SessionId,
    pub channel_endpoint: Option<String>,
    pub poll_endpoint: Option<String>,
}

impl CreatedJob {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            channel_endpoint: None,
            poll_endpoint: None,
        }
    }

    pub fn into_session(self, credential: Option<String>) -> JobSession {
        JobSession {
            session_id: self.session_id,
            credential,
            channel_endpoint: self.channel_endpoint,
            poll_endpoint: self.poll_endpoint,
        }
    }
}

/// What a transport reports. `Connected`, `Disconnected` and `Rejected` only
/// come from the channel; both transports produce `Event`.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportSignal {
    Connected,
    Disconnected,
    Rejected,
    Event(JobEvent),
}

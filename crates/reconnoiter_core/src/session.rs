use std::fmt;

/// Local correlation number handed out on every submission.
///
/// Tickets exist before the backend assigns a session id, so a late reply to
/// an abandoned submission can still be told apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobTicket(pub u64);

impl fmt::Display for JobTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque backend session id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One accepted comparison job, plus what is needed to follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSession {
    pub session_id: SessionId,
    /// Authorizes the realtime channel. Without it the job is polled.
    pub credential: Option<String>,
    /// Channel endpoint suggested by the backend, possibly relative.
    pub channel_endpoint: Option<String>,
    /// Status endpoint suggested by the backend, possibly relative.
    pub poll_endpoint: Option<String>,
}

impl JobSession {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            credential: None,
            channel_endpoint: None,
            poll_endpoint: None,
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Channel,
    Poll,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Channel => write!(f, "channel"),
            TransportKind::Poll => write!(f, "poll"),
        }
    }
}

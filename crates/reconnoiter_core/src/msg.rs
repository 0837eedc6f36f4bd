use crate::{JobEvent, JobSession, JobTicket, TransportKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User submitted a query (raw, untrimmed).
    QuerySubmitted(String),
    /// Backend accepted the job created for `ticket`.
    JobAccepted {
        ticket: JobTicket,
        session: JobSession,
    },
    /// Job creation failed for `ticket`.
    JobRejected { ticket: JobTicket, reason: String },
    /// Channel subscription confirmed.
    ChannelConnected { ticket: JobTicket },
    /// Channel dropped or never came up.
    ChannelDisconnected { ticket: JobTicket },
    /// Channel subscription refused by the server.
    ChannelRejected { ticket: JobTicket },
    /// The channel did not confirm in time.
    ConnectTimeoutElapsed { ticket: JobTicket },
    /// A job event delivered by `origin`.
    TransportEvent {
        ticket: JobTicket,
        origin: TransportKind,
        event: JobEvent,
    },
    /// User asked to stop tracking.
    CancelRequested,
}

use std::time::Duration;

use crate::{ComparisonResult, JobSession, JobTicket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue exactly one create-comparison request.
    SubmitJob { ticket: JobTicket, query: String },
    /// Open the realtime channel for the session.
    OpenChannel {
        ticket: JobTicket,
        session: JobSession,
    },
    ArmConnectTimeout { ticket: JobTicket, after: Duration },
    DisarmConnectTimeout { ticket: JobTicket },
    /// Start the status poller. Any transport still held is torn down first.
    StartPolling {
        ticket: JobTicket,
        session: JobSession,
        interval: Duration,
    },
    /// Tear down the active transport and the connect timer.
    ReleaseTransport { ticket: JobTicket },
    ScheduleNavigation {
        ticket: JobTicket,
        target: ComparisonResult,
        delay: Duration,
    },
}

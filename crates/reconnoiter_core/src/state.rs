use crate::view_model::{ProgressView, TrackerView};
use crate::{ComparisonResult, JobSession, JobTicket, ProgressSnapshot, TrackerConfig, TransportKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Creating,
    Tracking,
    Complete,
    Failed,
}

impl Phase {
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Creating | Phase::Tracking)
    }
}

/// Which transport the live job is currently listening on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransportSlot {
    Empty,
    Channel { connected: bool },
    Poll,
}

impl TransportSlot {
    pub(crate) fn kind(self) -> Option<TransportKind> {
        match self {
            TransportSlot::Empty => None,
            TransportSlot::Channel { .. } => Some(TransportKind::Channel),
            TransportSlot::Poll => Some(TransportKind::Poll),
        }
    }
}

/// The one job that may still change displayed state.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LiveJob {
    pub(crate) ticket: JobTicket,
    pub(crate) session: Option<JobSession>,
    pub(crate) transport: TransportSlot,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerState {
    config: TrackerConfig,
    phase: Phase,
    last_ticket: u64,
    live: Option<LiveJob>,
    progress: ProgressSnapshot,
    error: Option<String>,
    result: Option<ComparisonResult>,
    dirty: bool,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Ticket of the job that may still change displayed state.
    pub fn live_ticket(&self) -> Option<JobTicket> {
        self.live.as_ref().map(|job| job.ticket)
    }

    pub fn view(&self) -> TrackerView {
        let session_id = self
            .live
            .as_ref()
            .and_then(|job| job.session.as_ref())
            .map(|session| session.session_id.to_string());
        TrackerView {
            phase: self.phase,
            in_progress: self.phase.is_active(),
            progress: ProgressView::from_snapshot(&self.progress),
            error: self.error.clone(),
            comparison_id: self.result.as_ref().map(|result| result.comparison_id),
            session_id,
            transport: self
                .live
                .as_ref()
                .and_then(|job| job.transport.kind()),
        }
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn live_job(&self, ticket: JobTicket) -> Option<&LiveJob> {
        self.live.as_ref().filter(|job| job.ticket == ticket)
    }

    pub(crate) fn live_job_mut(&mut self, ticket: JobTicket) -> Option<&mut LiveJob> {
        self.live.as_mut().filter(|job| job.ticket == ticket)
    }

    /// Starts a fresh job and returns its ticket along with the ticket of any
    /// job it displaces.
    pub(crate) fn begin_job(&mut self) -> (JobTicket, Option<JobTicket>) {
        let displaced = self.live_ticket();
        self.last_ticket += 1;
        let ticket = JobTicket(self.last_ticket);
        self.live = Some(LiveJob {
            ticket,
            session: None,
            transport: TransportSlot::Empty,
        });
        self.phase = Phase::Creating;
        self.progress = ProgressSnapshot::default();
        self.error = None;
        self.result = None;
        self.mark_dirty();
        (ticket, displaced)
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.mark_dirty();
    }

    pub(crate) fn set_progress(&mut self, progress: ProgressSnapshot) {
        self.progress = progress;
        self.mark_dirty();
    }

    pub(crate) fn set_error(&mut self, error: Option<String>) {
        self.error = error;
        self.mark_dirty();
    }

    pub(crate) fn set_result(&mut self, result: ComparisonResult) {
        self.result = Some(result);
        self.mark_dirty();
    }

    /// Drops the live job; anything still addressed to it is ignored from now on.
    pub(crate) fn end_job(&mut self) {
        self.live = None;
        self.mark_dirty();
    }
}

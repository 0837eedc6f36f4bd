#![allow(dead_code)]

use std::sync::Once;

use reconnoiter_core::{
    update, ComparisonResult, Effect, JobEvent, JobSession, JobTicket, Msg, ProgressSnapshot,
    TrackerState, TransportKind,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(reconnoiter_logging::initialize_for_tests);
}

pub fn ticket_of(effects: &[Effect]) -> JobTicket {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::SubmitJob { ticket, .. } => Some(*ticket),
            _ => None,
        })
        .expect("submit effect")
}

/// Submits `query` and returns the state together with the new ticket.
pub fn submit(state: TrackerState, query: &str) -> (TrackerState, JobTicket) {
    let (state, effects) = update(state, Msg::QuerySubmitted(query.to_string()));
    let ticket = ticket_of(&effects);
    (state, ticket)
}

/// Submits and accepts a job. `credential` decides which transport starts.
pub fn tracking(credential: Option<&str>) -> (TrackerState, JobTicket, Vec<Effect>) {
    let (state, ticket) = submit(TrackerState::new(), "rust websocket client");
    let mut session = JobSession::new("abc");
    session.credential = credential.map(ToOwned::to_owned);
    let (state, effects) = update(state, Msg::JobAccepted { ticket, session });
    (state, ticket, effects)
}

pub fn progress(percentage: f64) -> JobEvent {
    JobEvent::Progress(ProgressSnapshot {
        percentage,
        ..ProgressSnapshot::default()
    })
}

pub fn complete(comparison_id: u64) -> JobEvent {
    JobEvent::Complete {
        result: ComparisonResult {
            comparison_id,
            redirect_url: None,
        },
        message: Some("Complete!".to_string()),
    }
}

pub fn deliver(
    state: TrackerState,
    ticket: JobTicket,
    origin: TransportKind,
    event: JobEvent,
) -> (TrackerState, Vec<Effect>) {
    update(
        state,
        Msg::TransportEvent {
            ticket,
            origin,
            event,
        },
    )
}

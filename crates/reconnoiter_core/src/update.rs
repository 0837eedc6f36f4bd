use crate::state::TransportSlot;
use crate::{
    validate_query, Effect, JobEvent, JobSession, JobTicket, Msg, Phase, ProgressSnapshot,
    QueryError, TrackerState, TransportKind,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Every message addressed to a job carries its ticket. Once a job ends
/// (terminal event, cancel, or a newer submission) its ticket no longer
/// matches and whatever its transports still deliver is dropped here.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::QuerySubmitted(raw) => submit(&mut state, &raw),
        Msg::JobAccepted { ticket, session } => accept(&mut state, ticket, session),
        Msg::JobRejected { ticket, reason } => {
            if state.phase() == Phase::Creating && state.live_job(ticket).is_some() {
                state.end_job();
                state.set_error(Some(reason));
                state.set_phase(Phase::Failed);
            }
            Vec::new()
        }
        Msg::ChannelConnected { ticket } => match state.live_job_mut(ticket) {
            Some(job) if job.transport == TransportSlot::Channel { connected: false } => {
                job.transport = TransportSlot::Channel { connected: true };
                vec![Effect::DisarmConnectTimeout { ticket }]
            }
            _ => Vec::new(),
        },
        Msg::ConnectTimeoutElapsed { ticket } => {
            if channel_connected(&state, ticket) == Some(false) {
                fail_over(&mut state, ticket)
            } else {
                Vec::new()
            }
        }
        Msg::ChannelDisconnected { ticket } | Msg::ChannelRejected { ticket } => {
            if channel_connected(&state, ticket).is_some() {
                fail_over(&mut state, ticket)
            } else {
                Vec::new()
            }
        }
        Msg::TransportEvent {
            ticket,
            origin,
            event,
        } => apply_event(&mut state, ticket, origin, event),
        Msg::CancelRequested => cancel(&mut state),
    };

    (state, effects)
}

fn submit(state: &mut TrackerState, raw: &str) -> Vec<Effect> {
    let query = match validate_query(raw, state.config().max_query_len) {
        Ok(query) => query,
        Err(QueryError::Empty) => return Vec::new(),
        Err(err @ QueryError::TooLong { .. }) => {
            // A live job keeps its display; the caller sees the error from validation.
            if !state.phase().is_active() {
                state.set_progress(ProgressSnapshot::default());
                state.set_error(Some(err.to_string()));
                state.set_phase(Phase::Failed);
            }
            return Vec::new();
        }
    };

    let (ticket, displaced) = state.begin_job();
    let mut effects = Vec::with_capacity(2);
    if let Some(old) = displaced {
        effects.push(Effect::ReleaseTransport { ticket: old });
    }
    effects.push(Effect::SubmitJob { ticket, query });
    effects
}

fn accept(state: &mut TrackerState, ticket: JobTicket, session: JobSession) -> Vec<Effect> {
    if state.phase() != Phase::Creating {
        return Vec::new();
    }
    let poll_interval = state.config().poll_interval;
    let connect_timeout = state.config().connect_timeout;
    let Some(job) = state.live_job_mut(ticket) else {
        return Vec::new();
    };

    let has_credential = session
        .credential
        .as_deref()
        .is_some_and(|credential| !credential.is_empty());
    let effects = if has_credential {
        job.transport = TransportSlot::Channel { connected: false };
        vec![
            Effect::OpenChannel {
                ticket,
                session: session.clone(),
            },
            Effect::ArmConnectTimeout {
                ticket,
                after: connect_timeout,
            },
        ]
    } else {
        job.transport = TransportSlot::Poll;
        vec![Effect::StartPolling {
            ticket,
            session: session.clone(),
            interval: poll_interval,
        }]
    };
    job.session = Some(session);

    state.set_progress(ProgressSnapshot::default());
    state.set_phase(Phase::Tracking);
    effects
}

/// `Some(connected)` when the live job for `ticket` is on the channel.
fn channel_connected(state: &TrackerState, ticket: JobTicket) -> Option<bool> {
    match state.live_job(ticket)?.transport {
        TransportSlot::Channel { connected } => Some(connected),
        TransportSlot::Empty | TransportSlot::Poll => None,
    }
}

fn fail_over(state: &mut TrackerState, ticket: JobTicket) -> Vec<Effect> {
    let interval = state.config().poll_interval;
    let Some(job) = state.live_job_mut(ticket) else {
        return Vec::new();
    };
    let Some(session) = job.session.clone() else {
        return Vec::new();
    };
    job.transport = TransportSlot::Poll;
    state.mark_dirty();

    vec![
        Effect::ReleaseTransport { ticket },
        Effect::StartPolling {
            ticket,
            session,
            interval,
        },
    ]
}

fn apply_event(
    state: &mut TrackerState,
    ticket: JobTicket,
    origin: TransportKind,
    event: JobEvent,
) -> Vec<Effect> {
    if state.phase() != Phase::Tracking {
        return Vec::new();
    }
    match state.live_job(ticket) {
        Some(job) if job.transport.kind() == Some(origin) => {}
        _ => return Vec::new(),
    }

    match event {
        JobEvent::Progress(snapshot) => {
            state.set_progress(snapshot);
            Vec::new()
        }
        JobEvent::Complete { result, message } => {
            let delay = state.config().navigation_delay;
            state.set_progress(ProgressSnapshot {
                percentage: 100.0,
                message,
                ..ProgressSnapshot::default()
            });
            state.set_result(result.clone());
            state.end_job();
            state.set_phase(Phase::Complete);
            vec![
                Effect::ReleaseTransport { ticket },
                Effect::ScheduleNavigation {
                    ticket,
                    target: result,
                    delay,
                },
            ]
        }
        JobEvent::Failed { reason } => {
            state.set_error(Some(reason));
            state.end_job();
            state.set_phase(Phase::Failed);
            vec![Effect::ReleaseTransport { ticket }]
        }
    }
}

fn cancel(state: &mut TrackerState) -> Vec<Effect> {
    match state.phase() {
        Phase::Creating | Phase::Tracking => {
            let effects = state
                .live_ticket()
                .map(|ticket| vec![Effect::ReleaseTransport { ticket }])
                .unwrap_or_default();
            state.end_job();
            state.set_progress(ProgressSnapshot::default());
            state.set_error(None);
            state.set_phase(Phase::Idle);
            effects
        }
        Phase::Failed => {
            state.set_progress(ProgressSnapshot::default());
            state.set_error(None);
            state.set_phase(Phase::Idle);
            Vec::new()
        }
        // Navigation is already scheduled once complete.
        Phase::Idle | Phase::Complete => Vec::new(),
    }
}

mod common;

use std::time::Duration;

use common::{complete, deliver, init_logging, progress, tracking};
use pretty_assertions::assert_eq;
use reconnoiter_core::{
    update, ComparisonResult, Effect, JobEvent, Msg, Phase, TransportKind,
};

fn navigations(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::ScheduleNavigation { .. }))
        .count()
}

#[test]
fn polled_job_completes_and_schedules_one_navigation() {
    init_logging();
    let (state, ticket, _) = tracking(Some("jwt"));
    let (state, _) = update(state, Msg::ConnectTimeoutElapsed { ticket });

    let (state, _) = deliver(state, ticket, TransportKind::Poll, progress(40.0));
    assert_eq!(state.view().progress.percentage, 40.0);

    let (mut state, effects) = deliver(state, ticket, TransportKind::Poll, complete(7));
    assert_eq!(
        effects,
        vec![
            Effect::ReleaseTransport { ticket },
            Effect::ScheduleNavigation {
                ticket,
                target: ComparisonResult {
                    comparison_id: 7,
                    redirect_url: None,
                },
                delay: Duration::from_millis(500),
            },
        ]
    );
    let view = state.view();
    assert_eq!(view.phase, Phase::Complete);
    assert!(!view.in_progress);
    assert_eq!(view.progress.percentage, 100.0);
    assert_eq!(view.progress.percent_label, 100);
    assert_eq!(view.progress.message.as_deref(), Some("Complete!"));
    assert_eq!(view.comparison_id, Some(7));
    assert_eq!(view.transport, None);
    assert!(state.consume_dirty());

    // Stragglers from either transport change nothing.
    let before = state.view();
    let (state, effects) = deliver(state, ticket, TransportKind::Poll, complete(7));
    assert_eq!(navigations(&effects), 0);
    let (state, effects) = deliver(state, ticket, TransportKind::Channel, progress(10.0));
    assert!(effects.is_empty());
    let (mut state, effects) = update(state, Msg::ChannelDisconnected { ticket });
    assert!(effects.is_empty());
    assert_eq!(state.view(), before);
    assert!(!state.consume_dirty());
}

#[test]
fn channel_error_fails_the_job() {
    init_logging();
    let (state, ticket, _) = tracking(Some("jwt"));
    let (state, _) = update(state, Msg::ChannelConnected { ticket });

    let (state, effects) = deliver(
        state,
        ticket,
        TransportKind::Channel,
        JobEvent::Failed {
            reason: "quota exceeded".into(),
        },
    );
    assert_eq!(effects, vec![Effect::ReleaseTransport { ticket }]);
    let view = state.view();
    assert_eq!(view.phase, Phase::Failed);
    assert_eq!(view.error.as_deref(), Some("quota exceeded"));
    assert_eq!(view.transport, None);

    // A late completion cannot resurrect the job.
    let (state, effects) = deliver(state, ticket, TransportKind::Channel, complete(9));
    assert!(effects.is_empty());
    assert_eq!(state.view().phase, Phase::Failed);
    assert_eq!(state.view().comparison_id, None);
}

#[test]
fn cancel_while_tracking_resets_everything() {
    init_logging();
    let (state, ticket, _) = tracking(None);
    let (state, _) = deliver(state, ticket, TransportKind::Poll, progress(35.0));

    let (state, effects) = update(state, Msg::CancelRequested);
    assert_eq!(effects, vec![Effect::ReleaseTransport { ticket }]);
    let view = state.view();
    assert_eq!(view.phase, Phase::Idle);
    assert!(!view.in_progress);
    assert_eq!(view.progress.percentage, 0.0);
    assert_eq!(view.error, None);
    assert_eq!(state.live_ticket(), None);

    let (state, effects) = deliver(state, ticket, TransportKind::Poll, complete(3));
    assert!(effects.is_empty());
    assert_eq!(state.view().phase, Phase::Idle);
}

#[test]
fn cancel_after_failure_dismisses_error() {
    init_logging();
    let (state, ticket, _) = tracking(None);
    let (state, _) = deliver(
        state,
        ticket,
        TransportKind::Poll,
        JobEvent::Failed {
            reason: "An error occurred".into(),
        },
    );

    let (state, effects) = update(state, Msg::CancelRequested);
    assert!(effects.is_empty());
    assert_eq!(state.view().phase, Phase::Idle);
    assert_eq!(state.view().error, None);
}

#[test]
fn cancel_after_completion_keeps_result() {
    init_logging();
    let (state, ticket, _) = tracking(None);
    let (state, _) = deliver(state, ticket, TransportKind::Poll, complete(12));

    let (state, effects) = update(state, Msg::CancelRequested);
    assert!(effects.is_empty());
    assert_eq!(state.view().phase, Phase::Complete);
    assert_eq!(state.view().comparison_id, Some(12));
}

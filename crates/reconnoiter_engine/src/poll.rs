use std::sync::Arc;
use std::time::Duration;

use reconnoiter_core::{JobSession, TransportKind};
use reconnoiter_logging::{recon_debug, recon_info, recon_warn};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::transport::{SignalSink, TaskSlot, Transport};
use crate::{ComparisonApi, StatusResponse, TransportSignal};

/// Asks the status endpoint for the job's state on a fixed interval.
///
/// The first request goes out as soon as the transport starts. Failed or
/// unreadable responses are logged and retried on the next tick; polling ends
/// after a terminal status is reported or when stopped.
pub struct PollTransport {
    api: Arc<dyn ComparisonApi>,
    interval: Duration,
    task: Option<TaskSlot>,
}

impl PollTransport {
    pub fn new(api: Arc<dyn ComparisonApi>, interval: Duration) -> Self {
        Self {
            api,
            interval: interval.max(Duration::from_millis(1)),
            task: None,
        }
    }
}

impl Transport for PollTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Poll
    }

    fn start(&mut self, session: &JobSession, sink: Arc<dyn SignalSink>) {
        self.stop();
        let api = self.api.clone();
        let session = session.clone();
        let interval = self.interval;
        self.task = Some(TaskSlot::spawn(move |cancel| {
            poll_until_terminal(api, session, interval, sink, cancel)
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PollTransport {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_until_terminal(
    api: Arc<dyn ComparisonApi>,
    session: JobSession,
    interval: Duration,
    sink: Arc<dyn SignalSink>,
    cancel: CancellationToken,
) {
    recon_info!(session = session.session_id; "polling status every {:?}", interval);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            status = api.comparison_status(&session) => status,
        };

        match status.and_then(StatusResponse::into_event) {
            Ok(event) => {
                let terminal = event.is_terminal();
                recon_debug!(session = session.session_id; "status: {:?}", event);
                sink.emit(TransportSignal::Event(event));
                if terminal {
                    recon_info!(session = session.session_id; "polling finished");
                    return;
                }
            }
            Err(err) => {
                recon_warn!(session = session.session_id; "status check failed, retrying: {err}");
            }
        }
    }
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reconnoiter_core::{JobSession, TransportKind};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::channel::{ChannelSettings, ChannelTransport};
use crate::poll::PollTransport;
use crate::{ComparisonApi, TransportSignal};

/// Receives transport signals. Implementations must not block.
pub trait SignalSink: Send + Sync {
    fn emit(&self, signal: TransportSignal);
}

/// One way of following a job's progress.
///
/// `start` spawns onto the current tokio runtime. After `stop` returns the
/// transport sends nothing more to the sink it was started with.
pub trait Transport: Send {
    fn kind(&self) -> TransportKind;

    fn start(&mut self, session: &JobSession, sink: Arc<dyn SignalSink>);

    /// Idempotent.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

pub trait TransportFactory: Send + Sync {
    fn channel(&self) -> Box<dyn Transport>;

    fn poll(&self, interval: Duration) -> Box<dyn Transport>;
}

/// Websocket channel plus HTTP polling against the real backend.
pub struct NetworkTransports {
    api: Arc<dyn ComparisonApi>,
    channel: ChannelSettings,
}

impl NetworkTransports {
    pub fn new(api: Arc<dyn ComparisonApi>, channel: ChannelSettings) -> Self {
        Self { api, channel }
    }
}

impl TransportFactory for NetworkTransports {
    fn channel(&self) -> Box<dyn Transport> {
        Box::new(ChannelTransport::new(self.channel.clone()))
    }

    fn poll(&self, interval: Duration) -> Box<dyn Transport> {
        Box::new(PollTransport::new(self.api.clone(), interval))
    }
}

/// A spawned transport task and the token that asks it to finish.
pub(crate) struct TaskSlot {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TaskSlot {
    pub(crate) fn spawn<F, Fut>(task: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(task(cancel.clone()));
        Self { cancel, handle }
    }

    /// Lets the task wind down on its own, e.g. to close a socket cleanly.
    pub(crate) fn cancel(self) {
        self.cancel.cancel();
    }

    pub(crate) fn abort(self) {
        self.cancel.cancel();
        self.handle.abort();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

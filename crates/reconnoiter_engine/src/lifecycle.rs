use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reconnoiter_core::{ComparisonResult, Effect, JobSession, JobTicket, Msg, TransportKind};
use reconnoiter_logging::{recon_debug, recon_info};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::tracker::Inbound;
use crate::transport::{SignalSink, Transport, TransportFactory};
use crate::{ComparisonApi, TransportSignal};

/// Hands the finished comparison to whatever shows it.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &ComparisonResult);
}

/// Live transports and pending timers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub transports: usize,
    pub timers: usize,
}

impl ResourceCounts {
    pub fn is_empty(&self) -> bool {
        self.transports == 0 && self.timers == 0
    }
}

struct ActiveTransport {
    ticket: JobTicket,
    transport: Box<dyn Transport>,
    gate: Arc<AtomicBool>,
}

struct Timer {
    ticket: JobTicket,
    handle: JoinHandle<()>,
}

impl Timer {
    fn pending(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Forwards a transport's signals into the tracker loop as messages for
/// one ticket. Closing the gate silences it for good.
struct TicketedSink {
    ticket: JobTicket,
    origin: TransportKind,
    inbox: UnboundedSender<Inbound>,
    gate: Arc<AtomicBool>,
}

impl SignalSink for TicketedSink {
    fn emit(&self, signal: TransportSignal) {
        if !self.gate.load(Ordering::Acquire) {
            return;
        }
        let ticket = self.ticket;
        let msg = match signal {
            TransportSignal::Connected => Msg::ChannelConnected { ticket },
            TransportSignal::Disconnected => Msg::ChannelDisconnected { ticket },
            TransportSignal::Rejected => Msg::ChannelRejected { ticket },
            TransportSignal::Event(event) => Msg::TransportEvent {
                ticket,
                origin: self.origin,
                event,
            },
        };
        let _ = self.inbox.send(Inbound::Msg(msg));
    }
}

/// Executes effects. Owns every transport and timer a job holds, so at most
/// one transport is live and dropping the controller releases everything.
pub(crate) struct LifecycleController {
    api: Arc<dyn ComparisonApi>,
    transports: Arc<dyn TransportFactory>,
    navigator: Arc<dyn Navigator>,
    inbox: UnboundedSender<Inbound>,
    active: Option<ActiveTransport>,
    connect_timer: Option<Timer>,
    navigation: Option<Timer>,
}

impl LifecycleController {
    pub(crate) fn new(
        api: Arc<dyn ComparisonApi>,
        transports: Arc<dyn TransportFactory>,
        navigator: Arc<dyn Navigator>,
        inbox: UnboundedSender<Inbound>,
    ) -> Self {
        Self {
            api,
            transports,
            navigator,
            inbox,
            active: None,
            connect_timer: None,
            navigation: None,
        }
    }

    pub(crate) fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::SubmitJob { ticket, query } => self.submit(ticket, query),
            Effect::OpenChannel { ticket, session } => {
                let transport = self.transports.channel();
                self.activate(ticket, transport, &session);
            }
            Effect::ArmConnectTimeout { ticket, after } => self.arm_connect_timeout(ticket, after),
            Effect::DisarmConnectTimeout { ticket } => self.disarm_connect_timeout(ticket),
            Effect::StartPolling {
                ticket,
                session,
                interval,
            } => {
                self.disarm_connect_timeout(ticket);
                let transport = self.transports.poll(interval);
                self.activate(ticket, transport, &session);
            }
            Effect::ReleaseTransport { ticket } => self.release(ticket),
            Effect::ScheduleNavigation {
                ticket,
                target,
                delay,
            } => self.schedule_navigation(ticket, target, delay),
        }
    }

    pub(crate) fn resources(&self) -> ResourceCounts {
        let transports = usize::from(self.active.is_some());
        let timers = [&self.connect_timer, &self.navigation]
            .into_iter()
            .flatten()
            .filter(|timer| timer.pending())
            .count();
        ResourceCounts { transports, timers }
    }

    pub(crate) fn shutdown(&mut self) {
        self.close_active();
        if let Some(timer) = self.connect_timer.take() {
            timer.handle.abort();
        }
        if let Some(timer) = self.navigation.take() {
            timer.handle.abort();
        }
    }

    fn submit(&self, ticket: JobTicket, query: String) {
        recon_info!("submitting comparison {ticket}");
        let api = self.api.clone();
        let inbox = self.inbox.clone();
        tokio::spawn(async move {
            let result = api.create_comparison(&query).await;
            let _ = inbox.send(Inbound::Created { ticket, result });
        });
    }

    /// Replaces whatever transport is live. The old one is silenced before
    /// the new one starts.
    fn activate(&mut self, ticket: JobTicket, mut transport: Box<dyn Transport>, session: &JobSession) {
        self.close_active();
        let gate = Arc::new(AtomicBool::new(true));
        let sink = Arc::new(TicketedSink {
            ticket,
            origin: transport.kind(),
            inbox: self.inbox.clone(),
            gate: gate.clone(),
        });
        recon_info!(session = session.session_id; "following {ticket} via {}", transport.kind());
        transport.start(session, sink);
        self.active = Some(ActiveTransport {
            ticket,
            transport,
            gate,
        });
    }

    fn close_active(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.gate.store(false, Ordering::Release);
            active.transport.stop();
            recon_debug!("released {} transport for {}", active.transport.kind(), active.ticket);
        }
    }

    fn release(&mut self, ticket: JobTicket) {
        if self.active.as_ref().is_some_and(|active| active.ticket == ticket) {
            self.close_active();
        }
        self.disarm_connect_timeout(ticket);
    }

    fn arm_connect_timeout(&mut self, ticket: JobTicket, after: Duration) {
        if let Some(timer) = self.connect_timer.take() {
            timer.handle.abort();
        }
        let inbox = self.inbox.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = inbox.send(Inbound::Msg(Msg::ConnectTimeoutElapsed { ticket }));
        });
        self.connect_timer = Some(Timer { ticket, handle });
    }

    fn disarm_connect_timeout(&mut self, ticket: JobTicket) {
        if self.connect_timer.as_ref().is_some_and(|timer| timer.ticket == ticket) {
            if let Some(timer) = self.connect_timer.take() {
                timer.handle.abort();
            }
        }
    }

    fn schedule_navigation(&mut self, ticket: JobTicket, target: ComparisonResult, delay: Duration) {
        if let Some(previous) = self.navigation.take() {
            recon_debug!("navigation for {} superseded by {ticket}", previous.ticket);
            previous.handle.abort();
        }
        let navigator = self.navigator.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(&target);
        });
        self.navigation = Some(Timer { ticket, handle });
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

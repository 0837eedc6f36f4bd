use std::sync::Arc;

use reconnoiter_core::{
    update, validate_query, Effect, JobTicket, Msg, QueryError, SessionId, TrackerConfig,
    TrackerState, TrackerView,
};
use reconnoiter_logging::{recon_debug, recon_info, recon_warn};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::channel::ChannelSettings;
use crate::lifecycle::{LifecycleController, Navigator, ResourceCounts};
use crate::transport::{NetworkTransports, TransportFactory};
use crate::{ApiError, ApiSettings, ComparisonApi, CreatedJob, ReqwestComparisonApi};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateError {
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("comparison was cancelled before the backend accepted it")]
    Cancelled,
    #[error("tracker has shut down")]
    Closed,
}

pub(crate) enum Inbound {
    Msg(Msg),
    Create {
        query: String,
        reply: oneshot::Sender<Result<SessionId, CreateError>>,
    },
    Created {
        ticket: JobTicket,
        result: Result<CreatedJob, ApiError>,
    },
    Cancel,
    Inspect {
        reply: oneshot::Sender<ResourceCounts>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Everything a tracker needs from the outside world.
pub struct TrackerParts {
    pub api: Arc<dyn ComparisonApi>,
    pub transports: Arc<dyn TransportFactory>,
    pub navigator: Arc<dyn Navigator>,
    /// Channel credential. Without one every job is polled.
    pub credential: Option<String>,
    pub config: TrackerConfig,
}

impl TrackerParts {
    /// Wires the HTTP client and websocket channel against a real backend.
    /// The API's user token doubles as the channel credential.
    pub fn network(
        api: ApiSettings,
        channel: ChannelSettings,
        navigator: Arc<dyn Navigator>,
        config: TrackerConfig,
    ) -> Result<Self, ApiError> {
        let credential = api.user_token.clone().filter(|token| !token.is_empty());
        let api: Arc<dyn ComparisonApi> = Arc::new(ReqwestComparisonApi::new(api)?);
        let transports = Arc::new(NetworkTransports::new(api.clone(), channel));
        Ok(Self {
            api,
            transports,
            navigator,
            credential,
            config,
        })
    }
}

/// Handle to a running tracker task.
///
/// The task owns the state and every transport; dropping the handle stops it
/// and releases them.
pub struct TrackerHandle {
    inbox: mpsc::UnboundedSender<Inbound>,
    view_rx: watch::Receiver<TrackerView>,
    max_query_len: usize,
    task: Option<JoinHandle<()>>,
}

impl TrackerHandle {
    /// Must be called from within a tokio runtime.
    pub fn spawn(parts: TrackerParts) -> Self {
        let (inbox, inbox_rx) = mpsc::unbounded_channel();
        let max_query_len = parts.config.max_query_len;
        let state = TrackerState::with_config(parts.config);
        let (view_tx, view_rx) = watch::channel(state.view());
        let controller =
            LifecycleController::new(parts.api, parts.transports, parts.navigator, inbox.clone());
        let tracker = TrackerLoop {
            state,
            controller,
            credential: parts.credential,
            pending: None,
            view_tx,
        };
        let task = tokio::spawn(tracker.run(inbox_rx));

        Self {
            inbox,
            view_rx,
            max_query_len,
            task: Some(task),
        }
    }

    /// Submits a query and waits for the backend to accept it.
    ///
    /// Invalid queries fail here without a request. A newer `create` or a
    /// `cancel` issued before the backend answers resolves this one with
    /// [`CreateError::Cancelled`].
    pub async fn create(&self, query: &str) -> Result<SessionId, CreateError> {
        validate_query(query, self.max_query_len)?;
        let (reply, reply_rx) = oneshot::channel();
        self.inbox
            .send(Inbound::Create {
                query: query.to_owned(),
                reply,
            })
            .map_err(|_| CreateError::Closed)?;
        reply_rx.await.map_err(|_| CreateError::Closed)?
    }

    pub fn cancel(&self) {
        let _ = self.inbox.send(Inbound::Cancel);
    }

    pub fn view(&self) -> TrackerView {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackerView> {
        self.view_rx.clone()
    }

    pub async fn resources(&self) -> ResourceCounts {
        let (reply, reply_rx) = oneshot::channel();
        if self.inbox.send(Inbound::Inspect { reply }).is_err() {
            return ResourceCounts::default();
        }
        reply_rx.await.unwrap_or_default()
    }

    /// Releases every transport and timer, then waits for the task to end.
    pub async fn shutdown(mut self) {
        let (done, done_rx) = oneshot::channel();
        if self.inbox.send(Inbound::Shutdown { done }).is_ok() {
            let _ = done_rx.await;
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct PendingCreate {
    ticket: JobTicket,
    reply: oneshot::Sender<Result<SessionId, CreateError>>,
}

struct TrackerLoop {
    state: TrackerState,
    controller: LifecycleController,
    credential: Option<String>,
    pending: Option<PendingCreate>,
    view_tx: watch::Sender<TrackerView>,
}

impl TrackerLoop {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Inbound>) {
        while let Some(inbound) = inbox.recv().await {
            match inbound {
                Inbound::Msg(msg) => {
                    self.dispatch(msg);
                }
                Inbound::Create { query, reply } => self.create(query, reply),
                Inbound::Created { ticket, result } => self.created(ticket, result),
                Inbound::Cancel => {
                    self.resolve_pending(Err(CreateError::Cancelled));
                    self.dispatch(Msg::CancelRequested);
                }
                Inbound::Inspect { reply } => {
                    let _ = reply.send(self.controller.resources());
                }
                Inbound::Shutdown { done } => {
                    self.resolve_pending(Err(CreateError::Closed));
                    self.controller.shutdown();
                    let _ = done.send(());
                    return;
                }
            }
        }
    }

    /// Runs one message through `update`, executes its effects and publishes
    /// the view. Returns the ticket of a job it submitted, if any.
    fn dispatch(&mut self, msg: Msg) -> Option<JobTicket> {
        recon_debug!("applying {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);

        let mut submitted = None;
        for effect in effects {
            if let Effect::SubmitJob { ticket, .. } = &effect {
                submitted = Some(*ticket);
            }
            self.controller.execute(effect);
        }
        if state.consume_dirty() {
            self.view_tx.send_replace(state.view());
        }
        self.state = state;
        submitted
    }

    fn create(&mut self, query: String, reply: oneshot::Sender<Result<SessionId, CreateError>>) {
        self.resolve_pending(Err(CreateError::Cancelled));
        match self.dispatch(Msg::QuerySubmitted(query.clone())) {
            Some(ticket) => self.pending = Some(PendingCreate { ticket, reply }),
            None => {
                let err = match validate_query(&query, self.state.config().max_query_len) {
                    Err(err) => CreateError::from(err),
                    Ok(_) => CreateError::Cancelled,
                };
                let _ = reply.send(Err(err));
            }
        }
    }

    fn created(&mut self, ticket: JobTicket, result: Result<CreatedJob, ApiError>) {
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.ticket == ticket);
        if !is_current {
            recon_debug!("discarding late reply for {ticket}");
            return;
        }

        let outcome = match result {
            Ok(job) => {
                let session = job.into_session(self.credential.clone());
                let session_id = session.session_id.clone();
                recon_info!(session = session_id; "comparison {ticket} accepted");
                self.dispatch(Msg::JobAccepted { ticket, session });
                Ok(session_id)
            }
            Err(err) => {
                recon_warn!("comparison {ticket} was not created: {err}");
                self.dispatch(Msg::JobRejected {
                    ticket,
                    reason: err.to_string(),
                });
                Err(CreateError::Api(err))
            }
        };
        self.resolve_pending(outcome);
    }

    fn resolve_pending(&mut self, outcome: Result<SessionId, CreateError>) {
        if let Some(pending) = self.pending.take() {
            let _ = pending.reply.send(outcome);
        }
    }
}

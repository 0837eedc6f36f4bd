use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use reconnoiter_core::{JobSession, SessionId, TransportKind};
use reconnoiter_logging::{recon_debug, recon_info, recon_warn};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::cable::{self, CableFrame, DEFAULT_CHANNEL};
use crate::transport::{SignalSink, TaskSlot, Transport};
use crate::wire::ChannelMessage;
use crate::TransportSignal;

#[derive(Debug, Clone)]
pub struct ChannelSettings {
    /// Websocket endpoint, e.g. `ws://localhost:3001/cable`.
    pub endpoint: Url,
    pub channel: String,
}

impl ChannelSettings {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }
}

/// Subscribes to the job's status channel over a websocket.
///
/// Connection failures, server disconnects and closed sockets all surface as
/// [`TransportSignal::Disconnected`]; the transport never reconnects itself.
pub struct ChannelTransport {
    settings: ChannelSettings,
    task: Option<TaskSlot>,
}

impl ChannelTransport {
    pub fn new(settings: ChannelSettings) -> Self {
        Self {
            settings,
            task: None,
        }
    }
}

impl Transport for ChannelTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Channel
    }

    fn start(&mut self, session: &JobSession, sink: Arc<dyn SignalSink>) {
        self.stop();
        let Some(credential) = session
            .credential
            .as_deref()
            .filter(|credential| !credential.is_empty())
        else {
            recon_warn!(session = session.session_id; "no credential for the status channel");
            sink.emit(TransportSignal::Rejected);
            return;
        };

        let url = match connect_url(&self.settings, session, credential) {
            Ok(url) => url,
            Err(err) => {
                recon_warn!(session = session.session_id; "bad channel endpoint: {err}");
                sink.emit(TransportSignal::Disconnected);
                return;
            }
        };
        let identifier = cable::subscription_identifier(&self.settings.channel, &session.session_id);
        let session_id = session.session_id.clone();
        self.task = Some(TaskSlot::spawn(move |cancel| {
            run_subscription(url, identifier, session_id, sink, cancel)
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ChannelTransport {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Endpoint (or the backend's hint resolved against it) with the credential
/// as the `token` query parameter.
pub(crate) fn connect_url(
    settings: &ChannelSettings,
    session: &JobSession,
    credential: &str,
) -> Result<Url, url::ParseError> {
    let mut url = match session.channel_endpoint.as_deref() {
        Some(hint) => settings.endpoint.join(hint)?,
        None => settings.endpoint.clone(),
    };
    url.query_pairs_mut().append_pair("token", credential);
    Ok(url)
}

async fn run_subscription(
    url: Url,
    identifier: String,
    session_id: SessionId,
    sink: Arc<dyn SignalSink>,
    cancel: CancellationToken,
) {
    let connected = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = connect_async(url.as_str()) => result,
    };
    let (stream, _response) = match connected {
        Ok(connected) => connected,
        Err(err) => {
            recon_warn!(session = session_id; "channel connect failed: {err}");
            sink.emit(TransportSignal::Disconnected);
            return;
        }
    };
    recon_debug!(session = session_id; "channel socket open");
    let (mut write, mut read) = stream.split();

    let outcome = loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => break None,
            frame = read.next() => frame,
        };
        let text = match frame {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => break Some(TransportSignal::Disconnected),
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                recon_warn!(session = session_id; "channel read failed: {err}");
                break Some(TransportSignal::Disconnected);
            }
        };

        match cable::parse_frame(&text) {
            Ok(CableFrame::Welcome) => {
                let command = cable::subscribe_command(&identifier);
                if let Err(err) = write.send(Message::Text(command)).await {
                    recon_warn!(session = session_id; "subscribe failed: {err}");
                    break Some(TransportSignal::Disconnected);
                }
            }
            Ok(CableFrame::Ping) => {}
            Ok(CableFrame::Confirmed) => {
                recon_info!(session = session_id; "subscribed to status channel");
                sink.emit(TransportSignal::Connected);
            }
            Ok(CableFrame::Rejected) => break Some(TransportSignal::Rejected),
            Ok(CableFrame::Disconnect { reason, .. }) => {
                recon_info!(
                    session = session_id;
                    "server closed the channel: {}",
                    reason.as_deref().unwrap_or("no reason given")
                );
                break Some(TransportSignal::Disconnected);
            }
            Ok(CableFrame::Message {
                identifier: Some(other),
                ..
            }) if other != identifier => {
                recon_debug!(session = session_id; "ignoring frame for {other}");
            }
            Ok(CableFrame::Message { payload, .. }) => {
                match serde_json::from_value::<ChannelMessage>(payload) {
                    Ok(message) => sink.emit(TransportSignal::Event(message.into_event())),
                    Err(err) => {
                        recon_warn!(session = session_id; "unreadable channel message: {err}");
                        break Some(TransportSignal::Disconnected);
                    }
                }
            }
            Ok(CableFrame::Other(kind)) => {
                recon_debug!(session = session_id; "ignoring frame type {kind:?}");
            }
            Err(err) => recon_warn!(session = session_id; "malformed frame: {err}"),
        }
    };

    match outcome {
        Some(signal) => sink.emit(signal),
        None => {
            let _ = write
                .send(Message::Text(cable::unsubscribe_command(&identifier)))
                .await;
            let _ = write.close().await;
            recon_debug!(session = session_id; "channel closed");
        }
    }
}

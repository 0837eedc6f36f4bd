mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use reconnoiter_core::{ComparisonResult, JobEvent, JobSession, ProgressSnapshot, SessionId, Step};
use reconnoiter_engine::{
    subscription_identifier, ChannelSettings, ChannelTransport, Transport, TransportSignal,
    DEFAULT_CHANNEL,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use common::{init_logging, TestSink};

enum ServerStep {
    Send(String),
    Wait(Duration),
    Close,
}

#[derive(Default)]
struct Seen {
    uri: String,
    commands: Vec<Value>,
}

/// Accepts one websocket client, greets it, waits for its subscribe command
/// and then plays `steps`.
async fn cable_server(steps: Vec<ServerStep>) -> (Url, Arc<Mutex<Seen>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Seen::default()));
    let record = seen.clone();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let uri_slot = record.clone();
        let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            uri_slot.lock().unwrap().uri = request.uri().to_string();
            Ok(response)
        };
        let mut ws = accept_hdr_async(stream, callback).await.unwrap();
        ws.send(Message::Text(r#"{"type":"welcome"}"#.to_string()))
            .await
            .unwrap();

        while let Some(Ok(message)) = ws.next().await {
            if let Message::Text(text) = message {
                record
                    .lock()
                    .unwrap()
                    .commands
                    .push(serde_json::from_str(&text).unwrap());
                break;
            }
        }

        for step in steps {
            match step {
                ServerStep::Send(frame) => {
                    if ws.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                ServerStep::Wait(delay) => tokio::time::sleep(delay).await,
                ServerStep::Close => {
                    let _ = ws.close(None).await;
                    return;
                }
            }
        }

        while let Some(Ok(message)) = ws.next().await {
            if let Message::Text(text) = message {
                if let Ok(command) = serde_json::from_str(&text) {
                    record.lock().unwrap().commands.push(command);
                }
            }
        }
    });

    let url = Url::parse(&format!("ws://{addr}/cable")).unwrap();
    (url, seen)
}

fn identifier() -> String {
    subscription_identifier(DEFAULT_CHANNEL, &SessionId::new("abc"))
}

fn broadcast(message: Value) -> ServerStep {
    ServerStep::Send(json!({ "identifier": identifier(), "message": message }).to_string())
}

fn control(kind: &str) -> ServerStep {
    ServerStep::Send(json!({ "type": kind, "identifier": identifier() }).to_string())
}

fn session() -> JobSession {
    JobSession::new("abc").with_credential("jwt.token")
}

#[tokio::test]
async fn subscribes_and_relays_progress() {
    init_logging();
    let (url, seen) = cable_server(vec![
        control("confirm_subscription"),
        ServerStep::Send(json!({ "type": "ping", "message": 1718000000 }).to_string()),
        broadcast(json!({
            "type": "progress",
            "step": "searching_github",
            "message": "Searching GitHub",
            "percentage": 25,
            "current": 1,
            "total": 4,
        })),
        ServerStep::Send(
            json!({ "identifier": "{\"channel\":\"Other\"}", "message": { "type": "error" } })
                .to_string(),
        ),
        broadcast(json!({ "type": "complete", "comparison_id": 7, "redirect_url": "/comparisons/7" })),
    ])
    .await;

    let mut channel = ChannelTransport::new(ChannelSettings::new(url));
    let sink = TestSink::new();
    channel.start(&session(), sink.clone());

    let signals = sink.wait_for(3, Duration::from_secs(5)).await;
    assert_eq!(
        signals,
        vec![
            TransportSignal::Connected,
            TransportSignal::Event(JobEvent::Progress(ProgressSnapshot {
                step: Some(Step::SearchingGithub),
                message: Some("Searching GitHub".into()),
                percentage: 25.0,
                current: Some(1),
                total: Some(4),
            })),
            TransportSignal::Event(JobEvent::Complete {
                result: ComparisonResult {
                    comparison_id: 7,
                    redirect_url: Some("/comparisons/7".into()),
                },
                message: Some("Complete!".into()),
            }),
        ]
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.uri, "/cable?token=jwt.token");
    assert_eq!(
        seen.commands[0],
        json!({ "command": "subscribe", "identifier": identifier() })
    );
}

#[tokio::test]
async fn rejected_subscription_is_reported() {
    init_logging();
    let (url, _seen) = cable_server(vec![control("reject_subscription")]).await;

    let mut channel = ChannelTransport::new(ChannelSettings::new(url));
    let sink = TestSink::new();
    channel.start(&session(), sink.clone());

    assert_eq!(
        sink.wait_for(1, Duration::from_secs(5)).await,
        vec![TransportSignal::Rejected]
    );
}

#[tokio::test]
async fn server_close_reads_as_disconnect() {
    init_logging();
    let (url, _seen) = cable_server(vec![
        control("confirm_subscription"),
        ServerStep::Wait(Duration::from_millis(50)),
        ServerStep::Close,
    ])
    .await;

    let mut channel = ChannelTransport::new(ChannelSettings::new(url));
    let sink = TestSink::new();
    channel.start(&session(), sink.clone());

    assert_eq!(
        sink.wait_for(2, Duration::from_secs(5)).await,
        vec![TransportSignal::Connected, TransportSignal::Disconnected]
    );
}

#[tokio::test]
async fn disconnect_frame_reads_as_disconnect() {
    init_logging();
    let (url, _seen) = cable_server(vec![ServerStep::Send(
        json!({ "type": "disconnect", "reason": "unauthorized", "reconnect": false }).to_string(),
    )])
    .await;

    let mut channel = ChannelTransport::new(ChannelSettings::new(url));
    let sink = TestSink::new();
    channel.start(&session(), sink.clone());

    assert_eq!(
        sink.wait_for(1, Duration::from_secs(5)).await,
        vec![TransportSignal::Disconnected]
    );
}

#[tokio::test]
async fn unreadable_broadcast_after_confirm_reads_as_disconnect() {
    init_logging();
    let (url, _seen) = cable_server(vec![
        control("confirm_subscription"),
        broadcast(json!({ "type": "complete" })),
        broadcast(json!({ "type": "progress", "percentage": 90 })),
    ])
    .await;

    let mut channel = ChannelTransport::new(ChannelSettings::new(url));
    let sink = TestSink::new();
    channel.start(&session(), sink.clone());

    assert_eq!(
        sink.wait_for(2, Duration::from_secs(5)).await,
        vec![TransportSignal::Connected, TransportSignal::Disconnected]
    );
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.signals().len(), 2);
}

#[tokio::test]
async fn refused_connection_reads_as_disconnect() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("ws://{addr}/cable")).unwrap();
    let mut channel = ChannelTransport::new(ChannelSettings::new(url));
    let sink = TestSink::new();
    channel.start(&session(), sink.clone());

    assert_eq!(
        sink.wait_for(1, Duration::from_secs(5)).await,
        vec![TransportSignal::Disconnected]
    );
}

#[tokio::test]
async fn missing_credential_is_rejected_without_connecting() {
    init_logging();
    let url = Url::parse("ws://127.0.0.1:9/cable").unwrap();
    let mut channel = ChannelTransport::new(ChannelSettings::new(url));
    let sink = TestSink::new();
    channel.start(&JobSession::new("abc"), sink.clone());

    assert_eq!(sink.signals(), vec![TransportSignal::Rejected]);
    assert!(!channel.is_running());
}

#[tokio::test]
async fn stopped_channel_goes_quiet_and_unsubscribes() {
    init_logging();
    let (url, seen) = cable_server(vec![
        control("confirm_subscription"),
        ServerStep::Wait(Duration::from_millis(300)),
        broadcast(json!({ "type": "progress", "percentage": 50 })),
    ])
    .await;

    let mut channel = ChannelTransport::new(ChannelSettings::new(url));
    let sink = TestSink::new();
    channel.start(&session(), sink.clone());
    sink.wait_for(1, Duration::from_secs(5)).await;

    channel.stop();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(sink.signals(), vec![TransportSignal::Connected]);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.commands.len(), 2);
    assert_eq!(seen.commands[1]["command"], "unsubscribe");
}

//! WebSocket streaming sessions.
//!
//! # Data Flow
//! ```text
//! attach → subscribe to hub → send full snapshot ("list")
//!       → loop: relay records ("status") | keepalive ping | client frames
//!       → teardown: close frame (1s budget), detach exactly once
//! ```
//!
//! Sessions never touch the shared host table; all host data arrives as
//! copies via the subscription.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::http::server::AppState;
use crate::hub::{Host, Subscription};

/// Budget for keepalive and close-notification writes, so a stalled client
/// cannot block the session or its teardown indefinitely.
const WRITE_BUDGET: Duration = Duration::from_secs(1);

/// JSON payloads sent to streaming clients.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamMessage {
    /// Full host table, sent exactly once immediately after attach.
    List(Vec<Host>),
    /// One relayed status record.
    Status(Host),
}

/// Upgrade handler for the streaming endpoint.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut subscription = state.hub.subscribe();
    let (mut sink, mut stream) = socket.split();

    tracing::debug!(subscription = subscription.id(), "stream session attached");

    run_session(&mut sink, &mut stream, &mut subscription, state.keepalive).await;

    // Teardown, on every exit path: best-effort close notification, then
    // detach. The subscription guard also detaches on drop; unsubscribing is
    // idempotent.
    let _ = time::timeout(WRITE_BUDGET, sink.send(Message::Close(None))).await;
    subscription.detach();

    tracing::debug!(subscription = subscription.id(), "stream session closed");
}

async fn run_session(
    sink: &mut SplitSink<WebSocket, Message>,
    stream: &mut SplitStream<WebSocket>,
    subscription: &mut Subscription,
    keepalive: Duration,
) {
    // Snapshot precedes any incremental update.
    let snapshot = StreamMessage::List(subscription.hosts().to_vec());
    if send_message(sink, &snapshot).await.is_err() {
        return;
    }

    // Keepalives only during genuine silence: the timer starts one period
    // out and is pushed back after every successful forward.
    let mut idle = time::interval_at(Instant::now() + keepalive, keepalive);
    idle.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            record = subscription.recv() => match record {
                Some(host) => {
                    if send_message(sink, &StreamMessage::Status(host)).await.is_err() {
                        return;
                    }
                    idle.reset();
                }
                // Queue closed: the hub is shutting down.
                None => return,
            },
            _ = idle.tick() => {
                let ping = sink.send(Message::Ping(Bytes::new()));
                match time::timeout(WRITE_BUDGET, ping).await {
                    Ok(Ok(())) => {}
                    _ => return,
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                // Pings are answered by the protocol layer; client payloads
                // carry no meaning in this protocol.
                Some(Ok(_)) => {}
            }
        }
    }
}

async fn send_message(
    sink: &mut SplitSink<WebSocket, Message>,
    message: &StreamMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(message) {
        Ok(json) => sink.send(Message::Text(json.into())).await,
        Err(error) => {
            tracing::error!(%error, "failed to serialize stream message");
            Ok(())
        }
    }
}

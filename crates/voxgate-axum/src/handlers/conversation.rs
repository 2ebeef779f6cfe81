//! WebSocket upgrade handler for streaming speech-to-text conversations.
//!
//! `GET /v1/user/new-conversation` upgrades to a WebSocket. Browsers cannot
//! set an `Authorization` header on an upgrade, so the bearer token rides in
//! the `Sec-WebSocket-Protocol` list as `Bearer.<jwt>`; the server selects
//! that entry so the handshake completes.
//!
//! ## Protocol
//!
//! | Direction | Type | Content |
//! |---|---|---|
//! | Client → Server | Binary | Raw audio chunk, forwarded to the transcriber |
//! | Server → Client | Text | `{"type":"transcript","text":"..."}` |
//! | Server → Client | Text | `{"type":"error","message":"..."}`, then close |
//!
//! The `stt` lock taken by the gate is held until the socket closes.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Extension, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use voxgate_core::SessionLease;
use voxgate_core::services::identity::SUBPROTOCOL_BEARER_PREFIX;

use crate::middleware::offered_subprotocols;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerEvent<'a> {
    Transcript { text: &'a str },
    Error { message: &'a str },
}

impl ServerEvent<'_> {
    fn into_message(self) -> Option<Message> {
        serde_json::to_string(&self)
            .ok()
            .map(|json| Message::Text(json.into()))
    }
}

/// `GET /v1/user/new-conversation` - WebSocket upgrade endpoint.
pub async fn new_conversation(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    lease: Option<Extension<SessionLease>>,
) -> Response {
    let bearer = offered_subprotocols(&headers)
        .into_iter()
        .find(|p| p.starts_with(SUBPROTOCOL_BEARER_PREFIX))
        .map(str::to_string);
    let lease = lease.map(|Extension(lease)| lease);

    let ws = match bearer {
        Some(protocol) => ws.protocols([protocol]),
        None => ws,
    };
    ws.on_upgrade(move |socket| run_session(socket, state, lease))
}

async fn run_session(socket: WebSocket, state: AppState, lease: Option<SessionLease>) {
    if let Some(lease) = &lease {
        info!(key = %lease.key(), "Conversation session opened");
    }

    let (mut sender, mut receiver) = socket.split();

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Binary(audio)) => match state.transcriber.transcribe(audio).await {
                Ok(Some(text)) => {
                    let Some(msg) = ServerEvent::Transcript { text: &text }.into_message() else {
                        continue;
                    };
                    if sender.send(msg).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Transcription failed, closing session");
                    let message = e.to_string();
                    if let Some(msg) = (ServerEvent::Error { message: &message }).into_message() {
                        let _ = sender.send(msg).await;
                    }
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            },
            Ok(Message::Close(_)) => break,
            // Ping/pong handled by axum; text frames carry nothing yet.
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "Conversation socket error");
                break;
            }
        }
    }

    if let Some(lease) = lease {
        info!(key = %lease.key(), "Conversation session closed");
        lease.release().await;
    }
}

//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    future,
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{RoomName, Username},
    infrastructure::dto::websocket::InboundPayload,
    ui::state::AppState,
    usecase::ReceiveEvent,
};

/// Query parameters for WebSocket connection. Missing values are empty.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub room: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    tracing::debug!(
        "Upgrade requested by '{}' for room '{}'",
        query.username,
        query.room
    );
    ws.on_failed_upgrade(|e: Error| tracing::warn!("WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| handle_socket(socket, state, query))
}

/// Spawns a task that drains the connection's outbound queue into the
/// WebSocket sink. It ends when the queue is released or the sink fails.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(frame.into())).await {
                tracing::debug!("Outbound sink closed: {}", e);
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, query: ConnectQuery) {
    let (sender, receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let lifecycle = match state
        .lifecycle_manager
        .connect(Username::from(query.username), RoomName::from(query.room), tx)
        .await
    {
        Ok(lifecycle) => Arc::new(lifecycle),
        Err(e) => {
            tracing::error!("Failed to register connection: {}", e);
            return;
        }
    };

    let send_task = pusher_loop(rx, sender);

    let events = receiver.filter_map(|frame| future::ready(to_receive_event(frame)));
    lifecycle.run_isolated(events).await;

    send_task.abort();
}

/// Map one transport frame to a lifecycle event. Control frames other than
/// close yield nothing.
fn to_receive_event(frame: Result<Message, Error>) -> Option<ReceiveEvent> {
    match frame {
        Ok(Message::Text(text)) => Some(decode_frame(text.as_str().as_bytes())),
        Ok(Message::Binary(bytes)) => Some(decode_frame(&bytes)),
        Ok(Message::Close(_)) => Some(ReceiveEvent::Closed),
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
        Err(e) => Some(ReceiveEvent::TransportError(e.to_string())),
    }
}

fn decode_frame(bytes: &[u8]) -> ReceiveEvent {
    match serde_json::from_slice::<InboundPayload>(bytes) {
        Ok(payload) => ReceiveEvent::Message(payload.into()),
        Err(e) => ReceiveEvent::Malformed(e.to_string()),
    }
}

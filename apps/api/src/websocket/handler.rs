//! WebSocket upgrade handler
//!
//! Clients connect to `/ws?userId=<id>`. The id is taken at face value;
//! omitting it opens an anonymous channel that only observes presence.

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Extension, Query,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use super::conversation::validate_identifier;
use super::hub::RealtimeHub;
use super::lifecycle::Session;
use super::messages::{ServerMessage, UserId};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct WsQueryParams {
    /// Caller-supplied user id; absent or empty means anonymous
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
}

impl WsQueryParams {
    /// Validated user id, `Ok(None)` for an anonymous channel
    fn user_id(&self) -> Result<Option<UserId>, &'static str> {
        match self.user_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(id) => validate_identifier(id).map(|()| Some(id.to_string())),
        }
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQueryParams>,
    Extension(hub): Extension<RealtimeHub>,
) -> Response {
    let user_id = match params.user_id() {
        Ok(user_id) => user_id,
        Err(reason) => {
            tracing::warn!(
                user_id = params.user_id.as_deref().unwrap_or_default(),
                "Rejecting WebSocket connection: {}",
                reason
            );
            return ws.on_upgrade(move |mut socket| async move {
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::POLICY,
                        reason: reason.into(),
                    })))
                    .await;
            });
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, user_id, hub))
}

/// Drive an established WebSocket until either direction ends
async fn handle_socket(socket: WebSocket, user_id: Option<UserId>, hub: RealtimeHub) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let mut session = Session::new(hub);
    let connection_id = session.connect(user_id, tx).id();

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Forward queued pushes to the socket in FIFO order
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        tracing::debug!(connection_id = %connection_id, "WebSocket send failed");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        kind = msg.kind(),
                        "Failed to serialize message"
                    );
                }
            }
        }
    });

    // Inbound frames are applied in arrival order
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<String>();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if frame_tx.send(text).is_err() {
                        break;
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(connection_id = %connection_id, "Ignoring binary frame");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Control frames are answered by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id, "WebSocket close received");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, connection_id = %connection_id, "WebSocket error");
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            Some(text) = frame_rx.recv() => session.handle_frame(&text),
            _ = &mut send_task => {
                tracing::debug!(connection_id = %connection_id, "Send task completed");
                recv_task.abort();
                break;
            }
            _ = &mut recv_task => {
                // Apply anything read before the socket closed
                while let Ok(text) = frame_rx.try_recv() {
                    session.handle_frame(&text);
                }
                tracing::debug!(connection_id = %connection_id, "Receive task completed");
                send_task.abort();
                break;
            }
        }
    }

    session.close();
}

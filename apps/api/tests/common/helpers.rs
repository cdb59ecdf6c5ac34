//! Test helper functions for API integration tests

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

use parley_api::config::Config;
use parley_api::routes::build_router;
use parley_api::websocket::messages::TypingUpdatePayload;
use parley_api::websocket::{ClientMessage, ConnectionHandle, RealtimeHub, ServerMessage};

/// An in-process channel: the hub-side handle plus the client's inbox
pub struct TestChannel {
    pub handle: ConnectionHandle,
    pub inbox: mpsc::UnboundedReceiver<ServerMessage>,
}

impl TestChannel {
    pub fn connect(hub: &RealtimeHub, user_id: Option<&str>) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();
        let handle = hub.connect(user_id.map(String::from), tx);
        Self { handle, inbox }
    }

    /// Connect and discard the handshake frames
    pub fn connect_quiet(hub: &RealtimeHub, user_id: Option<&str>) -> Self {
        let mut channel = Self::connect(hub, user_id);
        channel.drain();
        channel
    }

    pub fn send(&self, hub: &RealtimeHub, message: ClientMessage) {
        hub.handle_client_message(&self.handle, message)
            .expect("signal accepted");
    }

    /// Everything delivered so far
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.inbox.try_recv() {
            out.push(msg);
        }
        out
    }

    /// Typing updates delivered so far, other messages discarded
    pub fn typing_updates(&mut self) -> Vec<TypingUpdatePayload> {
        self.drain()
            .into_iter()
            .filter_map(|m| match m {
                ServerMessage::TypingUpdate(update) => Some(update),
                _ => None,
            })
            .collect()
    }

    /// Application events as `(eventName, payload)`, other messages discarded
    pub fn application_events(&mut self) -> Vec<(String, serde_json::Value)> {
        self.drain()
            .into_iter()
            .filter_map(|m| match m {
                ServerMessage::ApplicationEvent(event) => Some((event.event_name, event.payload)),
                _ => None,
            })
            .collect()
    }
}

/// A hub served on an ephemeral local port
pub struct TestServer {
    pub addr: SocketAddr,
    pub hub: RealtimeHub,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let hub = RealtimeHub::default();
        let app = build_router(hub.clone(), Arc::new(Config::default()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server runs");
        });

        Self { addr, hub, task }
    }

    pub fn ws_url(&self, user_id: Option<&str>) -> String {
        match user_id {
            Some(id) => format!("ws://{}/ws?userId={}", self.addr, id),
            None => format!("ws://{}/ws", self.addr),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub async fn ws_connect(url: &str) -> WsClient {
    let (stream, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("websocket handshake");
    stream
}

pub async fn ws_send(client: &mut WsClient, message: &ClientMessage) {
    client
        .send(Message::Text(super::fixtures::frame(message)))
        .await
        .expect("send frame");
}

/// Next server message, skipping control frames; panics after two seconds
pub async fn ws_recv(client: &mut WsClient) -> ServerMessage {
    let deadline = Duration::from_secs(2);
    loop {
        let next = tokio::time::timeout(deadline, client.next())
            .await
            .expect("server message before timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = next {
            return serde_json::from_str(&text).expect("server message parses");
        }
    }
}

/// Receive until `pred` matches, discarding everything before it
pub async fn ws_recv_until<F>(client: &mut WsClient, mut pred: F) -> ServerMessage
where
    F: FnMut(&ServerMessage) -> bool,
{
    loop {
        let msg = ws_recv(client).await;
        if pred(&msg) {
            return msg;
        }
    }
}

/// Poll until `check` holds; panics after two seconds
pub async fn eventually<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    let start = tokio::time::Instant::now();
    while !check() {
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

//! HTTP and WebSocket handlers for the hub

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap},
    response::{IntoResponse, Json, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::connection::Connection;
use crate::message::{
    parse_client_message, ClientRequest, Frame, OutboundMessage, StatsSnapshot, StatusRecord,
};
use crate::probe::StatusProbe;
use crate::registry::ConnectionRegistry;

/// Shared state for handlers
#[derive(Clone)]
pub struct HubState {
    pub registry: ConnectionRegistry,
    pub probe: Arc<dyn StatusProbe>,
    pub stats: StatsSnapshot,
}

/// WebSocket connection endpoint
pub async fn ws_connect(
    State(state): State<HubState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    ws.on_upgrade(move |socket| run_connection(socket, state, client_ip, user_agent))
}

/// Per-connection lifecycle: greet, register, answer requests, unregister.
async fn run_connection(
    socket: WebSocket,
    state: HubState,
    client_ip: Option<String>,
    user_agent: Option<String>,
) {
    let (connection, outbound) = Connection::new(client_ip, user_agent);
    let connection = Arc::new(connection);
    let connection_id = connection.id.clone();

    tracing::info!(
        connection_id = %connection_id,
        client_ip = ?connection.metadata.client_ip,
        "New WebSocket connection"
    );

    let (ws_tx, mut ws_rx) = socket.split();
    let writer = tokio::spawn(write_frames(ws_tx, outbound));

    // Greeting is queued before registration so broadcasts cannot overtake it
    greet(&connection, &state).await;
    state.registry.add(connection.clone());

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_text(&connection, &state, text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    connection_id = %connection_id,
                    error = %e,
                    "WebSocket receive error"
                );
                break;
            }
        }
    }

    state.registry.remove(&connection_id);
    writer.abort();
    tracing::info!(connection_id = %connection_id, "Connection closed");
}

/// Drain the connection's queue onto the socket until either side goes away
async fn write_frames(
    mut ws_tx: futures::stream::SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Frame>,
) {
    while let Some(frame) = outbound.recv().await {
        if ws_tx.send(Message::Text(frame.to_string().into())).await.is_err() {
            break;
        }
    }
}

async fn greet(connection: &Connection, state: &HubState) {
    if let Err(e) = connection.send(&OutboundMessage::Stats(state.stats)).await {
        tracing::debug!(connection_id = %connection.id, error = %e, "Failed to send stats");
        return;
    }

    let status = state.probe.check().await;
    if let Err(e) = connection.send(&status.into()).await {
        tracing::debug!(connection_id = %connection.id, error = %e, "Failed to send status");
    }
}

async fn handle_text(connection: &Connection, state: &HubState, text: &str) {
    match parse_client_message(text) {
        Ok(ClientRequest::Status) => {
            let status = state.probe.check().await;
            if let Err(e) = connection.send(&status.into()).await {
                tracing::debug!(
                    connection_id = %connection.id,
                    error = %e,
                    "Failed to reply with status"
                );
            }
        }
        Ok(ClientRequest::Unknown) => {
            tracing::debug!(connection_id = %connection.id, "Ignoring unrecognised message");
        }
        Err(e) => {
            tracing::warn!(
                connection_id = %connection.id,
                error = %e,
                "Ignoring malformed message"
            );
        }
    }
}

// Health endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connections: usize,
}

pub async fn health(State(state): State<HubState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        connections: state.registry.connection_count(),
    })
}

// Status endpoint
pub async fn get_status(State(state): State<HubState>) -> Json<StatusRecord> {
    Json(state.probe.check().await)
}

// Stats endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub snapshot: StatsSnapshot,
    pub connections: usize,
}

pub async fn get_stats(State(state): State<HubState>) -> impl IntoResponse {
    Json(StatsResponse {
        snapshot: state.stats,
        connections: state.registry.connection_count(),
    })
}

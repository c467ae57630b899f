use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::push::{ClientEvent, InitialData, Pong, PushEvent};

use super::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    let _guard = state.channel.connect();
    log::info!(
        "Client connected: {} ({} total)",
        connection_id,
        state.channel.client_count()
    );

    // The snapshot comes from the renderer, which can trail the channel. A batch
    // it has not applied yet reaches this client with the next update.
    let mut events = state.channel.subscribe();
    let mut shutdown = state.shutdown.clone();
    let (mut sender, mut receiver) = socket.split();

    match initial_data(&state).await {
        Some(initial) => {
            if send_event(&mut sender, &initial).await.is_err() {
                return;
            }
        }
        None => log::error!("Tracker state unavailable, skipping initial_data"),
    }

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    if send_event(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("Client {} lagged, {} events dropped", connection_id, missed);
                }
                Err(RecvError::Closed) => break,
            },
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = client_reply(text.as_str()) {
                        if send_event(&mut sender, &reply).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::debug!("WebSocket error from {}: {}", connection_id, e);
                    break;
                }
            },
        }
    }

    log::info!("Client disconnected: {}", connection_id);
}

/// Reply owed to the client that sent `text`, if any. Unknown frames are ignored.
pub(crate) fn client_reply(text: &str) -> Option<PushEvent> {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(ClientEvent::Ping) => Some(PushEvent::Pong(Pong {
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        })),
        Err(e) => {
            log::debug!("Ignoring client message: {}", e);
            None
        }
    }
}

pub(crate) async fn initial_data(state: &AppState) -> Option<PushEvent> {
    let stats = state.tracker.lock().ok()?.stats();
    let markers = state.renderer.lock().await.snapshot();
    Some(PushEvent::InitialData(InitialData {
        stats,
        markers,
        connected: true,
    }))
}

async fn send_event<S>(sender: &mut S, event: &PushEvent) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to encode {} event: {}", event.name(), e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}

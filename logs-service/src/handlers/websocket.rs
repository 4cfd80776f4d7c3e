//! `GET /ws/logs`: upgrades to a websocket, registers a Stream Hub
//! subscriber, and relays matching log entries as JSON frames.

use crate::metrics;
use crate::server::AppState;
use crate::stream_hub::SubscriberFilter;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};

pub async fn upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (id, mut mailbox) = state
        .stream_hub
        .register(SubscriberFilter::default(), state.config.stream.mailbox_capacity)
        .await;
    metrics::record_subscriber_connected();

    let hub = state.stream_hub.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(entry) = mailbox.recv().await {
            let Ok(text) = serde_json::to_string(&entry) else {
                continue;
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let hub_for_recv = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => {
                    if let Ok(filter) = serde_json::from_str::<SubscriberFilter>(&text) {
                        hub_for_recv.set_filter(id, filter).await;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unregister(id).await;
    metrics::record_subscriber_disconnected();
}

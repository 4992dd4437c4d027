use crate::game::room::Room;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

pub async fn handle_socket(
    socket: WebSocket,
    room: Arc<Room>,
    mut outbound: UnboundedReceiver<Vec<u8>>,
) {
    let (mut sender, mut receiver) = socket.split();

    let send_task = tokio::spawn(async move {
        while let Some(payload) = outbound.recv().await {
            if sender.send(Message::Binary(payload)).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        let Ok(message) = result else { break };
        match message {
            Message::Binary(data) => room.handle_binary_message(&data).await,
            Message::Text(text) => room.handle_text_message(&text).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    room.close().await;
    send_task.abort();
}

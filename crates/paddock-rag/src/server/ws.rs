//! WebSocket transport for question sessions

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::server::session::{run_session, Inbound, QueryChannel};
use crate::server::state::AppState;

/// GET /ws - upgrade and serve questions until the client leaves
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let pipeline = Arc::clone(state.pipeline());
    ws.on_upgrade(move |socket| async move {
        run_session(WsChannel::new(socket), &pipeline).await;
    })
}

/// [`QueryChannel`] over an upgraded WebSocket
pub struct WsChannel {
    socket: WebSocket,
}

impl WsChannel {
    /// Wrap an upgraded socket
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl QueryChannel for WsChannel {
    async fn recv(&mut self) -> Inbound {
        match self.socket.recv().await {
            Some(Ok(message)) => classify(message),
            Some(Err(e)) => {
                tracing::debug!("WebSocket read error: {}", e);
                Inbound::Closed
            }
            None => Inbound::Closed,
        }
    }

    async fn send(&mut self, reply: String) -> Result<()> {
        self.socket
            .send(Message::Text(reply))
            .await
            .map_err(|e| Error::internal(format!("WebSocket send failed: {}", e)))
    }
}

fn classify(message: Message) -> Inbound {
    match message {
        Message::Text(text) => Inbound::Question(text),
        Message::Binary(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Inbound::Question(text),
            Err(_) => {
                tracing::warn!("Skipping binary frame that is not UTF-8");
                Inbound::Ignored
            }
        },
        Message::Ping(_) | Message::Pong(_) => Inbound::Ignored,
        Message::Close(_) => Inbound::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_classification() {
        assert_eq!(
            classify(Message::Text("Who leads?".into())),
            Inbound::Question("Who leads?".into())
        );
        assert_eq!(
            classify(Message::Binary(b"Who leads?".to_vec())),
            Inbound::Question("Who leads?".into())
        );
        assert_eq!(classify(Message::Binary(vec![0xff, 0xfe])), Inbound::Ignored);
        assert_eq!(classify(Message::Ping(vec![1])), Inbound::Ignored);
        assert_eq!(classify(Message::Pong(vec![])), Inbound::Ignored);
        assert_eq!(classify(Message::Close(None)), Inbound::Closed);
    }
}

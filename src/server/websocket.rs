use crate::agent::{ SessionController, Snapshot, TurnOutcome };
use crate::models::chat::Role;
use crate::models::websocket::{ ClientMessage, ServerMessage };

use futures::{ Sink, SinkExt, StreamExt };
use log::{ error, info, warn };
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio_tungstenite::tungstenite::{ self, protocol::Message };
use tokio_tungstenite::WebSocketStream;
use uuid::Uuid;

const MAX_MESSAGE_SIZE: usize = 1 * 1024 * 1024;

fn state_message(snapshot: Snapshot) -> ServerMessage {
    let session = snapshot.session;
    ServerMessage::State {
        turns: session.turns,
        phase: snapshot.phase.to_string(),
        special_event_mode: session.special_event_mode(),
        event_banner: session.event_banner(),
        history: session.history,
    }
}

fn reply_message(outcome: TurnOutcome) -> ServerMessage {
    ServerMessage::Reply {
        role: Role::Assistant,
        content: outcome.reply,
        timestamp: outcome.timestamp,
        turns: outcome.turns,
        special_event_mode: outcome.special_event_mode,
        event_banner: outcome.event_banner,
    }
}

async fn send_json<T>(tx: &mut T, msg: &ServerMessage) -> Result<(), tungstenite::Error>
    where T: Sink<Message, Error = tungstenite::Error> + Unpin
{
    match serde_json::to_string(msg) {
        Ok(json) => tx.send(Message::Text(json)).await,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            Ok(())
        }
    }
}

/// `processing` goes out only once a chat submission has been accepted, so a
/// rejected one is answered with a lone `error`.
async fn respond<T>(
    tx: &mut T,
    controller: &SessionController,
    msg: ClientMessage
) -> Result<ServerMessage, tungstenite::Error>
    where T: Sink<Message, Error = tungstenite::Error> + Unpin
{
    let response = match msg {
        ClientMessage::Chat { content } =>
            match controller.begin_turn(&content).await {
                Ok(turn) => {
                    send_json(tx, &ServerMessage::Processing).await?;
                    reply_message(turn.finish().await)
                }
                Err(e) => ServerMessage::Error { message: e.to_string() },
            }
        ClientMessage::Reset =>
            match controller.reset().await {
                Ok(_) => state_message(controller.snapshot().await),
                Err(e) => ServerMessage::Error { message: e.to_string() },
            }
        ClientMessage::State => state_message(controller.snapshot().await),
    };
    Ok(response)
}

pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    controller: Arc<SessionController>
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    let (mut tx, mut rx) = websocket.split();
    let connection_id = Uuid::new_v4().to_string();
    info!("New WebSocket connection {} from {}", connection_id, peer);

    if let Err(e) = send_json(&mut tx, &state_message(controller.snapshot().await)).await {
        error!("Error sending initial state to {}: {}", peer, e);
        return;
    }

    while let Some(msg) = rx.next().await {
        let message = match msg {
            Ok(message) => message,
            Err(e) => {
                match e {
                    | tungstenite::Error::ConnectionClosed
                    | tungstenite::Error::Protocol(_)
                    | tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        };

        if message.len() > MAX_MESSAGE_SIZE {
            warn!(
                "Message from {} exceeds size limit ({} > {})",
                peer,
                message.len(),
                MAX_MESSAGE_SIZE
            );
            let error_msg = ServerMessage::Error { message: "Message too large".to_string() };
            if send_json(&mut tx, &error_msg).await.is_err() {
                error!("Failed to send size limit error to {}", peer);
            }
            break;
        }

        match message {
            Message::Text(text) => {
                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => client_msg,
                    Err(e) => {
                        warn!("Failed to parse message from {}: {}", peer, e);
                        let error_msg = ServerMessage::Error {
                            message: format!("Failed to parse message: {}", e),
                        };
                        if send_json(&mut tx, &error_msg).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };

                let response = match respond(&mut tx, &controller, client_msg).await {
                    Ok(response) => response,
                    Err(e) => {
                        error!("Error sending processing status to {}: {}", peer, e);
                        break;
                    }
                };
                if let Err(e) = send_json(&mut tx, &response).await {
                    error!("Error sending message to {}: {}", peer, e);
                    break;
                }
            }
            Message::Close(_) => {
                info!("Received close frame from {}", peer);
                break;
            }
            Message::Ping(ping_data) => {
                if tx.send(Message::Pong(ping_data)).await.is_err() {
                    error!("Failed to send pong to {}", peer);
                    break;
                }
            }
            Message::Pong(_) => {}
            Message::Binary(_) => {
                warn!("Ignoring binary message from {}", peer);
            }
            Message::Frame(_) => {}
        }
    }
    info!("WebSocket connection {} closed for {}", connection_id, peer);
}

//! src/routes/notifications.rs
//!
//! WebSocket endpoint browsers keep open while they wait for their PIX
//! payment. After `{"event":"join-room","data":<registrant id>}` the socket
//! receives `{"event":"payment-confirmed","data":{...}}` once the webhook
//! approves that registrant's payment.
use crate::notification::{ConfirmationEvent, Connection, NotificationBridge};
use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use futures::StreamExt;
use serde_json::Value;

#[derive(serde::Deserialize, Debug)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum ClientMessage {
    JoinRoom(Value),
}

#[derive(serde::Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum ServerMessage<'a> {
    PaymentConfirmed(&'a ConfirmationEvent),
}

pub async fn notifications(
    req: HttpRequest,
    body: web::Payload,
    bridge: web::Data<NotificationBridge>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, msg_stream) = actix_ws::handle(&req, body)?;

    let connection = bridge.connect();
    tracing::info!(connection_id = %connection.id(), "Browser connected for payment notifications");

    actix_web::rt::spawn(relay(connection, session, msg_stream));

    Ok(response)
}

// Runs until either side goes away; dropping `connection` leaves every channel.
async fn relay(mut connection: Connection, mut session: Session, mut msg_stream: MessageStream) {
    let connection_id = connection.id();

    loop {
        tokio::select! {
            Some(event) = connection.recv() => {
                let payload = match serde_json::to_string(&ServerMessage::PaymentConfirmed(&event)) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!(%connection_id, "Failed to serialise confirmation: {}", e);
                        continue;
                    }
                };
                if session.text(payload).await.is_err() {
                    break;
                }
            }
            msg = msg_stream.next() => match msg {
                Some(Ok(Message::Text(text))) => handle_client_message(&connection, &text),
                Some(Ok(Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(reason))) => {
                    let _ = session.close(reason).await;
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(%connection_id, "WebSocket error: {}", e);
                    break;
                }
                None => break,
            }
        }
    }

    tracing::info!(%connection_id, "Browser disconnected");
}

fn handle_client_message(connection: &Connection, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::JoinRoom(Value::String(id))) => connection.subscribe(&id),
        Ok(ClientMessage::JoinRoom(Value::Number(id))) => connection.subscribe(&id.to_string()),
        Ok(ClientMessage::JoinRoom(other)) => {
            tracing::debug!(connection_id = %connection.id(), "Ignoring join-room with {}", other)
        }
        Err(e) => {
            tracing::debug!(connection_id = %connection.id(), "Ignoring client message: {}", e)
        }
    }
}

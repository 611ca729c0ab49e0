//! tests/api/notifications.rs

use crate::helpers::{payment_notification, provider_payment, setup};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn join_room(registrant_id: i64) -> Message {
    Message::Text(
        serde_json::json!({ "event": "join-room", "data": registrant_id }).to_string(),
    )
}

#[tokio::test]
async fn a_joined_socket_receives_the_payment_confirmation() {
    // Arrange
    let test = setup().await;
    let registrant_id = test.create_pending_registrant(4001).await;

    let (mut socket, _) = connect_async(test.ws_url())
        .await
        .expect("Failed to open the WebSocket.");
    socket.send(join_room(registrant_id)).await.unwrap();
    test.wait_for_subscribers(registrant_id, 1).await;

    Mock::given(path("/v1/payments/4001"))
        .and(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(provider_payment(4001, "approved", registrant_id)),
        )
        .expect(1)
        .mount(&test.payment_server)
        .await;

    // Act
    let response = test.post_webhook(payment_notification(4001)).await;
    assert_eq!(200, response.status().as_u16());

    // Assert
    let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("No frame arrived in time.")
        .expect("The socket was closed.")
        .expect("Failed to read the frame.");
    let text = match frame {
        Message::Text(text) => text,
        other => panic!("Expected a text frame, got {:?}.", other),
    };

    let frame: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        frame,
        serde_json::json!({
            "event": "payment-confirmed",
            "data": {
                "message": "Payment confirmed successfully!",
                "displayName": "Maria"
            }
        })
    );
}

#[tokio::test]
async fn closing_the_socket_leaves_the_room() {
    // Arrange
    let test = setup().await;
    let registrant_id = test.create_pending_registrant(4001).await;

    let (mut socket, _) = connect_async(test.ws_url())
        .await
        .expect("Failed to open the WebSocket.");
    socket.send(join_room(registrant_id)).await.unwrap();
    test.wait_for_subscribers(registrant_id, 1).await;

    // Act
    socket.close(None).await.unwrap();

    // Assert
    test.wait_for_subscribers(registrant_id, 0).await;
}

#[tokio::test]
async fn malformed_messages_do_not_close_the_socket() {
    // Arrange
    let test = setup().await;
    let registrant_id = test.create_pending_registrant(4001).await;

    let (mut socket, _) = connect_async(test.ws_url())
        .await
        .expect("Failed to open the WebSocket.");

    // Act
    for text in [
        "not json",
        r#"{"event":"join-room","data":"abc"}"#,
        r#"{"event":"leave-room","data":1}"#,
    ] {
        socket.send(Message::Text(text.to_string())).await.unwrap();
    }
    socket.send(join_room(registrant_id)).await.unwrap();

    // Assert
    test.wait_for_subscribers(registrant_id, 1).await;
}

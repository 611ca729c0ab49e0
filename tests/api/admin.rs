//! tests/api/admin.rs

use crate::helpers::{assert_is_redirect_to, payment_notification, provider_payment, setup};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn you_must_be_logged_in_to_access_the_admin_area() {
    // Arrange
    let test = setup().await;

    for path in [
        "/admin/dashboard",
        "/api/registrants",
        "/api/registrants/report",
    ] {
        // Act
        let response = test.get(path).await;

        // Assert
        assert_is_redirect_to(&response, "/login");
    }

    let response = test.delete("/api/registrants/1").await;
    assert_is_redirect_to(&response, "/login");
}

#[tokio::test]
async fn logout_clears_the_session() {
    // Arrange
    let test = setup().await;
    test.login_as_admin().await;

    // Act
    let response = test.get("/logout").await;

    // Assert
    assert_is_redirect_to(&response, "/");
    let response = test.get("/admin/dashboard").await;
    assert_is_redirect_to(&response, "/login");
}

#[tokio::test]
async fn registrants_are_listed_with_their_payment() {
    // Arrange
    let test = setup().await;
    let registrant_id = test.create_pending_registrant(3001).await;
    test.login_as_admin().await;

    // Act
    let response = test.get("/api/registrants").await;

    // Assert
    assert_eq!(200, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();
    let registrants = body.as_array().unwrap();
    assert_eq!(registrants.len(), 1);
    assert_eq!(registrants[0]["id"], registrant_id);
    assert_eq!(registrants[0]["name"], "Maria Souza");
    assert_eq!(registrants[0]["payment"]["status"], "pending");
    assert_eq!(registrants[0]["payment"]["provider_payment_id"], "3001");
}

#[tokio::test]
async fn the_report_filters_by_status_and_totals_approved_payments() {
    // Arrange
    let test = setup().await;
    let registrant_id = test.create_pending_registrant(3001).await;

    Mock::given(path("/v1/payments/3001"))
        .and(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(provider_payment(3001, "approved", registrant_id)),
        )
        .mount(&test.payment_server)
        .await;
    test.post_webhook(payment_notification(3001)).await;
    test.login_as_admin().await;

    // Act
    let approved: serde_json::Value = test
        .get("/api/registrants/report?status=approved")
        .await
        .json()
        .await
        .unwrap();
    let pending: serde_json::Value = test
        .get("/api/registrants/report?status=pending")
        .await
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["registrants"].as_array().unwrap().len(), 1);
    assert_eq!(approved["total_collected"], 0.01);

    assert_eq!(pending["registrants"].as_array().unwrap().len(), 0);
    assert_eq!(pending["total_collected"], 0.0);
}

#[tokio::test]
async fn deleting_a_registrant_removes_the_payment_too() {
    // Arrange
    let test = setup().await;
    let registrant_id = test.create_pending_registrant(3001).await;
    test.login_as_admin().await;

    // Act
    let response = test
        .delete(&format!("/api/registrants/{}", registrant_id))
        .await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    assert!(test.payment_status(registrant_id).await.is_none());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrants")
        .fetch_one(&test.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn deleting_an_unknown_registrant_returns_a_404() {
    // Arrange
    let test = setup().await;
    test.login_as_admin().await;

    // Act
    let response = test.delete("/api/registrants/999999").await;

    // Assert
    assert_eq!(404, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Registrant not found.");
}

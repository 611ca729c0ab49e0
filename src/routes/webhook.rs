//! src/routes/webhook.rs
use crate::domain::RegistrantId;
use crate::notification::{ConfirmationEvent, NotificationBridge};
use crate::payment::mercado_pago::signature::{self, SignatureError};
use crate::payment::{MercadoPago, Payment};
use crate::routes::error_chain_fmt;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use anyhow::Context;
use serde_json::Value;
use sqlx::PgPool;

#[derive(serde::Deserialize, Debug)]
pub struct WebhookNotification {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub data: Option<WebhookNotificationData>,
}

#[derive(serde::Deserialize, Debug)]
pub struct WebhookNotificationData {
    pub id: Value,
}

impl WebhookNotification {
    /// Id of the payment this notification is about, if it is about one.
    fn payment_id(&self) -> Option<String> {
        if self.kind.as_deref() != Some("payment") {
            return None;
        }

        match &self.data.as_ref()?.id {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

#[derive(thiserror::Error)]
pub enum WebhookError {
    #[error("Invalid webhook signature")]
    InvalidSignature(#[from] SignatureError),
}

impl std::fmt::Debug for WebhookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for WebhookError {
    fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Payment provider callback.
///
/// Anything but a forged request is acknowledged with a 200: the provider
/// retries non-2xx answers and a failure here is not fixed by retrying.
#[tracing::instrument(name = "Payment webhook", skip(req, body, pool, mercado_pago, bridge))]
pub async fn payment_webhook(
    req: HttpRequest,
    body: web::Bytes,
    pool: web::Data<PgPool>,
    mercado_pago: web::Data<MercadoPago>,
    bridge: web::Data<NotificationBridge>,
) -> Result<HttpResponse, WebhookError> {
    let notification: WebhookNotification = match serde_json::from_slice(&body) {
        Ok(notification) => notification,
        Err(e) => {
            tracing::warn!("Ignoring unreadable webhook body: {}", e);
            return Ok(HttpResponse::Ok().finish());
        }
    };

    let Some(payment_id) = notification.payment_id() else {
        tracing::info!(kind = ?notification.kind, "Ignoring non-payment notification");
        return Ok(HttpResponse::Ok().finish());
    };

    if let Some(secret) = mercado_pago.webhook_secret() {
        let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());
        signature::verify(secret, header("x-signature"), header("x-request-id"), &payment_id)?;
    }

    if let Err(e) = process_payment(&pool, &mercado_pago, &bridge, &payment_id).await {
        tracing::error!(error.cause_chain = ?e, "Failed to process payment {}", payment_id);
    }

    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(name = "Process payment update", skip(pool, mercado_pago, bridge))]
async fn process_payment(
    pool: &PgPool,
    mercado_pago: &MercadoPago,
    bridge: &NotificationBridge,
    payment_id: &str,
) -> Result<(), anyhow::Error> {
    let payment = mercado_pago
        .get_payment(payment_id)
        .await
        .context("Failed to fetch the payment from the provider")?;

    let reference = payment
        .external_reference
        .as_deref()
        .context("Payment has no external reference")?;
    let registrant_id = RegistrantId::parse(reference)
        .with_context(|| format!("Payment references an unknown registrant {:?}", reference))?;

    let Some(registrant_name) = record_status(pool, registrant_id, &payment).await? else {
        tracing::info!(status = %payment.status, "Payment status unchanged or charge superseded");
        return Ok(());
    };

    if payment.is_approved() {
        let display_name = payment.payer_first_name().unwrap_or(registrant_name.as_str());
        bridge.publish(registrant_id, &ConfirmationEvent::payment_confirmed(display_name));
    }

    Ok(())
}

/// Stores the provider's status on the registrant's current charge. Returns
/// the registrant's name only when the stored status actually changed, so a
/// repeated notification, or one about a charge that was since replaced by a
/// new registration, is a no-op.
#[tracing::instrument(name = "Update payment status", skip(pool, payment), fields(status = %payment.status))]
async fn record_status(
    pool: &PgPool,
    registrant_id: RegistrantId,
    payment: &Payment,
) -> Result<Option<String>, anyhow::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        UPDATE payments
        SET status = $2, updated_at = now()
        FROM registrants
        WHERE payments.registrant_id = $1
          AND registrants.id = payments.registrant_id
          AND payments.provider_payment_id = $3
          AND payments.status <> $2
        RETURNING registrants.name
        "#,
    )
    .bind(registrant_id.as_i64())
    .bind(&payment.status)
    .bind(payment.id.to_string())
    .fetch_optional(pool)
    .await
    .context("Failed to update the payment status")
}

//! src/routes/registrations.rs
use crate::domain::{registrant, NewRegistrant, RegistrantId};
use crate::payment::{MercadoPago, PixCharge};
use crate::routes::error_chain_fmt;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

/// Registration form as posted by the browser. Every field is required but
/// kept optional here so a missing one becomes a validation error instead of
/// a deserialisation failure.
#[derive(serde::Deserialize, Debug, Default)]
pub struct RegistrationForm {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub city: Option<String>,
    pub shirt_size: Option<String>,
    pub gender: Option<String>,
    pub age_group: Option<String>,
    pub phone: Option<String>,
}

#[derive(serde::Serialize)]
pub struct RegistrationResponse {
    pub registrant_id: RegistrantId,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
}

#[derive(thiserror::Error)]
pub enum RegistrationError {
    #[error(transparent)]
    ValidationError(#[from] registrant::Error),
    #[error("Failed to generate the PIX QR code.")]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for RegistrationError {
    fn status_code(&self) -> StatusCode {
        match self {
            RegistrationError::ValidationError(_) => StatusCode::BAD_REQUEST,
            RegistrationError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}

#[tracing::instrument(
    name = "Registering a new participant",
    skip(form, pool, mercado_pago),
    fields(request_id = %Uuid::new_v4(), registrant_id = tracing::field::Empty)
)]
pub async fn register(
    form: web::Json<RegistrationForm>,
    pool: web::Data<PgPool>,
    mercado_pago: web::Data<MercadoPago>,
) -> Result<HttpResponse, RegistrationError> {
    let registrant = NewRegistrant::try_from(form.into_inner())?;

    let registrant_id = upsert_registrant(&pool, &registrant)
        .await
        .context("Failed to store the registrant")?;
    tracing::Span::current().record("registrant_id", tracing::field::display(registrant_id));

    let charge = mercado_pago
        .create_pix_charge(registrant_id, &registrant)
        .await
        .context("Failed to create the PIX charge")?;

    upsert_pending_payment(&pool, registrant_id, &charge)
        .await
        .context("Failed to store the pending payment")?;

    Ok(HttpResponse::Ok().json(RegistrationResponse {
        registrant_id,
        qr_code: charge.qr_code,
        qr_code_base64: charge.qr_code_base64,
    }))
}

// Registering again with the same CPF updates the existing row.
#[tracing::instrument(name = "Saving registrant details in the database", skip(pool, registrant))]
async fn upsert_registrant(
    pool: &PgPool,
    registrant: &NewRegistrant,
) -> Result<RegistrantId, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO registrants (name, cpf, city, shirt_size, gender, age_group, phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (cpf) DO UPDATE
        SET name = EXCLUDED.name,
            city = EXCLUDED.city,
            shirt_size = EXCLUDED.shirt_size,
            gender = EXCLUDED.gender,
            age_group = EXCLUDED.age_group,
            phone = EXCLUDED.phone
        RETURNING id
        "#,
    )
    .bind(registrant.name.as_ref())
    .bind(registrant.cpf.as_ref())
    .bind(&registrant.city)
    .bind(&registrant.shirt_size)
    .bind(&registrant.gender)
    .bind(&registrant.age_group)
    .bind(&registrant.phone)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        e
    })?;

    Ok(RegistrantId::from(id))
}

#[tracing::instrument(name = "Saving pending payment in the database", skip(pool, charge))]
async fn upsert_pending_payment(
    pool: &PgPool,
    registrant_id: RegistrantId,
    charge: &PixCharge,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO payments (registrant_id, provider_payment_id, status, amount)
        VALUES ($1, $2, 'pending', $3)
        ON CONFLICT (registrant_id) DO UPDATE
        SET provider_payment_id = EXCLUDED.provider_payment_id,
            status = 'pending',
            amount = EXCLUDED.amount,
            updated_at = now()
        "#,
    )
    .bind(registrant_id.as_i64())
    .bind(&charge.payment_id)
    .bind(charge.amount)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        e
    })?;

    Ok(())
}

//! src/routes/admin/registrants.rs
use crate::domain::RegistrantId;
use crate::routes::error_chain_fmt;
use crate::session_state::TypedSession;
use crate::utils::{e500, see_other};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(thiserror::Error)]
pub enum AdminError {
    #[error("Registrant not found.")]
    NotFound,
    #[error("Failed to load registrants.")]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for AdminError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for AdminError {
    fn status_code(&self) -> StatusCode {
        match self {
            AdminError::NotFound => StatusCode::NOT_FOUND,
            AdminError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    name: String,
    cpf: String,
    city: String,
    shirt_size: String,
    gender: String,
    age_group: String,
    phone: String,
    created_at: DateTime<Utc>,
    provider_payment_id: Option<String>,
    status: Option<String>,
    amount: Option<f64>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(serde::Serialize, Debug)]
pub struct RegistrantView {
    pub id: RegistrantId,
    pub name: String,
    pub cpf: String,
    pub city: String,
    pub shirt_size: String,
    pub gender: String,
    pub age_group: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub payment: Option<PaymentView>,
}

#[derive(serde::Serialize, Debug)]
pub struct PaymentView {
    pub provider_payment_id: String,
    pub status: String,
    pub amount: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<Row> for RegistrantView {
    fn from(row: Row) -> Self {
        let payment = match (row.provider_payment_id, row.status, row.amount, row.updated_at) {
            (Some(provider_payment_id), Some(status), Some(amount), Some(updated_at)) => {
                Some(PaymentView {
                    provider_payment_id,
                    status,
                    amount,
                    updated_at,
                })
            }
            _ => None,
        };

        Self {
            id: RegistrantId::from(row.id),
            name: row.name,
            cpf: row.cpf,
            city: row.city,
            shirt_size: row.shirt_size,
            gender: row.gender,
            age_group: row.age_group,
            phone: row.phone,
            created_at: row.created_at,
            payment,
        }
    }
}

impl RegistrantView {
    fn payment_status(&self) -> Option<&str> {
        self.payment.as_ref().map(|p| p.status.as_str())
    }
}

#[derive(serde::Deserialize, Debug)]
pub struct ReportQuery {
    status: Option<String>,
}

#[derive(serde::Serialize, Debug)]
pub struct Report {
    pub status: String,
    pub generated_at: DateTime<Utc>,
    pub registrants: Vec<RegistrantView>,
    pub total_collected: f64,
}

impl Report {
    /// Keeps the registrants whose payment has `status` (`all` keeps
    /// everyone) and sums what approved payments collected.
    pub fn new(status: Option<String>, registrants: Vec<RegistrantView>) -> Self {
        let status = status
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "all".to_string());

        let registrants: Vec<RegistrantView> = if status == "all" {
            registrants
        } else {
            registrants
                .into_iter()
                .filter(|r| r.payment_status() == Some(status.as_str()))
                .collect()
        };

        let total_collected = registrants
            .iter()
            .filter_map(|r| r.payment.as_ref())
            .filter(|p| p.status == "approved")
            .map(|p| p.amount)
            .sum();

        Self {
            status,
            generated_at: Utc::now(),
            registrants,
            total_collected,
        }
    }
}

#[tracing::instrument(name = "List registrants", skip(session, pool))]
pub async fn list_registrants(
    session: TypedSession,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, actix_web::Error> {
    if session.get_admin_id().map_err(e500)?.is_none() {
        return Ok(see_other("/login"));
    }

    let registrants = get_registrants(&pool).await?;
    Ok(HttpResponse::Ok().json(registrants))
}

#[tracing::instrument(name = "Registrants report", skip(session, pool))]
pub async fn registrants_report(
    session: TypedSession,
    pool: web::Data<PgPool>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    if session.get_admin_id().map_err(e500)?.is_none() {
        return Ok(see_other("/login"));
    }

    let registrants = get_registrants(&pool).await?;
    let report = Report::new(query.into_inner().status, registrants);
    Ok(HttpResponse::Ok().json(report))
}

#[tracing::instrument(name = "Delete registrant", skip(session, pool))]
pub async fn delete_registrant(
    session: TypedSession,
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, actix_web::Error> {
    if session.get_admin_id().map_err(e500)?.is_none() {
        return Ok(see_other("/login"));
    }

    let registrant_id = RegistrantId::from(path.into_inner());
    remove_registrant(&pool, registrant_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Registrant deleted successfully."
    })))
}

async fn get_registrants(pool: &PgPool) -> Result<Vec<RegistrantView>, AdminError> {
    let rows = sqlx::query_as::<_, Row>(
        r#"
        SELECT r.id, r.name, r.cpf, r.city, r.shirt_size, r.gender, r.age_group,
               r.phone, r.created_at,
               p.provider_payment_id, p.status, p.amount, p.updated_at
        FROM registrants r
        LEFT JOIN payments p ON p.registrant_id = r.id
        ORDER BY r.id ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch registrants")?;

    Ok(rows.into_iter().map(RegistrantView::from).collect())
}

#[tracing::instrument(name = "Remove registrant and payment", skip(pool))]
async fn remove_registrant(pool: &PgPool, registrant_id: RegistrantId) -> Result<(), AdminError> {
    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;

    sqlx::query("DELETE FROM payments WHERE registrant_id = $1")
        .bind(registrant_id.as_i64())
        .execute(&mut *transaction)
        .await
        .context("Failed to delete the payment")?;

    let deleted = sqlx::query("DELETE FROM registrants WHERE id = $1")
        .bind(registrant_id.as_i64())
        .execute(&mut *transaction)
        .await
        .context("Failed to delete the registrant")?;

    if deleted.rows_affected() == 0 {
        return Err(AdminError::NotFound);
    }

    transaction
        .commit()
        .await
        .context("Failed to commit the deletion")?;

    Ok(())
}

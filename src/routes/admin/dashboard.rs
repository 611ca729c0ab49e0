//! src/routes/admin/dashboard.rs

use crate::session_state::TypedSession;
use crate::utils::{e500, see_other};
use actix_web::{http::header::ContentType, web, HttpResponse};
use anyhow::Context;
use uuid::Uuid;

pub async fn admin_dashboard(
    session: TypedSession,
    pool: web::Data<sqlx::PgPool>,
) -> Result<HttpResponse, actix_web::Error> {
    let Some(admin_id) = session.get_admin_id().map_err(e500)? else {
        return Ok(see_other("/login"));
    };

    let email = get_admin_email(admin_id, pool.get_ref())
        .await
        .map_err(e500)?;

    let body = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>Admin dashboard</title>
</head>
<body>
    <p>Welcome {}!</p>
    <ul>
        <li><a href="/api/registrants">Registrants</a></li>
        <li><a href="/api/registrants/report?status=approved">Approved payments report</a></li>
        <li><a href="/logout">Logout</a></li>
    </ul>
</body>
</html>"#,
        htmlescape::encode_minimal(&email)
    );

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body))
}

#[tracing::instrument(name = "Get admin email", skip(pool))]
async fn get_admin_email(admin_id: Uuid, pool: &sqlx::PgPool) -> Result<String, anyhow::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT email
        FROM admins
        WHERE admin_id = $1
        "#,
    )
    .bind(admin_id)
    .fetch_one(pool)
    .await
    .context("Failed to query for the admin email")
}

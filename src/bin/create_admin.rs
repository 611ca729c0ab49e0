//! Creates the organizer account, or resets its password.
//!
//! ```sh
//! ADMIN_EMAIL=admin@corrida.com ADMIN_PASSWORD=... cargo run --bin create_admin
//! ```
use anyhow::Context;
use corrida::authenticate::compute_password_hash;
use corrida::configuration::get_configuration;
use corrida::domain::AdminEmail;
use corrida::startup::get_connection_pool;
use corrida::telemetry::{get_subscriber, init_subscriber};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

#[derive(serde::Deserialize)]
struct NewAdmin {
    email: String,
    password: Secret<String>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("create_admin".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let config = get_configuration()?;
    let new_admin = envy::prefixed("ADMIN_")
        .from_env::<NewAdmin>()
        .context("ADMIN_EMAIL and ADMIN_PASSWORD must be set")?;
    let email = AdminEmail::parse(new_admin.email)?;

    let password_hash = corrida::telemetry::spawn_blocking_with_tracing(move || {
        compute_password_hash(new_admin.password)
    })
    .await
    .context("Failed to spawn blocking thread")??;

    let pool = get_connection_pool(&config)?;
    sqlx::query(
        r#"
        INSERT INTO admins (admin_id, email, password_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET password_hash = EXCLUDED.password_hash
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.as_ref())
    .bind(password_hash.expose_secret())
    .execute(&pool)
    .await
    .context("Failed to store the admin")?;

    tracing::info!(%email, "Admin created or updated");
    Ok(())
}

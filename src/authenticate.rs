//! src/authenticate.rs

use crate::telemetry::spawn_blocking_with_tracing;
use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use secrecy::{ExposeSecret, Secret};
use sqlx::PgPool;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

#[derive(serde::Deserialize, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: Secret<String>,
}

#[tracing::instrument(name = "Authenticate admin", skip(pool, credentials), fields(email = %credentials.email))]
pub async fn authenticate(
    pool: &PgPool,
    credentials: Credentials,
) -> Result<uuid::Uuid, AuthError> {
    let email = credentials.email.trim().to_lowercase();
    let admin = get_admin(pool, &email)
        .await
        .context(format!("Failed to retrieve admin {} from the database", email))
        .map_err(AuthError::UnexpectedError)?;

    // Verify against a dummy hash when the admin is unknown so both paths take
    // the same time.
    let (admin_id, password_hash) = match admin {
        Some(admin) => (Some(admin.admin_id), admin.password_hash),
        None => {
            let hash = "$argon2id$v=19$m=15000,t=2,p=1$\
        gZiV/M1gPc22ElAH/Jh1Hw$\
        CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno"
                .to_string();

            (None, hash)
        }
    };

    spawn_blocking_with_tracing(move || verify_password(credentials.password, password_hash))
        .await
        .context("Failed to spawn blocking thread")
        .map_err(AuthError::UnexpectedError)?
        .context("Failed to verify password")
        .map_err(AuthError::InvalidCredentials)?;

    admin_id
        .ok_or_else(|| anyhow::anyhow!("Unknown admin"))
        .map_err(AuthError::InvalidCredentials)
}

#[derive(sqlx::FromRow)]
struct Admin {
    admin_id: uuid::Uuid,
    password_hash: String,
}

#[tracing::instrument(name = "Get admin from the database", skip(pool))]
async fn get_admin(pool: &PgPool, email: &str) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>(
        r#"
        SELECT admin_id, password_hash
        FROM admins
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

#[tracing::instrument(name = "Verify password hash", skip(password, hash))]
fn verify_password(password: Secret<String>, hash: String) -> Result<(), anyhow::Error> {
    let expected_password_hash =
        PasswordHash::new(&hash).context("Failed to parse password hash")?;

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &expected_password_hash)
        .context("Failed to verify the password")
}

/// Hashes `password` with the same argon2id parameters as the dummy hash above.
pub fn compute_password_hash(password: Secret<String>) -> Result<Secret<String>, anyhow::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let params = Params::new(15000, 2, 1, None)
        .map_err(|e| anyhow::anyhow!("Invalid argon2 parameters: {}", e))?;
    let password_hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(Secret::new(password_hash))
}

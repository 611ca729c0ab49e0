//! src/routes/login/post.rs
use crate::authenticate::{authenticate, AuthError, Credentials};
use crate::configuration::HmacSecret;
use crate::routes::error_chain_fmt;
use crate::session_state::TypedSession;
use crate::utils::see_other;
use actix_web::error::InternalError;
use actix_web::{web, HttpResponse};
use hmac::{Hmac, Mac};
use secrecy::Secret;
use sqlx::PgPool;

#[derive(serde::Deserialize)]
pub struct FormData {
    email: String,
    password: Secret<String>,
}

#[derive(thiserror::Error)]
pub enum LoginError {
    #[error("Authentication failed")]
    AuthError(#[source] anyhow::Error),
    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[tracing::instrument(
    name = "POST /login",
    skip(form, pool, hmac_secret, session),
    fields(email = %form.email, admin_id = tracing::field::Empty)
)]
pub async fn login(
    form: web::Form<FormData>,
    pool: web::Data<PgPool>,
    hmac_secret: web::Data<HmacSecret>,
    session: TypedSession,
) -> Result<HttpResponse, InternalError<LoginError>> {
    let form = form.into_inner();
    let credentials = Credentials {
        email: form.email,
        password: form.password,
    };

    let admin_id = authenticate(&pool, credentials).await.map_err(|e| {
        let e = match e {
            AuthError::InvalidCredentials(_) => LoginError::AuthError(e.into()),
            AuthError::UnexpectedError(_) => LoginError::UnexpectedError(e.into()),
        };
        login_redirect(e, &hmac_secret)
    })?;
    tracing::Span::current().record("admin_id", tracing::field::display(&admin_id));

    session.renew();
    session
        .insert_admin_id(admin_id)
        .map_err(|e| login_redirect(LoginError::UnexpectedError(e.into()), &hmac_secret))?;

    Ok(see_other("/admin/dashboard"))
}

// Back to the form, with an error message the form can trust.
fn login_redirect(e: LoginError, secret: &HmacSecret) -> InternalError<LoginError> {
    let query_string = format!("error={}", urlencoding::Encoded::new(e.to_string()));

    let location = match Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(query_string.as_bytes());
            let tag = hex::encode(mac.finalize().into_bytes());
            format!("/login?{}&tag={}", query_string, tag)
        }
        Err(_) => "/login".to_string(),
    };

    InternalError::from_response(e, see_other(&location))
}

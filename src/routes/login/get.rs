//! src/routes/login/get.rs
use crate::configuration::HmacSecret;
use actix_web::{http::header::ContentType, web, HttpResponse};
use hmac::{Hmac, Mac};

/// `error` is only displayed when `tag` proves the server produced it.
#[derive(serde::Deserialize, Debug)]
pub struct QueryParams {
    error: String,
    tag: Option<String>,
}

impl QueryParams {
    fn verify(&self, secret: &HmacSecret) -> bool {
        let Some(tag) = &self.tag else {
            tracing::warn!("Missing hmac tag in query params");
            return false;
        };

        let Ok(tag) = hex::decode(tag) else {
            tracing::warn!("Invalid hex in hmac tag");
            return false;
        };

        let query_string = format!("error={}", urlencoding::Encoded::new(&self.error));

        let Ok(mut mac) = Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()) else {
            tracing::error!("Invalid hmac secret");
            return false;
        };
        mac.update(query_string.as_bytes());

        if mac.verify_slice(&tag).is_err() {
            tracing::warn!("Invalid hmac tag");
            return false;
        }
        true
    }
}

#[tracing::instrument(name = "GET /login", skip(hmac_secret))]
pub async fn login_form(
    query_params: Option<web::Query<QueryParams>>,
    hmac_secret: web::Data<HmacSecret>,
) -> HttpResponse {
    let error_html = match query_params {
        Some(params) if params.verify(&hmac_secret) => {
            format!("<p><i>{}</i></p>", htmlescape::encode_minimal(&params.error))
        }
        _ => String::new(),
    };

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>Login</title>
</head>
<body>
    {error_html}
    <form action="/login" method="post">
        <label>Email
            <input
                type="email"
                placeholder="Enter email"
                name="email"
            >
        </label>
        <label>Password
            <input
                type="password"
                placeholder="Enter Password"
                name="password"
            >
        </label>
        <button type="submit">Login</button>
    </form>
</body>
</html>"#,
        ))
}

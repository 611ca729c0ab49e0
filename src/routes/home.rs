//! src/routes/home.rs
use actix_web::{http::header::ContentType, HttpResponse};

pub async fn home() -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>Race registration</title>
</head>
<body>
    <p>Registrations are submitted to <code>POST /registrations</code>.</p>
    <p><a href="/login">Organizer login</a></p>
</body>
</html>"#,
    )
}

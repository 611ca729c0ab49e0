//! src/startup.rs
use crate::configuration::{HmacSecret, Settings};
use crate::notification::NotificationBridge;
use crate::payment::MercadoPago;
use crate::routes::{
    admin_dashboard, delete_registrant, health_check, home, list_registrants, log_out, login,
    login_form, notifications, payment_webhook, register, registrants_report,
};
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use secrecy::{ExposeSecret, Secret};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
    bridge: NotificationBridge,
}

impl Application {
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Handle on the bridge the server publishes through.
    pub fn bridge(&self) -> NotificationBridge {
        self.bridge.clone()
    }

    pub async fn run(self) -> std::io::Result<()> {
        self.server.await
    }
}

pub fn get_connection_pool(config: &Settings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy(config.database.connection_string().expose_secret())
}

pub fn build(config: Settings) -> Result<Application, anyhow::Error> {
    let address = format!("{}:{}", config.application.host, config.application.port);
    let tcp_listener =
        TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    let port = tcp_listener.local_addr()?.port();

    let connection = get_connection_pool(&config).context("Failed to configure Postgres pool")?;
    let mercado_pago = MercadoPago::new(config.payment, &config.application.base_url)
        .context("Failed to build the payment provider client")?;
    let bridge = NotificationBridge::new();

    let server = run(
        tcp_listener,
        connection,
        mercado_pago,
        bridge.clone(),
        config.application.hmac_secret,
    )?;

    Ok(Application {
        port,
        server,
        bridge,
    })
}

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    mercado_pago: MercadoPago,
    bridge: NotificationBridge,
    hmac_secret: Secret<String>,
) -> Result<Server, anyhow::Error> {
    let connection = web::Data::new(connection);
    let mercado_pago = web::Data::new(mercado_pago);
    let bridge = web::Data::new(bridge);

    let secret_key = hmac_secret.expose_secret().as_bytes();
    anyhow::ensure!(
        secret_key.len() >= 64,
        "application.hmac_secret must be at least 64 bytes long"
    );
    let secret_key = Key::from(secret_key);
    let hmac_secret = web::Data::new(HmacSecret(hmac_secret.clone()));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                secret_key.clone(),
            ))
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/", web::get().to(home))
            // registration flow
            .route("/registrations", web::post().to(register))
            .route("/webhook", web::post().to(payment_webhook))
            .route("/ws", web::get().to(notifications))
            // admin
            .route("/login", web::get().to(login_form))
            .route("/login", web::post().to(login))
            .route("/logout", web::get().to(log_out))
            .route("/admin/dashboard", web::get().to(admin_dashboard))
            .route("/api/registrants", web::get().to(list_registrants))
            .route("/api/registrants/report", web::get().to(registrants_report))
            .route("/api/registrants/{id}", web::delete().to(delete_registrant))
            .app_data(connection.clone())
            .app_data(mercado_pago.clone())
            .app_data(bridge.clone())
            .app_data(hmac_secret.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

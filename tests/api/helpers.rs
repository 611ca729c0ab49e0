//! tests/api/helpers.rs

use corrida::authenticate::compute_password_hash;
use corrida::configuration::{get_configuration, Settings};
use corrida::domain::RegistrantId;
use corrida::notification::NotificationBridge;
use corrida::startup::build;
use corrida::telemetry::{get_subscriber, init_subscriber};
use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, Secret};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    // Set TEST_LOG=true to see logs during tests
    // Use bunyan to format the logs nicely:
    // $ TEST_LOG=true cargo test | bunyan
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub const VALID_REGISTRATION: &str = r#"{
    "name": "Maria Souza",
    "cpf": "123.456.789-09",
    "city": "Recife",
    "shirt_size": "M",
    "gender": "F",
    "age_group": "30-39",
    "phone": "81999990000"
}"#;

pub struct Test {
    pub address: String,
    pub db_pool: PgPool,
    pub payment_server: MockServer,
    pub admin: Admin,
    pub bridge: NotificationBridge,
    pub api_client: reqwest::Client,
}

impl Test {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_html(&self, path: &str) -> String {
        self.get(path).await.text().await.unwrap()
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.api_client
            .delete(&format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_registration(&self, body: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/registrations", self.address))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_webhook(&self, body: serde_json::Value) -> reqwest::Response {
        self.post_webhook_with_headers(body, &[]).await
    }

    pub async fn post_webhook_with_headers(
        &self,
        body: serde_json::Value,
        headers: &[(&str, &str)],
    ) -> reqwest::Response {
        let mut request = self
            .api_client
            .post(&format!("{}/webhook", self.address))
            .json(&body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub fn ws_url(&self) -> String {
        format!("{}/ws", self.address.replacen("http", "ws", 1))
    }

    /// Waits for the server side of a socket to catch up with the bridge.
    pub async fn wait_for_subscribers(&self, registrant_id: i64, expected: usize) {
        let registrant_id = RegistrantId::from(registrant_id);
        for _ in 0..50 {
            if self.bridge.subscriber_count(registrant_id) == expected {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!(
            "Expected {} subscriber(s) but found {}.",
            expected,
            self.bridge.subscriber_count(registrant_id)
        );
    }

    pub async fn post_login<Body>(&self, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(&format!("{}/login", self.address))
            .form(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login_as_admin(&self) {
        let response = self
            .post_login(&serde_json::json!({
                "email": &self.admin.email,
                "password": &self.admin.password,
            }))
            .await;
        assert_is_redirect_to(&response, "/admin/dashboard");
    }

    /// Registers the valid participant against a mocked provider and returns
    /// the registrant id assigned by the server.
    pub async fn create_pending_registrant(&self, payment_id: i64) -> i64 {
        let _guard = Mock::given(method("POST"))
            .and(path("/v1/payments"))
            .respond_with(ResponseTemplate::new(201).set_body_json(pending_payment(payment_id)))
            .named("Create PIX payment")
            .expect(1)
            .mount_as_scoped(&self.payment_server)
            .await;

        let response = self.post_registration(VALID_REGISTRATION).await;
        assert_eq!(200, response.status().as_u16());

        let body: serde_json::Value = response.json().await.unwrap();
        body["registrant_id"].as_i64().expect("No registrant id")
    }

    pub async fn payment_status(&self, registrant_id: i64) -> Option<String> {
        sqlx::query_scalar("SELECT status FROM payments WHERE registrant_id = $1")
            .bind(registrant_id)
            .fetch_optional(&self.db_pool)
            .await
            .expect("Failed to fetch payment status.")
    }
}

pub fn pending_payment(payment_id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": payment_id,
        "status": "pending",
        "transaction_amount": 0.01,
        "point_of_interaction": {
            "transaction_data": {
                "qr_code": "00020126580014br.gov.bcb.pix",
                "qr_code_base64": "iVBORw0KGgoAAAANSUhEUg=="
            }
        }
    })
}

pub fn provider_payment(payment_id: i64, status: &str, registrant_id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": payment_id,
        "status": status,
        "transaction_amount": 0.01,
        "external_reference": registrant_id.to_string(),
        "payer": { "first_name": "Maria" }
    })
}

pub fn payment_notification(payment_id: i64) -> serde_json::Value {
    serde_json::json!({
        "action": "payment.updated",
        "type": "payment",
        "data": { "id": payment_id.to_string() }
    })
}

pub struct Admin {
    admin_id: Uuid,
    pub email: String,
    pub password: String,
}

impl Admin {
    pub fn generate() -> Self {
        Self {
            admin_id: Uuid::new_v4(),
            email: format!("{}@corrida.com", Uuid::new_v4().simple()),
            password: Uuid::new_v4().to_string(),
        }
    }

    async fn store(&self, pool: &PgPool) {
        let password_hash = compute_password_hash(Secret::new(self.password.clone()))
            .expect("Failed to hash password");

        sqlx::query("INSERT INTO admins (admin_id, email, password_hash) VALUES ($1, $2, $3)")
            .bind(self.admin_id)
            .bind(&self.email)
            .bind(password_hash.expose_secret())
            .execute(pool)
            .await
            .expect("Failed to store test admin.");
    }
}

pub async fn setup() -> Test {
    setup_with(|_| {}).await
}

/// Same as `setup`, with a chance to adjust the configuration first.
pub async fn setup_with(configure: impl FnOnce(&mut Settings)) -> Test {
    Lazy::force(&TRACING);

    let payment_server = MockServer::start().await;

    let mut config = get_configuration().expect("Failed to read configuration.");
    config.application.port = 0;
    config.database.database_name = Uuid::new_v4().to_string();
    config.set_payment_url(payment_server.uri());
    configure(&mut config);

    let db_pool = configure_database(&config.database).await;

    let admin = Admin::generate();
    admin.store(&db_pool).await;

    let app = build(config).expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", app.port());
    let bridge = app.bridge();
    let _ = tokio::spawn(app.run());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .unwrap();

    Test {
        address,
        db_pool,
        payment_server,
        admin,
        bridge,
        api_client,
    }
}

async fn configure_database(config: &corrida::configuration::DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(config.connection_string_without_db().expose_secret())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    // Migrate database
    let db_pool = PgPool::connect(config.connection_string().expose_secret())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to migrate the database");

    db_pool
}

pub fn assert_is_redirect_to(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers().get("Location").unwrap(), location);
}

//! src/configuration.rs
use config::{Config, ConfigError, Environment as EnvSource, File};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub payment: PaymentSettings,
}

impl Settings {
    pub fn set_payment_url(&mut self, api_url: String) {
        self.payment.api_url = api_url;
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
    /// Public URL the payment provider uses to reach `/webhook`.
    pub base_url: String,
    pub hmac_secret: Secret<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PaymentSettings {
    pub access_token: Secret<String>,
    pub api_url: String,
    pub registration_fee: f64,
    #[serde(default)]
    pub webhook_secret: Option<Secret<String>>,
    #[serde(default = "default_timeout_milliseconds")]
    pub timeout_milliseconds: u64,
}

fn default_timeout_milliseconds() -> u64 {
    10_000
}

impl PaymentSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Credentials that may be supplied through `PAYMENT_*` variables instead of
/// the YAML files.
#[derive(Deserialize)]
struct PaymentCredentials {
    access_token: Secret<String>,
    #[serde(default)]
    webhook_secret: Option<Secret<String>>,
}

/// Key shared by the login error tags and the session cookies.
#[derive(Clone, Debug)]
pub struct HmacSecret(pub Secret<String>);

impl HmacSecret {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.expose_secret().as_bytes()
    }
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database_name
        ))
    }

    /// Omitting the database name connects to the Postgres instance, not a specific logical database.
    /// This is useful for operations that create or drop databases.
    pub fn connection_string_without_db(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port
        ))
    }
}

#[derive(PartialEq)]
pub enum Environment {
    Local,
    Production,
}
impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_ref() {
            "local" => Ok(Environment::Local),
            "production" => Ok(Environment::Production),
            _ => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                s
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| ConfigError::Foreign(Box::new(e)))?;
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment.
    // Default to `local` if not specified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;

    let settings = Config::builder()
        .add_source(File::from(configuration_directory.join("base")).required(true))
        .add_source(File::from(configuration_directory.join(environment.as_str())).required(true))
        // E.g. `APP_APPLICATION__PORT=5001` sets `Settings.application.port`
        .add_source(
            EnvSource::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let mut settings: Settings = settings.try_deserialize()?;

    if environment == Environment::Local {
        let payment_file_path = configuration_directory.join("payment.env");
        if dotenvy::from_filename(payment_file_path).is_err() {
            tracing::debug!("No payment.env file, using the payment settings from YAML");
        }
    }

    if let Ok(credentials) = envy::prefixed("PAYMENT_").from_env::<PaymentCredentials>() {
        settings.payment.access_token = credentials.access_token;
        if credentials.webhook_secret.is_some() {
            settings.payment.webhook_secret = credentials.webhook_secret;
        }
    }

    Ok(settings)
}

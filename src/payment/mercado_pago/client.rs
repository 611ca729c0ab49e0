//! src/payment/mercado_pago/client.rs
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct PaymentRequest<'a> {
    pub transaction_amount: f64,
    pub description: &'a str,
    pub payment_method_id: &'a str,
    pub payer: Payer<'a>,
    pub external_reference: &'a str,
    pub notification_url: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Payer<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub identification: Identification<'a>,
}

#[derive(Debug, Serialize)]
pub struct Identification<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub number: &'a str,
}

/// The fields of a provider payment resource this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub status: String,
    #[serde(default)]
    pub transaction_amount: f64,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub payer: Option<PayerDetails>,
    #[serde(default)]
    pub point_of_interaction: Option<PointOfInteraction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayerDetails {
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointOfInteraction {
    #[serde(default)]
    pub transaction_data: Option<TransactionData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionData {
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub qr_code_base64: Option<String>,
}

impl Payment {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }

    pub fn payer_first_name(&self) -> Option<&str> {
        self.payer
            .as_ref()
            .and_then(|payer| payer.first_name.as_deref())
            .filter(|name| !name.trim().is_empty())
    }

    pub fn transaction_data(&self) -> Option<&TransactionData> {
        self.point_of_interaction
            .as_ref()
            .and_then(|poi| poi.transaction_data.as_ref())
    }
}

#[derive(Debug)]
pub struct PaymentClient {
    http_client: Client,
    base_url: String,
    access_token: Secret<String>,
}

impl PaymentClient {
    pub fn new(
        base_url: String,
        access_token: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            base_url,
            access_token,
        })
    }

    pub async fn create_payment(
        &self,
        request: &PaymentRequest<'_>,
    ) -> Result<Payment, reqwest::Error> {
        self.http_client
            .post(format!("{}/v1/payments", self.base_url))
            .bearer_auth(self.access_token.expose_secret())
            .header("X-Idempotency-Key", Uuid::new_v4().to_string())
            .header("accept", "application/json")
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, reqwest::Error> {
        self.http_client
            .get(format!("{}/v1/payments/{}", self.base_url, payment_id))
            .bearer_auth(self.access_token.expose_secret())
            .header("accept", "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

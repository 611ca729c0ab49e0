//! src/payment/mercado_pago/mod.rs
use crate::configuration::PaymentSettings;
use crate::domain::{NewRegistrant, RegistrantId};
use secrecy::Secret;
use uuid::Uuid;

mod client;
pub use client::{Payment, PaymentClient};
use client::{Identification, Payer, PaymentRequest};

pub mod signature;

/// PIX charge created for a registrant, as shown to the browser.
#[derive(Debug, Clone)]
pub struct PixCharge {
    pub payment_id: String,
    pub amount: f64,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
}

#[derive(Debug)]
pub struct MercadoPago {
    client: PaymentClient,
    registration_fee: f64,
    notification_url: String,
    webhook_secret: Option<Secret<String>>,
}

impl MercadoPago {
    pub fn new(settings: PaymentSettings, base_url: &str) -> Result<Self, reqwest::Error> {
        let client = PaymentClient::new(
            settings.api_url.clone(),
            settings.access_token.clone(),
            settings.timeout(),
        )?;

        Ok(Self {
            client,
            registration_fee: settings.registration_fee,
            notification_url: format!("{}/webhook", base_url.trim_end_matches('/')),
            webhook_secret: settings.webhook_secret,
        })
    }

    pub fn webhook_secret(&self) -> Option<&Secret<String>> {
        self.webhook_secret.as_ref()
    }

    #[tracing::instrument(name = "Create PIX charge", skip(self, registrant))]
    pub async fn create_pix_charge(
        &self,
        registrant_id: RegistrantId,
        registrant: &NewRegistrant,
    ) -> Result<PixCharge, reqwest::Error> {
        let description = format!("Registration of {}", registrant.name.as_ref());
        // The provider insists on a payer e-mail; the form does not collect one.
        let payer_email = format!("payer-{}@email.com", Uuid::new_v4().simple());
        let external_reference = registrant_id.to_string();

        let request = PaymentRequest {
            transaction_amount: self.registration_fee,
            description: &description,
            payment_method_id: "pix",
            payer: Payer {
                email: &payer_email,
                first_name: registrant.name.first_name(),
                identification: Identification {
                    kind: "CPF",
                    number: registrant.cpf.as_ref(),
                },
            },
            external_reference: &external_reference,
            notification_url: &self.notification_url,
        };

        let payment = self.client.create_payment(&request).await?;
        let data = payment.transaction_data();

        Ok(PixCharge {
            payment_id: payment.id.to_string(),
            amount: payment.transaction_amount,
            qr_code: data.and_then(|d| d.qr_code.clone()),
            qr_code_base64: data.and_then(|d| d.qr_code_base64.clone()),
        })
    }

    #[tracing::instrument(name = "Fetch payment from provider", skip(self))]
    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, reqwest::Error> {
        self.client.get_payment(payment_id).await
    }
}

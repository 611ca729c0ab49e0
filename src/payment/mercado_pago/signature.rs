//! src/payment/mercado_pago/signature.rs
//!
//! Webhook authenticity check. The provider signs
//! `id:{data.id};request-id:{x-request-id};ts:{ts};` with HMAC-SHA256 and
//! sends `x-signature: ts=<ts>,v1=<hex digest>`.
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};

#[derive(thiserror::Error, Debug)]
pub enum SignatureError {
    #[error("Missing signature header")]
    Missing,
    #[error("Malformed signature header")]
    Malformed,
    #[error("Signature does not match")]
    Mismatch,
}

pub fn verify(
    secret: &Secret<String>,
    signature_header: Option<&str>,
    request_id: Option<&str>,
    data_id: &str,
) -> Result<(), SignatureError> {
    let header = signature_header.ok_or(SignatureError::Missing)?;

    let mut ts = None;
    let mut v1 = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("ts", value)) => ts = Some(value.trim()),
            Some(("v1", value)) => v1 = Some(value.trim()),
            _ => {}
        }
    }
    let (Some(ts), Some(v1)) = (ts, v1) else {
        return Err(SignatureError::Malformed);
    };
    let expected = hex::decode(v1).map_err(|_| SignatureError::Malformed)?;

    let manifest = manifest(data_id, request_id, ts);
    let mut mac = Hmac::<sha2::Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(manifest.as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

// Parts the provider did not send are left out of the signed template.
fn manifest(data_id: &str, request_id: Option<&str>, ts: &str) -> String {
    let mut manifest = String::new();
    if !data_id.is_empty() {
        let data_id = if data_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            data_id.to_lowercase()
        } else {
            data_id.to_string()
        };
        manifest.push_str(&format!("id:{};", data_id));
    }
    if let Some(request_id) = request_id {
        manifest.push_str(&format!("request-id:{};", request_id));
    }
    manifest.push_str(&format!("ts:{};", ts));
    manifest
}

/// Builds the header value the provider would send. Used by tests and local tooling.
pub fn sign(
    secret: &Secret<String>,
    request_id: Option<&str>,
    data_id: &str,
    ts: &str,
) -> Option<String> {
    let mut mac = Hmac::<sha2::Sha256>::new_from_slice(secret.expose_secret().as_bytes()).ok()?;
    mac.update(manifest(data_id, request_id, ts).as_bytes());
    Some(format!("ts={},v1={}", ts, hex::encode(mac.finalize().into_bytes())))
}

//! src/notification/event.rs
use crate::domain::RegistrantId;
use serde::{Deserialize, Serialize};

/// Routing key a browser joins to hear about one registrant's payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel(String);

impl Channel {
    pub fn for_registrant(registrant_id: RegistrantId) -> Self {
        Self(format!("registrant-{}", registrant_id))
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationEvent {
    pub message: String,
    pub display_name: String,
}

impl ConfirmationEvent {
    pub fn payment_confirmed(display_name: impl Into<String>) -> Self {
        Self {
            message: "Payment confirmed successfully!".to_string(),
            display_name: display_name.into(),
        }
    }
}

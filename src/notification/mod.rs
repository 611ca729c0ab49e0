//! src/notification/mod.rs
//!
//! Real-time payment confirmations pushed to registrants' browsers.
mod bridge;
pub use bridge::{Connection, ConnectionId, NotificationBridge};

mod event;
pub use event::{Channel, ConfirmationEvent};

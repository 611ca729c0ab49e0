//! src/domain/mod.rs
mod admin_email;
pub use admin_email::AdminEmail;

pub mod cpf;
pub use cpf::Cpf;

pub mod registrant;
pub use registrant::{Name, NewRegistrant};

mod registrant_id;
pub use registrant_id::RegistrantId;

//! src/payment/mod.rs
pub mod mercado_pago;
pub use mercado_pago::{MercadoPago, Payment, PixCharge};

pub mod authenticate;
pub mod configuration;
pub mod domain;
pub mod notification;
pub mod payment;
pub mod routes;
pub mod session_state;
pub mod startup;
pub mod telemetry;
pub mod utils;

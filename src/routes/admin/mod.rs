//! src/routes/admin/mod.rs
mod dashboard;
pub use dashboard::admin_dashboard;

mod logout;
pub use logout::log_out;

mod registrants;
pub use registrants::{delete_registrant, list_registrants, registrants_report};

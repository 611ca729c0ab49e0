//! src/routes/login/mod.rs
mod get;
pub use get::login_form;

mod post;
pub use post::login;

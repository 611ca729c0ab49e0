//! src/routes/admin/logout.rs
use crate::session_state::TypedSession;
use crate::utils::see_other;
use actix_web::HttpResponse;

pub async fn log_out(session: TypedSession) -> HttpResponse {
    session.log_out();
    see_other("/")
}

//! src/session_state.rs
use actix_session::{Session, SessionExt, SessionGetError, SessionInsertError};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

pub struct TypedSession(Session);

impl TypedSession {
    const ADMIN_ID_KEY: &'static str = "admin_id";

    pub fn renew(&self) {
        self.0.renew();
    }

    pub fn insert_admin_id(&self, admin_id: Uuid) -> Result<(), SessionInsertError> {
        self.0.insert(Self::ADMIN_ID_KEY, admin_id)
    }

    pub fn get_admin_id(&self) -> Result<Option<Uuid>, SessionGetError> {
        self.0.get(Self::ADMIN_ID_KEY)
    }

    pub fn log_out(self) {
        self.0.purge()
    }
}

impl FromRequest for TypedSession {
    type Error = <Session as FromRequest>::Error;
    type Future = Ready<Result<TypedSession, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(TypedSession(req.get_session())))
    }
}

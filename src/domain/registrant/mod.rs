//! src/domain/registrant/mod.rs
mod name;
pub use name::Name;

use crate::domain::cpf::{self, Cpf};
use crate::routes::RegistrationForm;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("All fields are required.")]
    MissingFields,
    #[error(transparent)]
    InvalidCpf(#[from] cpf::Error),
    #[error(transparent)]
    InvalidName(#[from] name::Error),
}

/// A registration that passed validation and may be stored and charged.
#[derive(Debug, Clone)]
pub struct NewRegistrant {
    pub name: Name,
    pub cpf: Cpf,
    pub city: String,
    pub shirt_size: String,
    pub gender: String,
    pub age_group: String,
    pub phone: String,
}

fn required(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl TryFrom<RegistrationForm> for NewRegistrant {
    type Error = Error;

    fn try_from(form: RegistrationForm) -> Result<Self, Self::Error> {
        let (Some(name), Some(cpf), Some(city), Some(shirt_size), Some(gender), Some(age_group), Some(phone)) = (
            required(form.name),
            required(form.cpf),
            required(form.city),
            required(form.shirt_size),
            required(form.gender),
            required(form.age_group),
            required(form.phone),
        ) else {
            return Err(Error::MissingFields);
        };

        Ok(Self {
            name: Name::parse(name)?,
            cpf: Cpf::parse(cpf)?,
            city,
            shirt_size,
            gender,
            age_group,
            phone,
        })
    }
}

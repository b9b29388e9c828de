// Login and registration form checks
// Only presence and password confirmation are checked locally; everything
// else is left to the auth service

use serde::Deserialize;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Please fill in all fields")]
    Missing(Vec<String>),
    #[error("Passwords do not match")]
    PasswordMismatch,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default, alias = "confirmPassword")]
    #[validate(length(min = 1))]
    pub confirm_password: String,
}

impl LoginForm {
    pub fn into_credentials(self) -> Result<Credentials, FormError> {
        check_presence(&self)?;
        Ok(Credentials {
            email: self.email,
            password: self.password,
        })
    }
}

impl RegisterForm {
    pub fn into_credentials(self) -> Result<Credentials, FormError> {
        check_presence(&self)?;
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        Ok(Credentials {
            email: self.email,
            password: self.password,
        })
    }
}

fn check_presence<T: Validate>(form: &T) -> Result<(), FormError> {
    form.validate().map_err(|errors| {
        let mut missing: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        missing.sort();
        FormError::Missing(missing)
    })
}

use thiserror::Error;

use crate::api::ApiError;

/// Why a signup or login failed, displayed as the user-facing message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("This email exists already")]
    EmailExists,

    #[error("This email does not exist.")]
    EmailNotFound,

    #[error("This password is not correct.")]
    InvalidPassword,

    /// Transport failures, malformed bodies and unrecognized codes
    #[error("An unknown error occured!")]
    Unknown,
}

impl AuthError {
    /// Map an identity provider error code to its message
    pub fn from_code(code: &str) -> Self {
        match code {
            "EMAIL_EXISTS" => AuthError::EmailExists,
            "EMAIL_NOT_FOUND" => AuthError::EmailNotFound,
            "INVALID_PASSWORD" => AuthError::InvalidPassword,
            _ => AuthError::Unknown,
        }
    }
}

impl From<&ApiError> for AuthError {
    fn from(err: &ApiError) -> Self {
        err.code().map(Self::from_code).unwrap_or(AuthError::Unknown)
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        Self::from(&err)
    }
}

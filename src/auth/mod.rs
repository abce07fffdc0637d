//! Authentication: PBKDF2 password hashing and HMAC-signed bearer tokens.

mod password;
mod token;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenSigner};

use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::Role;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Malformed token")]
    TokenMalformed,

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// The authenticated caller, extracted from a verified token and stored in
/// request extensions by the auth middleware.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

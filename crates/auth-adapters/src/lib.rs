//! # auth-adapters
//!
//! Turns transport credentials into a [`Caller`]. Session issuing belongs to
//! the host application; this crate only verifies what it hands out.

use domains::Caller;
use thiserror::Error;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtAuthenticator};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header must use the Bearer scheme")]
    MalformedHeader,

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Identity contract used by the transport layer.
pub trait Authenticator: Send + Sync {
    /// Verifies a bearer token.
    fn verify(&self, token: &str) -> Result<Caller, AuthError>;

    /// Resolves the raw `Authorization` header value. No header means an
    /// anonymous caller; a present but unusable header is an error.
    fn authenticate(&self, header: Option<&str>) -> Result<Caller, AuthError> {
        let Some(header) = header else {
            return Ok(Caller::Anonymous);
        };
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MalformedHeader)?;
        self.verify(token)
    }
}

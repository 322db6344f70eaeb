//! Error taxonomy of the auth core.

use thiserror::Error;

use crate::{CacheError, StoreError};

pub type AuthResult<T> = Result<T, AuthError>;

/// Every way an auth operation can fail.
///
/// Display strings are for server-side logs. Callers facing clients should
/// map through [`AuthError::kind`] and use generic messages so that a caller
/// cannot learn which check rejected them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("malformed or unverifiable token")]
    MalformedToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token revoked or unknown to the session cache")]
    RevokedToken,

    #[error("role not found")]
    RoleNotFound,

    #[error("role not permitted for this route")]
    InsufficientRole,

    #[error("missing required capability")]
    InsufficientCapability,

    #[error("backing store unavailable: {0}")]
    StoreUnavailable(String),

    /// Signing or serialization failure; never caused by client input.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse outcome class used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// 401
    Unauthenticated,
    /// 403
    Forbidden,
    /// 500
    Internal,
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::MalformedToken
            | AuthError::ExpiredToken
            | AuthError::RevokedToken => AuthErrorKind::Unauthenticated,
            AuthError::RoleNotFound
            | AuthError::InsufficientRole
            | AuthError::InsufficientCapability => AuthErrorKind::Forbidden,
            AuthError::StoreUnavailable(_) | AuthError::Internal(_) => AuthErrorKind::Internal,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        AuthError::StoreUnavailable(value.to_string())
    }
}

impl From<CacheError> for AuthError {
    fn from(value: CacheError) -> Self {
        AuthError::StoreUnavailable(value.to_string())
    }
}

//! Signed compact token encoding (JWS, HMAC family).
//!
//! Tokens are standard `header.payload.signature` JWTs. Signing always uses
//! HS256; verification accepts only the HMAC family so that a token can never
//! talk the verifier into a different key type (`none`, RS*, ES*, ...).
//!
//! Expiry is not checked here. The session manager owns expiry policy.

use std::collections::HashSet;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::debug;

use crate::{AuthError, AuthResult, SessionClaims};

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("signing secret must not be empty")]
pub struct EmptySecret;

/// Process-wide symmetric signing secret.
///
/// Loaded once at startup and passed explicitly to whoever needs it.
#[derive(Clone)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, EmptySecret> {
        let bytes: Vec<u8> = secret.into();
        if bytes.is_empty() {
            return Err(EmptySecret);
        }
        Ok(Self(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Encodes [`SessionClaims`] into signed tokens and back.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign `claims`. Fails only if the claims cannot be serialized.
    pub fn sign(&self, claims: &SessionClaims) -> AuthResult<String> {
        jsonwebtoken::encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("token signing failed: {e}")))
    }

    /// Verify structure, algorithm and signature, then decode the claims.
    ///
    /// Every failure collapses into [`AuthError::MalformedToken`]; the reason
    /// is only visible in debug logs.
    pub fn verify(&self, token: &str) -> AuthResult<SessionClaims> {
        match jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => {
                debug!(reason = ?e.kind(), "token verification failed");
                Err(AuthError::MalformedToken)
            }
        }
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &SIGNING_ALGORITHM)
            .finish_non_exhaustive()
    }
}

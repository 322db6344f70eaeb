//! Session lifecycle: issue, validate, revoke.
//!
//! A session is a signed token plus a liveness marker in the session cache,
//! keyed by the full token string. The signature proves authenticity; the
//! marker proves the session has not been revoked. Validation succeeds only
//! when both agree and the token has not expired.
//!
//! Ordering guarantees on issuance:
//! - nothing is signed if the role lookup failed
//! - nothing is cached if signing failed
//! - no token is returned if the cache write failed

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::{debug, error, info, instrument, warn};

use gotham_core::SessionId;

use crate::{
    AuthError, AuthResult, CredentialVerifier, LIVENESS_MARKER, Principal, PrincipalStore,
    SessionCache, SessionClaims, TokenCodec,
};

/// Default session lifetime, in seconds.
pub const DEFAULT_SESSION_LIFETIME_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long an issued token stays valid (and its cache marker lives).
    pub lifetime: Duration,
}

impl SessionConfig {
    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self { lifetime }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::seconds(DEFAULT_SESSION_LIFETIME_SECS),
        }
    }
}

pub struct SessionManager {
    codec: TokenCodec,
    cache: Arc<dyn SessionCache>,
    principals: Arc<dyn PrincipalStore>,
    credentials: Arc<dyn CredentialVerifier>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        codec: TokenCodec,
        cache: Arc<dyn SessionCache>,
        principals: Arc<dyn PrincipalStore>,
        credentials: Arc<dyn CredentialVerifier>,
        config: SessionConfig,
    ) -> Self {
        Self {
            codec,
            cache,
            principals,
            credentials,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Authenticate by email and password, then issue a session.
    ///
    /// Unknown email and wrong password produce the same error.
    #[instrument(skip(self, password, now))]
    pub async fn login(&self, email: &str, password: &str, now: DateTime<Utc>) -> AuthResult<String> {
        let Some(principal) = self.principals.find_principal_by_email(email).await? else {
            self.credentials.verify_decoy(password).await;
            debug!("login rejected: unknown principal");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.credentials.verify(password, &principal.credential_hash).await {
            debug!(user_id = %principal.id, "login rejected: credential mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.issue(&principal, now).await
    }

    /// Issue a token for `principal` and record it as live.
    #[instrument(skip(self, principal, now), fields(user_id = %principal.id, role_id = %principal.role_id))]
    pub async fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> AuthResult<String> {
        if self.config.lifetime <= Duration::zero() {
            return Err(AuthError::internal("session lifetime must be positive"));
        }

        let role = self
            .principals
            .find_role_by_id(principal.role_id)
            .await?
            .ok_or(AuthError::RoleNotFound)?;

        // Claims carry whole seconds; truncate so the returned claims and the
        // decoded ones agree.
        let issued_at = now.trunc_subsecs(0);
        let expires_at = issued_at
            .checked_add_signed(self.config.lifetime)
            .ok_or_else(|| AuthError::internal("session lifetime overflows the clock"))?;
        let claims = SessionClaims {
            email: principal.email.clone(),
            role_id: role.id,
            permissions: role.permission_snapshot(),
            issued_at,
            expires_at,
            session_id: SessionId::new(),
        };

        let token = self.codec.sign(&claims)?;

        let ttl = claims
            .remaining_lifetime(now)
            .and_then(|d| d.to_std().ok())
            .ok_or_else(|| AuthError::internal("session expired before it was recorded"))?;

        if let Err(e) = self.cache.set(&token, LIVENESS_MARKER, ttl).await {
            error!(error = %e, "failed to record session; issuance aborted");
            return Err(e.into());
        }

        info!(
            session_id = %claims.session_id,
            expires_at = %claims.expires_at,
            "session issued"
        );
        Ok(token)
    }

    /// Check signature, expiry and liveness, in that order.
    ///
    /// Expired tokens are rejected without touching the cache.
    pub async fn validate(&self, token: &str, now: DateTime<Utc>) -> AuthResult<SessionClaims> {
        let claims = self.codec.verify(token)?;

        if claims.is_expired_at(now) {
            debug!(session_id = %claims.session_id, "token expired");
            return Err(AuthError::ExpiredToken);
        }

        match self.cache.get(token).await {
            Ok(Some(value)) if value == LIVENESS_MARKER => Ok(claims),
            Ok(_) => {
                debug!(session_id = %claims.session_id, "token has no liveness marker");
                Err(AuthError::RevokedToken)
            }
            Err(e) => {
                error!(error = %e, session_id = %claims.session_id, "session cache read failed");
                Err(e.into())
            }
        }
    }

    /// Remove the token's liveness marker. Idempotent.
    pub async fn revoke(&self, token: &str) -> AuthResult<()> {
        if let Err(e) = self.cache.delete(token).await {
            error!(error = %e, "session cache delete failed");
            return Err(e.into());
        }

        match self.codec.verify(token) {
            Ok(claims) => info!(session_id = %claims.session_id, "session revoked"),
            Err(_) => debug!("revoked an unverifiable token"),
        }
        Ok(())
    }

    /// Exchange a live token for a fresh one.
    ///
    /// The new token carries a fresh permission snapshot. The presented token
    /// is revoked once the new one is recorded, so it cannot be replayed.
    #[instrument(skip_all)]
    pub async fn refresh(&self, token: &str, now: DateTime<Utc>) -> AuthResult<String> {
        let claims = self.validate(token, now).await?;

        let Some(principal) = self.principals.find_principal_by_email(&claims.email).await? else {
            warn!(session_id = %claims.session_id, "refresh for a principal that no longer exists");
            return Err(AuthError::InvalidCredentials);
        };

        let fresh = self.issue(&principal, now).await?;
        self.revoke(token).await?;
        Ok(fresh)
    }
}

impl core::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

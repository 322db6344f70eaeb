//! `gotham-auth`: session tokens and request authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage. It owns the
//! token codec, the session manager (issue / validate / revoke) and the
//! authorization resolver, and talks to the outside world only through the
//! [`PrincipalStore`], [`SessionCache`] and [`CredentialVerifier`] traits.
//!
//! A token is usable only while two independent sources agree: its signature
//! verifies against the process signing secret, and the session cache still
//! holds its liveness marker.

pub mod authorize;
pub mod cache;
pub mod capability;
pub mod claims;
pub mod codec;
pub mod credentials;
pub mod error;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use authorize::{
    AuthContext, AuthorizationResolver, MethodPolicy, PolicyStage, PrivilegedRoles,
    RequestMethod, RoutePolicy,
};
pub use cache::{CacheError, LIVENESS_MARKER, SessionCache};
pub use capability::{Capability, capabilities_satisfy};
pub use claims::SessionClaims;
pub use codec::{EmptySecret, SigningSecret, TokenCodec};
pub use credentials::CredentialVerifier;
pub use error::{AuthError, AuthErrorKind, AuthResult};
pub use permissions::Permission;
pub use principal::{NewPrincipal, Principal, PrincipalUpdate};
pub use roles::{Role, RoleName};
pub use session::{SessionConfig, SessionManager};
pub use store::{PrincipalDirectory, PrincipalPage, PrincipalStore, StoreError};

pub use gotham_core::{RoleId, SessionId, UserId};

//! Per-request authorization.
//!
//! A protected request passes through a fixed pipeline:
//!
//! 1. authenticate the bearer token (signature, expiry, liveness)
//! 2. check that the principal named in the token still exists
//! 3. resolve the role named in the token, always fresh from the store
//! 4. role allow-list (optional)
//! 5. method-sensitive policy (optional)
//! 6. capability requirements (optional)
//!
//! Each stage is a terminal rejection. Stages 4 to 6 are declared per route
//! through a [`RoutePolicy`] and are pure functions of the resolved role and
//! the request method.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use gotham_core::RoleId;

use crate::{
    AuthError, AuthResult, Capability, PrincipalStore, Role, RoleName, SessionClaims,
    SessionManager, capabilities_satisfy,
};

/// HTTP method as seen by the method-sensitive stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl RequestMethod {
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<&str> for RequestMethod {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// A set of privileged roles, by id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivilegedRoles {
    Ids(BTreeSet<RoleId>),
    Names(BTreeSet<RoleName>),
}

impl PrivilegedRoles {
    pub fn ids(ids: impl IntoIterator<Item = u64>) -> Self {
        Self::Ids(ids.into_iter().map(RoleId::new).collect())
    }

    pub fn names(names: impl IntoIterator<Item = &'static str>) -> Self {
        Self::Names(names.into_iter().map(RoleName::new).collect())
    }

    pub fn contains(&self, role: &Role) -> bool {
        match self {
            Self::Ids(ids) => ids.contains(&role.id),
            Self::Names(names) => names.contains(&role.name),
        }
    }
}

/// Which roles may issue destructive methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPolicy {
    pub delete: PrivilegedRoles,
    pub put_patch: PrivilegedRoles,
}

impl MethodPolicy {
    /// DELETE restricted to role 1, PUT/PATCH to roles 1 and 2.
    pub fn legacy_role_ids() -> Self {
        Self {
            delete: PrivilegedRoles::ids([1]),
            put_patch: PrivilegedRoles::ids([1, 2]),
        }
    }

    pub fn by_role_names(
        delete: impl IntoIterator<Item = &'static str>,
        put_patch: impl IntoIterator<Item = &'static str>,
    ) -> Self {
        Self {
            delete: PrivilegedRoles::names(delete),
            put_patch: PrivilegedRoles::names(put_patch),
        }
    }

    /// Methods other than DELETE, PUT and PATCH always pass.
    pub fn admits(&self, role: &Role, method: &RequestMethod) -> bool {
        match method {
            RequestMethod::Delete => self.delete.contains(role),
            RequestMethod::Put | RequestMethod::Patch => self.put_patch.contains(role),
            _ => true,
        }
    }
}

/// Authorization requirements declared by a route.
///
/// An empty policy only requires a live session with a resolvable role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePolicy {
    pub role_allow_list: Option<BTreeSet<RoleName>>,
    pub method_policy: Option<MethodPolicy>,
    pub required_capabilities: Option<Vec<Capability>>,
}

impl RoutePolicy {
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn allow_roles(mut self, names: impl IntoIterator<Item = &'static str>) -> Self {
        self.role_allow_list = Some(names.into_iter().map(RoleName::new).collect());
        self
    }

    pub fn method_sensitive(mut self, policy: MethodPolicy) -> Self {
        self.method_policy = Some(policy);
        self
    }

    pub fn require_capabilities(mut self, caps: impl IntoIterator<Item = Capability>) -> Self {
        self.required_capabilities = Some(caps.into_iter().collect());
        self
    }

    /// Declared stages in evaluation order.
    pub fn stages(&self) -> impl Iterator<Item = PolicyStage<'_>> {
        let allow = self.role_allow_list.as_ref().map(PolicyStage::RoleAllowList);
        let method = self.method_policy.as_ref().map(PolicyStage::Method);
        let caps = self
            .required_capabilities
            .as_deref()
            .map(PolicyStage::Capabilities);
        allow.into_iter().chain(method).chain(caps)
    }

    /// Run every declared stage against an already resolved role.
    pub fn evaluate(&self, role: &Role, method: &RequestMethod) -> AuthResult<()> {
        for stage in self.stages() {
            if let Err(e) = stage.check(role, method) {
                debug!(stage = stage.name(), role = %role.name, "authorization stage rejected");
                return Err(e);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PolicyStage<'a> {
    RoleAllowList(&'a BTreeSet<RoleName>),
    Method(&'a MethodPolicy),
    Capabilities(&'a [Capability]),
}

impl PolicyStage<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoleAllowList(_) => "role_allow_list",
            Self::Method(_) => "method",
            Self::Capabilities(_) => "capabilities",
        }
    }

    pub fn check(&self, role: &Role, method: &RequestMethod) -> AuthResult<()> {
        let admitted = match self {
            Self::RoleAllowList(names) => names.contains(&role.name),
            Self::Method(policy) => policy.admits(role, method),
            Self::Capabilities(required) => capabilities_satisfy(&role.capabilities, required),
        };

        match (admitted, self) {
            (true, _) => Ok(()),
            (false, Self::Capabilities(_)) => Err(AuthError::InsufficientCapability),
            (false, _) => Err(AuthError::InsufficientRole),
        }
    }
}

/// Result of a successful authorization, attached to the request.
#[derive(Clone, PartialEq)]
pub struct AuthContext {
    pub claims: SessionClaims,
    /// Role as resolved for this request, not as snapshotted in the token.
    pub role: Role,
    /// The presented bearer token.
    pub token: String,
}

impl core::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthContext")
            .field("claims", &self.claims)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

pub struct AuthorizationResolver {
    sessions: Arc<SessionManager>,
    principals: Arc<dyn PrincipalStore>,
}

impl AuthorizationResolver {
    pub fn new(sessions: Arc<SessionManager>, principals: Arc<dyn PrincipalStore>) -> Self {
        Self {
            sessions,
            principals,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub async fn authorize(
        &self,
        token: &str,
        method: &RequestMethod,
        policy: &RoutePolicy,
        now: DateTime<Utc>,
    ) -> AuthResult<AuthContext> {
        let claims = self.sessions.validate(token, now).await?;

        // Deleting a principal ends their sessions.
        if self
            .principals
            .find_principal_by_email(&claims.email)
            .await?
            .is_none()
        {
            debug!(session_id = %claims.session_id, "token names a principal that no longer exists");
            return Err(AuthError::RevokedToken);
        }

        let role = self
            .principals
            .find_role_by_id(claims.role_id)
            .await?
            .ok_or_else(|| {
                debug!(role_id = %claims.role_id, "token names a role that no longer exists");
                AuthError::RoleNotFound
            })?;

        policy.evaluate(&role, method)?;

        Ok(AuthContext {
            claims,
            role,
            token: token.to_string(),
        })
    }
}

impl core::fmt::Debug for AuthorizationResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthorizationResolver")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::capability::{DELETE_USER, MANAGE_ROLES, READ_USER, UPDATE_USER, VIEW_TASKS};
    use crate::testing::{Harness, admin_role, agent_role, harness, t0, user_role};
    use crate::SessionConfig;

    fn resolver(h: &Harness) -> AuthorizationResolver {
        AuthorizationResolver::new(h.sessions.clone(), h.store.clone())
    }

    async fn login(h: &Harness, email: &str, password: &str) -> String {
        h.sessions.login(email, password, t0()).await.unwrap()
    }

    #[test]
    fn request_method_parsing_is_case_insensitive() {
        assert_eq!(RequestMethod::from("delete"), RequestMethod::Delete);
        assert_eq!(RequestMethod::from("Patch"), RequestMethod::Patch);
        assert_eq!(RequestMethod::from("PUT"), RequestMethod::Put);
        assert_eq!(RequestMethod::from("trace"), RequestMethod::Other("TRACE".to_string()));
    }

    #[test]
    fn legacy_method_policy() {
        let policy = MethodPolicy::legacy_role_ids();
        let (admin, agent, user) = (admin_role(), agent_role(), user_role());

        assert!(policy.admits(&admin, &RequestMethod::Delete));
        assert!(!policy.admits(&agent, &RequestMethod::Delete));
        assert!(!policy.admits(&user, &RequestMethod::Delete));

        assert!(policy.admits(&admin, &RequestMethod::Put));
        assert!(policy.admits(&agent, &RequestMethod::Patch));
        assert!(!policy.admits(&user, &RequestMethod::Put));

        for method in [RequestMethod::Get, RequestMethod::Post, RequestMethod::Options] {
            assert!(policy.admits(&user, &method));
        }
    }

    #[test]
    fn method_policy_by_role_names() {
        let policy = MethodPolicy::by_role_names(["agent"], ["agent", "user"]);

        assert!(!policy.admits(&admin_role(), &RequestMethod::Delete));
        assert!(policy.admits(&agent_role(), &RequestMethod::Delete));
        assert!(policy.admits(&user_role(), &RequestMethod::Patch));
    }

    #[test]
    fn stages_run_in_declared_order() {
        let policy = RoutePolicy::authenticated()
            .require_capabilities([VIEW_TASKS])
            .method_sensitive(MethodPolicy::legacy_role_ids())
            .allow_roles(["admin"]);

        let names: Vec<_> = policy.stages().map(|s| s.name()).collect();
        assert_eq!(names, ["role_allow_list", "method", "capabilities"]);
        assert_eq!(RoutePolicy::authenticated().stages().count(), 0);
    }

    #[test]
    fn first_failing_stage_decides_the_error() {
        // user fails both the method stage and the capability stage.
        let policy = RoutePolicy::authenticated()
            .method_sensitive(MethodPolicy::legacy_role_ids())
            .require_capabilities([DELETE_USER]);

        assert_eq!(
            policy.evaluate(&user_role(), &RequestMethod::Delete),
            Err(AuthError::InsufficientRole)
        );
        assert_eq!(
            policy.evaluate(&user_role(), &RequestMethod::Get),
            Err(AuthError::InsufficientCapability)
        );
    }

    #[tokio::test]
    async fn admin_wildcard_is_admitted_to_delete() {
        let h = harness(SessionConfig::default());
        let token = login(&h, "admin@example.com", "admin123").await;
        let policy = RoutePolicy::authenticated()
            .method_sensitive(MethodPolicy::legacy_role_ids())
            .require_capabilities([DELETE_USER]);

        let ctx = resolver(&h)
            .authorize(&token, &RequestMethod::Delete, &policy, t0())
            .await
            .unwrap();
        assert_eq!(ctx.role.id, RoleId::new(1));
        assert_eq!(ctx.token, token);
    }

    #[tokio::test]
    async fn agent_lacking_capability_is_forbidden() {
        let h = harness(SessionConfig::default());
        let token = login(&h, "agent@example.com", "agent123").await;
        let policy = RoutePolicy::authenticated().require_capabilities([DELETE_USER]);

        let err = resolver(&h)
            .authorize(&token, &RequestMethod::Delete, &policy, t0())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InsufficientCapability);
    }

    #[tokio::test]
    async fn agent_with_all_capabilities_is_admitted() {
        let h = harness(SessionConfig::default());
        let token = login(&h, "agent@example.com", "agent123").await;
        let policy = RoutePolicy::authenticated().require_capabilities([READ_USER, VIEW_TASKS]);

        assert!(resolver(&h)
            .authorize(&token, &RequestMethod::Get, &policy, t0())
            .await
            .is_ok());

        let wider = RoutePolicy::authenticated().require_capabilities([VIEW_TASKS, MANAGE_ROLES]);
        assert_eq!(
            resolver(&h)
                .authorize(&token, &RequestMethod::Get, &wider, t0())
                .await
                .unwrap_err(),
            AuthError::InsufficientCapability
        );
    }

    #[tokio::test]
    async fn role_allow_list_is_checked_against_fresh_role_name() {
        let h = harness(SessionConfig::default());
        let token = login(&h, "agent@example.com", "agent123").await;
        let policy = RoutePolicy::authenticated().allow_roles(["admin", "agent"]);
        let resolver = resolver(&h);

        assert!(resolver.authorize(&token, &RequestMethod::Get, &policy, t0()).await.is_ok());

        h.store.put_role(Role::new(RoleId::new(2), "support").with_capabilities([UPDATE_USER]));
        assert_eq!(
            resolver
                .authorize(&token, &RequestMethod::Get, &policy, t0())
                .await
                .unwrap_err(),
            AuthError::InsufficientRole
        );
    }

    #[tokio::test]
    async fn capabilities_are_resolved_per_request() {
        let h = harness(SessionConfig::default());
        let token = login(&h, "user@example.com", "user123").await;
        let policy = RoutePolicy::authenticated().require_capabilities([UPDATE_USER]);
        let resolver = resolver(&h);

        assert_eq!(
            resolver.authorize(&token, &RequestMethod::Get, &policy, t0()).await,
            Err(AuthError::InsufficientCapability)
        );

        h.store.put_role(user_role().with_capabilities([UPDATE_USER]));
        assert!(resolver.authorize(&token, &RequestMethod::Get, &policy, t0()).await.is_ok());
    }

    #[tokio::test]
    async fn deleted_role_is_forbidden() {
        let h = harness(SessionConfig::default());
        let token = login(&h, "user@example.com", "user123").await;
        h.store.remove_role(RoleId::new(3));

        let err = resolver(&h)
            .authorize(&token, &RequestMethod::Get, &RoutePolicy::authenticated(), t0())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::RoleNotFound);
    }

    #[tokio::test]
    async fn role_store_failure_is_store_unavailable() {
        let h = harness(SessionConfig::default());
        let token = login(&h, "user@example.com", "user123").await;
        h.store.set_failing(true);

        let err = resolver(&h)
            .authorize(&token, &RequestMethod::Get, &RoutePolicy::authenticated(), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn revoked_token_is_unauthenticated() {
        let h = harness(SessionConfig::default());
        let token = login(&h, "admin@example.com", "admin123").await;
        h.sessions.revoke(&token).await.unwrap();

        let err = resolver(&h)
            .authorize(&token, &RequestMethod::Get, &RoutePolicy::authenticated(), t0())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::RevokedToken);
    }

    #[tokio::test]
    async fn expired_token_is_rejected_before_role_resolution() {
        let h = harness(SessionConfig::with_lifetime(Duration::seconds(1)));
        let token = login(&h, "admin@example.com", "admin123").await;
        h.store.set_failing(true);

        let err = resolver(&h)
            .authorize(
                &token,
                &RequestMethod::Get,
                &RoutePolicy::authenticated(),
                t0() + Duration::seconds(2),
            )
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::ExpiredToken);
        assert_eq!(h.cache.gets(), 0);
    }

    #[tokio::test]
    async fn sessions_of_a_removed_principal_stop_authorizing() {
        let h = harness(SessionConfig::default());
        let token = login(&h, "agent@example.com", "agent123").await;
        h.store.remove_principal("agent@example.com");

        let err = resolver(&h)
            .authorize(&token, &RequestMethod::Get, &RoutePolicy::authenticated(), t0())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::RevokedToken);
        assert_eq!(err.kind(), crate::AuthErrorKind::Unauthenticated);
    }
}

//! Default roles and the bootstrap administrator.

use thiserror::Error;
use tracing::info;

use gotham_auth::capability::{READ_USER, VIEW_TASKS, WILDCARD};
use gotham_auth::{Permission, Principal, Role, RoleId, StoreError, UserId};

use crate::{BcryptCredentials, HashError, InMemoryPrincipalStore};

pub const ADMIN_ROLE_ID: RoleId = RoleId::new(1);
pub const AGENT_ROLE_ID: RoleId = RoleId::new(2);
pub const USER_ROLE_ID: RoleId = RoleId::new(3);

pub const ADMIN_EMAIL: &str = "admin@example.com";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hash(#[from] HashError),
}

pub fn default_roles() -> [Role; 3] {
    [
        Role::new(ADMIN_ROLE_ID, "admin")
            .with_permissions(
                ["view_tasks", "edit_tasks", "delete_tasks"].map(Permission::new),
            )
            .with_capabilities([WILDCARD]),
        Role::new(AGENT_ROLE_ID, "agent").with_capabilities([READ_USER, VIEW_TASKS]),
        Role::new(USER_ROLE_ID, "user").with_capabilities([VIEW_TASKS]),
    ]
}

/// Populate `store` with the default roles and an administrator whose
/// password is `admin_password`. Re-seeding replaces existing entries.
pub async fn seed_defaults(
    store: &InMemoryPrincipalStore,
    credentials: &BcryptCredentials,
    admin_password: &str,
) -> Result<(), SeedError> {
    for role in default_roles() {
        store.upsert_role(role)?;
    }

    let admin = Principal {
        id: UserId::new(1),
        email: ADMIN_EMAIL.to_string(),
        display_name: "Admin".to_string(),
        credential_hash: credentials.hash_async(admin_password).await?,
        role_id: ADMIN_ROLE_ID,
    };
    store.upsert_principal(admin)?;

    info!(
        roles = store.role_count(),
        principals = store.principal_count(),
        "seeded default roles and administrator"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use gotham_auth::{CredentialVerifier, PrincipalStore, capabilities_satisfy};
    use gotham_auth::capability::DELETE_USER;

    use super::*;

    #[tokio::test]
    async fn seeded_store_authenticates_admin() {
        let store = InMemoryPrincipalStore::new();
        let creds = BcryptCredentials::new(4);
        seed_defaults(&store, &creds, "admin123").await.unwrap();

        let admin = store.find_principal_by_email(ADMIN_EMAIL).await.unwrap().unwrap();
        assert_eq!(admin.role_id, ADMIN_ROLE_ID);
        assert!(creds.verify("admin123", &admin.credential_hash).await);

        let role = store.find_role_by_id(ADMIN_ROLE_ID).await.unwrap().unwrap();
        assert!(role.has_unrestricted_access());
        assert_eq!(
            role.permission_snapshot(),
            ["delete_tasks", "edit_tasks", "view_tasks"].map(Permission::new).to_vec()
        );
    }

    #[tokio::test]
    async fn agent_and_user_roles_have_limited_capabilities() {
        let store = InMemoryPrincipalStore::new();
        seed_defaults(&store, &BcryptCredentials::new(4), "pw").await.unwrap();

        let agent = store.find_role_by_id(AGENT_ROLE_ID).await.unwrap().unwrap();
        let user = store.find_role_by_id(USER_ROLE_ID).await.unwrap().unwrap();

        assert!(capabilities_satisfy(&agent.capabilities, &[READ_USER, VIEW_TASKS]));
        assert!(!capabilities_satisfy(&agent.capabilities, &[DELETE_USER]));
        assert!(capabilities_satisfy(&user.capabilities, &[VIEW_TASKS]));
        assert!(!capabilities_satisfy(&user.capabilities, &[READ_USER]));
    }

    #[tokio::test]
    async fn reseeding_is_idempotent() {
        let store = InMemoryPrincipalStore::new();
        let creds = BcryptCredentials::new(4);
        seed_defaults(&store, &creds, "first").await.unwrap();
        seed_defaults(&store, &creds, "second").await.unwrap();

        assert_eq!(store.role_count(), 3);
        assert_eq!(store.principal_count(), 1);
        let admin = store.find_principal_by_email(ADMIN_EMAIL).await.unwrap().unwrap();
        assert!(creds.verify("second", &admin.credential_hash).await);
    }
}

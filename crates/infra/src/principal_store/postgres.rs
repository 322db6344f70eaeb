//! Postgres-backed principal store (optional).
//!
//! Reads the `users`, `roles`, `permissions` and `role_permissions` tables:
//!
//! ```sql
//! CREATE TABLE roles (
//!     id           BIGSERIAL PRIMARY KEY,
//!     name         TEXT NOT NULL UNIQUE,
//!     capabilities TEXT[] NOT NULL DEFAULT '{}'
//! );
//! CREATE TABLE permissions (
//!     id   BIGSERIAL PRIMARY KEY,
//!     name TEXT NOT NULL UNIQUE
//! );
//! CREATE TABLE role_permissions (
//!     role_id       BIGINT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
//!     permission_id BIGINT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
//!     PRIMARY KEY (role_id, permission_id)
//! );
//! CREATE TABLE users (
//!     id       BIGSERIAL PRIMARY KEY,
//!     name     TEXT NOT NULL,
//!     email    TEXT NOT NULL UNIQUE,
//!     password TEXT NOT NULL,
//!     role_id  BIGINT NOT NULL REFERENCES roles(id)
//! );
//! ```
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `Conflict` |
//! | anything else | | `Backend` |

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use gotham_auth::{
    Capability, NewPrincipal, Permission, Principal, PrincipalDirectory, PrincipalPage,
    PrincipalStore, PrincipalUpdate, Role, RoleId, StoreError, UserId,
};

#[derive(Debug, Clone)]
pub struct PostgresPrincipalStore {
    pool: PgPool,
}

impl PostgresPrincipalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a small pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23503") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// `None` for ids no `BIGSERIAL` column can hold; such rows cannot exist.
fn to_db_id(id: u64) -> Option<i64> {
    i64::try_from(id).ok()
}

/// Clamp a paging bound into `BIGINT`.
fn to_db_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn from_db_id(id: i64) -> Result<u64, StoreError> {
    u64::try_from(id).map_err(|_| StoreError::Backend(format!("negative id in database: {id}")))
}

fn principal_from_row(row: &PgRow) -> Result<Principal, StoreError> {
    let get = |e: sqlx::Error| map_sqlx_error("decode users row", e);
    Ok(Principal {
        id: UserId::new(from_db_id(row.try_get("id").map_err(get)?)?),
        display_name: row.try_get("name").map_err(get)?,
        email: row.try_get("email").map_err(get)?,
        credential_hash: row.try_get("password").map_err(get)?,
        role_id: RoleId::new(from_db_id(row.try_get("role_id").map_err(get)?)?),
    })
}

#[async_trait]
impl PrincipalStore for PostgresPrincipalStore {
    #[instrument(skip(self), fields(role_id = %id))]
    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        let Some(db_id) = to_db_id(id.get()) else {
            return Ok(None);
        };

        let Some(row) = sqlx::query("SELECT id, name, capabilities FROM roles WHERE id = $1")
            .bind(db_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_role_by_id", e))?
        else {
            return Ok(None);
        };

        let get = |e: sqlx::Error| map_sqlx_error("decode roles row", e);
        let name: String = row.try_get("name").map_err(get)?;
        let capabilities: Vec<String> = row.try_get("capabilities").map_err(get)?;

        let permissions: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT p.name
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            "#,
        )
        .bind(db_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_role_permissions", e))?;

        Ok(Some(
            Role::new(id, name)
                .with_permissions(permissions.into_iter().map(Permission::new))
                .with_capabilities(capabilities.into_iter().map(Capability::new)),
        ))
    }

    #[instrument(skip(self, email))]
    async fn find_principal_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        let row = sqlx::query("SELECT id, name, email, password, role_id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_principal_by_email", e))?;

        row.as_ref().map(principal_from_row).transpose()
    }
}

#[async_trait]
impl PrincipalDirectory for PostgresPrincipalStore {
    #[instrument(skip(self, new), fields(role_id = %new.role_id))]
    async fn create_principal(&self, new: NewPrincipal) -> Result<Principal, StoreError> {
        let role_id = to_db_id(new.role_id.get())
            .ok_or_else(|| StoreError::Conflict(format!("unknown role: {}", new.role_id)))?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, password, role_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password, role_id
            "#,
        )
        .bind(new.display_name)
        .bind(new.email)
        .bind(new.credential_hash)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_principal", e))?;

        principal_from_row(&row)
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn find_principal_by_id(&self, id: UserId) -> Result<Option<Principal>, StoreError> {
        let Some(db_id) = to_db_id(id.get()) else {
            return Ok(None);
        };

        let row = sqlx::query("SELECT id, name, email, password, role_id FROM users WHERE id = $1")
            .bind(db_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_principal_by_id", e))?;

        row.as_ref().map(principal_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list_principals(&self, offset: u64, limit: u64) -> Result<PrincipalPage, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_principals", e))?;

        let rows = sqlx::query(
            r#"
            SELECT id, name, email, password, role_id
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(to_db_count(limit))
        .bind(to_db_count(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_principals", e))?;

        Ok(PrincipalPage {
            principals: rows.iter().map(principal_from_row).collect::<Result<_, _>>()?,
            total: from_db_id(total)?,
        })
    }

    #[instrument(skip(self, update), fields(user_id = %id))]
    async fn update_principal(
        &self,
        id: UserId,
        update: PrincipalUpdate,
    ) -> Result<Option<Principal>, StoreError> {
        let Some(db_id) = to_db_id(id.get()) else {
            return Ok(None);
        };
        let role_id = update
            .role_id
            .map(|r| to_db_id(r.get()).ok_or_else(|| StoreError::Conflict(format!("unknown role: {r}"))))
            .transpose()?;

        let row = sqlx::query(
            r#"
            UPDATE users SET
                name     = COALESCE($2, name),
                email    = COALESCE($3, email),
                password = COALESCE($4, password),
                role_id  = COALESCE($5, role_id)
            WHERE id = $1
            RETURNING id, name, email, password, role_id
            "#,
        )
        .bind(db_id)
        .bind(update.display_name)
        .bind(update.email)
        .bind(update.credential_hash)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_principal", e))?;

        row.as_ref().map(principal_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn remove_principal(&self, id: UserId) -> Result<bool, StoreError> {
        let Some(db_id) = to_db_id(id.get()) else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(db_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_principal", e))?;
        Ok(result.rows_affected() > 0)
    }
}

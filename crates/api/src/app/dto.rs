use serde::{Deserialize, Serialize};

use gotham_auth::{
    AuthContext, Capability, Permission, Principal, PrincipalPage, RoleId, RoleName, UserId,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl CreateUserRequest {
    /// Every field must be non-blank.
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.email, &self.password]
            .iter()
            .all(|v| !v.trim().is_empty())
    }
}

pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// `?page=&limit=`. Missing, unparsable or zero values fall back to page 1
/// and 10 per page; the limit is capped at [`MAX_PAGE_LIMIT`].
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListUsersQuery {
    pub fn page(&self) -> u64 {
        positive(self.page.as_deref()).unwrap_or(1)
    }

    pub fn limit(&self) -> u64 {
        positive(self.limit.as_deref())
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

fn positive(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
}

/// Partial user update. Empty strings and a zero role id mean "unchanged".
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<u64>,
}

impl UpdateUserRequest {
    pub fn name(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }

    pub fn email(&self) -> Option<&str> {
        non_empty(self.email.as_deref())
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(self.password.as_deref())
    }

    pub fn role_id(&self) -> Option<RoleId> {
        self.role_id.filter(|id| *id != 0).map(RoleId::new)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role_id: RoleId,
}

impl From<Principal> for UserResponse {
    fn from(p: Principal) -> Self {
        Self {
            id: p.id,
            name: p.display_name,
            email: p.email,
            role_id: p.role_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersPageResponse {
    pub status: u16,
    pub message: &'static str,
    pub data: Vec<UserResponse>,
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub limit: u64,
}

impl UsersPageResponse {
    pub fn new(page: PrincipalPage, current_page: u64, limit: u64) -> Self {
        Self {
            status: 200,
            message: "users found",
            data: page.principals.into_iter().map(UserResponse::from).collect(),
            total_count: page.total,
            total_pages: page.total.div_ceil(limit),
            current_page,
            limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub email: String,
    pub role_id: RoleId,
    pub role: RoleName,
    /// Snapshot carried by the token.
    pub permissions: Vec<Permission>,
    /// Resolved for this request.
    pub capabilities: Vec<Capability>,
}

impl From<&AuthContext> for WhoAmIResponse {
    fn from(ctx: &AuthContext) -> Self {
        Self {
            email: ctx.claims.email.clone(),
            role_id: ctx.role.id,
            role: ctx.role.name.clone(),
            permissions: ctx.claims.permissions.clone(),
            capabilities: ctx.role.capabilities.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: &'static str,
    pub task: &'static str,
    pub status: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_update_fields_are_ignored() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"name":"  ","email":"x@example.com","password":"","role_id":0}"#)
                .unwrap();

        assert_eq!(req.name(), None);
        assert_eq!(req.email(), Some("x@example.com"));
        assert_eq!(req.password(), None);
        assert_eq!(req.role_id(), None);
    }

    #[test]
    fn user_response_omits_credential_hash() {
        let principal = Principal {
            id: UserId::new(7),
            email: "seven@example.com".to_string(),
            display_name: "Seven".to_string(),
            credential_hash: "$2b$04$secret".to_string(),
            role_id: RoleId::new(3),
        };

        let body = serde_json::to_value(UserResponse::from(principal)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"id": 7, "name": "Seven", "email": "seven@example.com", "role_id": 3})
        );
    }

    #[test]
    fn paging_defaults_apply_to_missing_or_bad_values() {
        let query = ListUsersQuery::default();
        assert_eq!((query.page(), query.limit(), query.offset()), (1, 10, 0));

        let query = ListUsersQuery {
            page: Some("0".to_string()),
            limit: Some("-3".to_string()),
        };
        assert_eq!((query.page(), query.limit()), (1, 10));

        let query = ListUsersQuery {
            page: Some("3".to_string()),
            limit: Some("5000".to_string()),
        };
        assert_eq!((query.page(), query.limit(), query.offset()), (3, 100, 200));
    }

    #[test]
    fn registration_needs_every_field() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"name":"N","email":"n@example.com","password":" "}"#).unwrap();
        assert!(!req.is_complete());
    }

    #[test]
    fn page_response_counts_pages() {
        let page = PrincipalPage {
            principals: vec![],
            total: 21,
        };
        let body = serde_json::to_value(UsersPageResponse::new(page, 3, 10)).unwrap();
        assert_eq!(body["total_pages"], 3);
        assert_eq!(body["total_count"], 21);
        assert_eq!(body["current_page"], 3);
        assert_eq!(body["status"], 200);
    }
}

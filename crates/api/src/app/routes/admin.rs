//! Admin routes for user management.
//!
//! Guarded by capability and by the legacy method policy (DELETE for role 1,
//! PUT for roles 1 and 2).

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{
        Path,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, info};

use gotham_auth::{AuthContext, PrincipalUpdate, UserId};

use crate::app::dto::{UpdateUserRequest, UserResponse};
use crate::app::{errors, services::AppServices};

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// PUT /admin/users/:id - update name, email, password or role
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return errors::path_rejection(rejection),
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let credential_hash = match body.password() {
        Some(password) => match services.credentials.hash_async(password).await {
            Ok(hash) => Some(hash),
            Err(e) => {
                error!(error = %e, "password hashing failed");
                return errors::internal_error();
            }
        },
        None => None,
    };

    let update = PrincipalUpdate {
        email: body.email().map(str::to_string),
        display_name: body.name().map(str::to_string),
        credential_hash,
        role_id: body.role_id(),
    };
    if update.is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "no fields to update");
    }

    match services.directory.update_principal(UserId::new(id), update).await {
        Ok(Some(principal)) => {
            info!(actor = %ctx.claims.email, user_id = %principal.id, "user updated");
            Json(UserResponse::from(principal)).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "user not found"),
        Err(e) => errors::store_error_to_response(&e),
    }
}

/// DELETE /admin/users/:id - remove a user
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    id: Result<Path<u64>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return errors::path_rejection(rejection),
    };

    match services.directory.remove_principal(UserId::new(id)).await {
        Ok(true) => {
            info!(actor = %ctx.claims.email, user_id = id, "user deleted");
            Json(json!({ "message": "user deleted" })).into_response()
        }
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "user not found"),
        Err(e) => errors::store_error_to_response(&e),
    }
}

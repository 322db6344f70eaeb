//! Registration and user reads.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{
        Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use gotham_auth::{NewPrincipal, UserId};
use gotham_infra::seed::USER_ROLE_ID;

use crate::app::dto::{CreateUserRequest, ListUsersQuery, UserResponse, UsersPageResponse};
use crate::app::{errors, services::AppServices};

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /users - register with the default `user` role
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    if !body.is_complete() {
        return errors::json_error(StatusCode::BAD_REQUEST, "name, email and password are required");
    }

    let credential_hash = match services.credentials.hash_async(&body.password).await {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "password hashing failed");
            return errors::internal_error();
        }
    };

    let new = NewPrincipal {
        email: body.email.trim().to_string(),
        display_name: body.name.trim().to_string(),
        credential_hash,
        role_id: USER_ROLE_ID,
    };

    match services.directory.create_principal(new).await {
        Ok(principal) => {
            info!(user_id = %principal.id, "user registered");
            (StatusCode::CREATED, Json(UserResponse::from(principal))).into_response()
        }
        Err(e) => errors::store_error_to_response(&e),
    }
}

/// GET /users?page=&limit= - one page of users, ordered by id
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let (page, limit) = (query.page(), query.limit());

    match services.directory.list_principals(query.offset(), limit).await {
        Ok(found) => Json(UsersPageResponse::new(found, page, limit)).into_response(),
        Err(e) => errors::store_error_to_response(&e),
    }
}

/// GET /users/:id
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    id: Result<Path<u64>, PathRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(rejection) => return errors::path_rejection(rejection),
    };

    match services.directory.find_principal_by_id(UserId::new(id)).await {
        Ok(Some(principal)) => Json(UserResponse::from(principal)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "user not found"),
        Err(e) => errors::store_error_to_response(&e),
    }
}

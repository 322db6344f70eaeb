use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::{debug, error};

use gotham_auth::{AuthError, AuthErrorKind, StoreError};

/// Error body shared by every rejection: `{ "status": 401, "message": "..." }`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "status": status.as_u16(),
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Map an auth failure to a generic client-facing response.
///
/// Which check rejected the request is never revealed to the client.
pub fn auth_error_to_response(err: &AuthError) -> axum::response::Response {
    match err.kind() {
        AuthErrorKind::Unauthenticated => {
            let message = match err {
                AuthError::InvalidCredentials => "invalid credentials",
                _ => "invalid or expired token",
            };
            json_error(StatusCode::UNAUTHORIZED, message)
        }
        AuthErrorKind::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden"),
        AuthErrorKind::Internal => {
            error!(error = %err, "auth operation failed");
            internal_error()
        }
    }
}

pub fn store_error_to_response(err: &StoreError) -> axum::response::Response {
    match err {
        StoreError::Conflict(msg) => {
            debug!(reason = %msg, "store rejected the write");
            json_error(StatusCode::CONFLICT, "conflict")
        }
        StoreError::Backend(_) => {
            error!(error = %err, "principal store failed");
            internal_error()
        }
    }
}

pub fn internal_error() -> axum::response::Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    debug!(reason = %rejection.body_text(), "rejected request body");
    json_error(StatusCode::BAD_REQUEST, "invalid request body")
}

pub fn query_rejection(rejection: QueryRejection) -> axum::response::Response {
    debug!(reason = %rejection.body_text(), "rejected query string");
    json_error(StatusCode::BAD_REQUEST, "invalid query")
}

pub fn path_rejection(rejection: PathRejection) -> axum::response::Response {
    debug!(reason = %rejection.body_text(), "rejected path parameter");
    json_error(StatusCode::BAD_REQUEST, "invalid id")
}

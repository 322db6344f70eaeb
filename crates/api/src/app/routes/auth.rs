//! Session endpoints: login, refresh, logout.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use gotham_auth::AuthContext;

use crate::app::dto::{LoginRequest, RefreshTokenRequest, TokenResponse};
use crate::app::{errors, services::AppServices};

/// POST /login - exchange email + password for a token
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services
        .sessions
        .login(&body.email, &body.password, Utc::now())
        .await
    {
        Ok(token) => Json(TokenResponse { token }).into_response(),
        Err(e) => errors::auth_error_to_response(&e),
    }
}

/// POST /refresh_token - exchange a live token for a fresh one
pub async fn refresh_token(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services
        .sessions
        .refresh(&body.refresh_token, Utc::now())
        .await
    {
        Ok(token) => Json(TokenResponse { token }).into_response(),
        Err(e) => errors::auth_error_to_response(&e),
    }
}

/// POST /logout - revoke the presented token
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> Response {
    match services.sessions.revoke(&ctx.token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::auth_error_to_response(&e),
    }
}

use axum::{Extension, Json, http::StatusCode};

use gotham_auth::AuthContext;

use crate::app::dto::WhoAmIResponse;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<AuthContext>) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse::from(&ctx))
}

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use gotham_auth::{AuthError, AuthorizationResolver, RequestMethod, RoutePolicy};

use crate::app::errors;

/// Per-route authorization: the shared resolver plus the route's policy.
#[derive(Clone)]
pub struct RouteGuard {
    resolver: Arc<AuthorizationResolver>,
    policy: Arc<RoutePolicy>,
}

impl RouteGuard {
    pub fn new(resolver: Arc<AuthorizationResolver>, policy: RoutePolicy) -> Self {
        Self {
            resolver,
            policy: Arc::new(policy),
        }
    }
}

/// Authorize the request against the guard's policy and attach the
/// resulting [`AuthContext`](gotham_auth::AuthContext) to its extensions.
pub async fn auth_middleware(
    State(guard): State<RouteGuard>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token.to_string(),
        Err(e) => return errors::auth_error_to_response(&e),
    };
    let method = RequestMethod::from(req.method().as_str());

    match guard
        .resolver
        .authorize(&token, &method, &guard.policy, Utc::now())
        .await
    {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(e) => {
            debug!(error = %e, path = %req.uri().path(), "request rejected");
            errors::auth_error_to_response(&e)
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MalformedToken)?;

    let header = header.to_str().map_err(|_| AuthError::MalformedToken)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedToken)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedToken);
    }

    Ok(token)
}

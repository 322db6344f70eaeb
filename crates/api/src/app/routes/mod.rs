use std::sync::Arc;

use axum::{
    Router,
    routing::{MethodRouter, delete, get, post, put},
};

use gotham_auth::capability::{DELETE_USER, READ_USER, UPDATE_USER, VIEW_TASKS};
use gotham_auth::{AuthorizationResolver, MethodPolicy, RoutePolicy};

use crate::middleware::{RouteGuard, auth_middleware};

pub mod admin;
pub mod auth;
pub mod system;
pub mod tasks;
pub mod users;

/// Every route of the API. Protected routes carry their own guard.
pub fn router(resolver: &Arc<AuthorizationResolver>) -> Router {
    let guard = |route: MethodRouter, policy: RoutePolicy| guarded(route, resolver, policy);

    Router::new()
        .route("/health", get(system::health))
        .route("/login", post(auth::login))
        .route("/refresh_token", post(auth::refresh_token))
        .route(
            "/users",
            post(users::create_user).merge(guard(
                get(users::list_users),
                RoutePolicy::authenticated().require_capabilities([READ_USER]),
            )),
        )
        .route(
            "/users/:id",
            guard(
                get(users::get_user),
                RoutePolicy::authenticated().require_capabilities([READ_USER]),
            ),
        )
        .route("/logout", guard(post(auth::logout), RoutePolicy::authenticated()))
        .route("/whoami", guard(get(system::whoami), RoutePolicy::authenticated()))
        .route(
            "/protected/tasks",
            guard(
                get(tasks::list_tasks),
                RoutePolicy::authenticated().require_capabilities([VIEW_TASKS]),
            ),
        )
        .route(
            "/admin/users/:id",
            guard(
                put(admin::update_user),
                RoutePolicy::authenticated()
                    .method_sensitive(MethodPolicy::legacy_role_ids())
                    .require_capabilities([UPDATE_USER]),
            )
            .merge(guard(
                delete(admin::delete_user),
                RoutePolicy::authenticated()
                    .method_sensitive(MethodPolicy::legacy_role_ids())
                    .require_capabilities([DELETE_USER]),
            )),
        )
}

fn guarded(
    route: MethodRouter,
    resolver: &Arc<AuthorizationResolver>,
    policy: RoutePolicy,
) -> MethodRouter {
    route.route_layer(axum::middleware::from_fn_with_state(
        RouteGuard::new(resolver.clone(), policy),
        auth_middleware,
    ))
}

//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: adapter selection and auth core construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::config::ApiConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, ServicesError, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> Result<Router, ServicesError> {
    let services = Arc::new(build_services(config).await?);
    Ok(build_router(services))
}

/// Build the router over already constructed services.
pub fn build_router(services: Arc<AppServices>) -> Router {
    routes::router(&services.resolver)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

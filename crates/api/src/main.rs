use anyhow::Context;

use gotham_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gotham_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let app = gotham_api::app::build_app(&config)
        .await
        .context("failed to wire services")?;

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        app = %config.app_name,
        env = %config.app_env,
        "listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio_server::config::AppConfig;
use folio_server::seed::seed_default_users;
use folio_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::from_config(config)
        .await
        .context("Failed to initialise backends")?;

    seed_default_users(&state.directory, &state.config.seed)
        .await
        .context("Failed to seed default users")?;

    let app = folio_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

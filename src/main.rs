use std::{env, net::SocketAddr};
use tasky_dashboard::{load_settings, resolve_settings_path, router, AppState, Dashboard, Settings};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let settings_path = resolve_settings_path();
    let settings = load_settings(&settings_path, Settings::from_env()).await;
    info!(
        api_base_url = %settings.api_base_url,
        refresh_secs = settings.refresh_interval_secs,
        "settings loaded from {}",
        settings_path.display()
    );

    let dashboard = Dashboard::new(settings, settings_path)?;
    let startup = dashboard.clone();
    tokio::spawn(async move { startup.start().await });

    let app = router(AppState::new(dashboard.clone()));

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("dashboard listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dashboard.scheduler().stop();
    info!("dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}

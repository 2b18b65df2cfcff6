use std::net::SocketAddr;

use chrono::Utc;
use skywings_api::{
    app,
    state::{AppState, AuthConfig},
    worker::start_expiry_worker,
};
use skywings_store::{app_config::Config, seed::seed_demo_data};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skywings_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting SkyWings API on port {}", config.server.port);

    let state = AppState::in_memory(
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        config.business_rules.clone(),
    );

    seed_demo_data(state.flights.as_ref(), state.users.as_ref(), &config.seed, Utc::now()).await?;

    tokio::spawn(start_expiry_worker(
        state.manager.clone(),
        std::time::Duration::from_secs(config.business_rules.expiry_sweep_seconds.max(1)),
    ));

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

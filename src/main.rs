use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use axum_takeout_api::{
    app::build_app,
    cache::InMemoryCacheStore,
    clock::SystemClock,
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    order_number::SnowflakeGenerator,
    scheduler,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,axum_takeout_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let order_numbers = SnowflakeGenerator::new(config.order_number_worker_id)?;
    let state = AppState::new(
        orm,
        Arc::new(SystemClock),
        Arc::new(order_numbers),
        Arc::new(InMemoryCacheStore::new()),
    );

    let sweeps = scheduler::spawn(state.clone(), config.sweep.clone());
    let app = build_app(state);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
        })
        .await?;

    sweeps.shutdown();
    tracing::info!("server stopped");
    Ok(())
}

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use showme_api::{
    api::{create_router, AppState, Repositories},
    auth::{Argon2CredentialHasher, TokenService},
    clock::{Clock, SystemClock},
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, PgStore},
    services::{TmdbProvider, TvMazeProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("showme_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    run_migrations(&pool).await?;

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client).await;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let shows = TvMazeProvider::new(
        config.tvmaze_api_url.clone(),
        config.catalog_cache_ttl()?,
        clock.clone(),
    );
    let movies = TmdbProvider::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    );

    let state = Arc::new(AppState::new(
        Repositories::from_store(Arc::new(PgStore::new(pool))),
        Arc::new(Argon2CredentialHasher::default()),
        TokenService::new(&config.jwt_secret, config.token_ttl()?),
        Arc::new(shows),
        Arc::new(movies),
    ));

    let sweeper = state
        .sweeper(clock, config.recommendation_retention()?)
        .spawn(config.cleanup_interval()?);

    let app = create_router(state, &config.cors_origin_list());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    cache_writer.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

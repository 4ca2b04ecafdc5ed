use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leaderboard_service::index::RankedIndex;
use leaderboard_service::repository::PostgresScoreStore;
use leaderboard_service::scoring::{ScoringStrategy, StrategyRegistry};
use leaderboard_service::services::{ConsistencyCoordinator, QueryEngine};
use leaderboard_service::{config::Config, db, routes, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Leaderboard Service");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        env = %config.app.env,
        host = %config.app.host,
        port = config.app.port,
        "Configuration loaded"
    );

    // Database pool + migrations
    let pool = db::create_pool(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations applied");

    // Ranking engine wiring: durable store, in-memory index, coordinator.
    let store = Arc::new(PostgresScoreStore::new(
        pool.clone(),
        Duration::from_millis(config.database.store_timeout_ms),
    ));
    let index = Arc::new(RankedIndex::new());
    let coordinator = Arc::new(ConsistencyCoordinator::new(store.clone(), index));
    let queries = Arc::new(QueryEngine::new(coordinator.clone()));
    let strategies = Arc::new(StrategyRegistry::new(ScoringStrategy::default()));

    let state = AppState {
        db: pool,
        store,
        coordinator,
        queries,
        strategies,
    };

    let bind_addr = (config.app.host.clone(), config.app.port);
    info!("Listening on {}:{}", bind_addr.0, bind_addr.1);

    let permissive_cors = config.app.env == "development";

    HttpServer::new(move || {
        let cors = if permissive_cors {
            Cors::permissive()
        } else {
            Cors::default()
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
    .context("HTTP server terminated")
}

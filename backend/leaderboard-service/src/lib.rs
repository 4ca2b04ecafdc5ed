pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod index;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod routes;
pub mod scoring;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use repository::ScoreStore;
use scoring::StrategyRegistry;
use services::{ConsistencyCoordinator, QueryEngine};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub store: Arc<dyn ScoreStore>,
    pub coordinator: Arc<ConsistencyCoordinator>,
    pub queries: Arc<QueryEngine>,
    pub strategies: Arc<StrategyRegistry>,
}

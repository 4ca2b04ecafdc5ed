mod postgres_store;
mod score_store;

pub use postgres_store::PostgresScoreStore;
pub use score_store::ScoreStore;

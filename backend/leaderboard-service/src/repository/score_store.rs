use crate::error::Result;
use crate::models::LeaderboardEntry;

/// Durable, canonical score storage for one row per (instance, user).
///
/// `PostgresScoreStore` is the production implementation; tests substitute
/// an in-memory one. Every implementation must order results by
/// `(score DESC, user_id ASC)` — the same comparator the in-memory index
/// uses — so the two read paths never disagree.
#[async_trait::async_trait]
pub trait ScoreStore: Send + Sync {
    /// Insert or overwrite the score for (instance, user) atomically.
    /// Repeating the same upsert is a no-op in effect.
    async fn upsert(&self, instance_id: &str, user_id: &str, score: f64) -> Result<()>;

    /// Current score for a user, or `None` if absent.
    async fn get(&self, instance_id: &str, user_id: &str) -> Result<Option<f64>>;

    /// 1-based rank of a user within its instance, or `None` if absent.
    async fn rank_of(&self, instance_id: &str, user_id: &str)
        -> Result<Option<LeaderboardEntry>>;

    /// Top entries ordered by rank, skipping `offset` ranks.
    async fn top_n(
        &self,
        instance_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntry>>;

    /// Entries whose rank is within `radius` positions of the user's rank,
    /// clipped at the boundaries. `None` if the user is absent.
    async fn around(
        &self,
        instance_id: &str,
        user_id: &str,
        radius: i64,
    ) -> Result<Option<Vec<LeaderboardEntry>>>;

    /// All (user, score) pairs for an instance in rank order. Feeds index
    /// rebuilds.
    async fn fetch_all(&self, instance_id: &str) -> Result<Vec<(String, f64)>>;

    /// Number of users in an instance.
    async fn count(&self, instance_id: &str) -> Result<i64>;
}

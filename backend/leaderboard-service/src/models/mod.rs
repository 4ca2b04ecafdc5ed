use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical durable row: one per (leaderboard instance, user).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserScore {
    pub id: i64,
    pub leaderboard_instance_id: String,
    pub user_id: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A ranked row as served by the read endpoints. Rank is 1-based and
/// derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub score: f64,
    pub rank: i64,
}

/// Ordering shared by the in-memory index and every SQL `ORDER BY`:
/// score descending, then user id ascending for deterministic ties.
pub fn rank_ordering(a_score: f64, a_user: &str, b_score: f64, b_user: &str) -> std::cmp::Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| a_user.cmp(b_user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn higher_score_sorts_first() {
        assert_eq!(rank_ordering(100.0, "b", 50.0, "a"), Ordering::Less);
        assert_eq!(rank_ordering(50.0, "a", 100.0, "b"), Ordering::Greater);
    }

    #[test]
    fn ties_resolve_by_user_id_ascending() {
        assert_eq!(rank_ordering(100.0, "alice", 100.0, "bob"), Ordering::Less);
        assert_eq!(rank_ordering(100.0, "bob", 100.0, "alice"), Ordering::Greater);
        assert_eq!(rank_ordering(100.0, "alice", 100.0, "alice"), Ordering::Equal);
    }
}

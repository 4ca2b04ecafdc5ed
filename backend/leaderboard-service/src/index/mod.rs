//! In-memory ranked index: one sorted structure per leaderboard instance.
//!
//! Each instance owns a `Vec` kept sorted by `(score DESC, user_id ASC)`
//! plus a user -> score map, giving O(log n) rank lookup and cheap window
//! slices. The index is a rebuildable cache over the durable store; it is
//! never persisted and is rebuilt wholesale on cold start or staleness.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{rank_ordering, LeaderboardEntry};

#[derive(Debug, Clone)]
struct RankEntry {
    user_id: String,
    score: f64,
}

/// Rank-ordered entries for a single leaderboard instance.
#[derive(Debug, Default)]
pub struct InstanceIndex {
    ordered: Vec<RankEntry>,
    scores: HashMap<String, f64>,
}

impl InstanceIndex {
    fn position_of(&self, score: f64, user_id: &str) -> std::result::Result<usize, usize> {
        self.ordered
            .binary_search_by(|e| rank_ordering(e.score, &e.user_id, score, user_id))
    }

    /// Insert or replace the entry for `user_id`. Never creates duplicates:
    /// an existing entry is removed from its old position first.
    pub fn upsert(&mut self, user_id: &str, score: f64) {
        if let Some(old_score) = self.scores.insert(user_id.to_string(), score) {
            if old_score == score {
                return;
            }
            if let Ok(pos) = self.position_of(old_score, user_id) {
                self.ordered.remove(pos);
            }
        }

        match self.position_of(score, user_id) {
            // Unreachable after the removal above, but insertion at the
            // found position keeps the ordering correct either way.
            Ok(pos) | Err(pos) => self.ordered.insert(
                pos,
                RankEntry {
                    user_id: user_id.to_string(),
                    score,
                },
            ),
        }
    }

    pub fn remove(&mut self, user_id: &str) {
        if let Some(old_score) = self.scores.remove(user_id) {
            if let Ok(pos) = self.position_of(old_score, user_id) {
                self.ordered.remove(pos);
            }
        }
    }

    /// 1-based rank of a user, or `None` if absent.
    pub fn rank_of(&self, user_id: &str) -> Option<i64> {
        let score = *self.scores.get(user_id)?;
        let pos = self.position_of(score, user_id).ok()?;
        Some(pos as i64 + 1)
    }

    pub fn entry_for(&self, user_id: &str) -> Option<LeaderboardEntry> {
        let rank = self.rank_of(user_id)?;
        Some(LeaderboardEntry {
            user_id: user_id.to_string(),
            score: self.scores[user_id],
            rank,
        })
    }

    pub fn top_n(&self, limit: usize, offset: usize) -> Vec<LeaderboardEntry> {
        self.ordered
            .iter()
            .enumerate()
            .skip(offset)
            .take(limit)
            .map(|(i, e)| LeaderboardEntry {
                user_id: e.user_id.clone(),
                score: e.score,
                rank: i as i64 + 1,
            })
            .collect()
    }

    /// Entries with rank in `[max(1, r - radius), r + radius]` where `r` is
    /// the user's rank. The window clips at the boundaries; it never shifts.
    pub fn around(&self, user_id: &str, radius: usize) -> Option<Vec<LeaderboardEntry>> {
        let rank = self.rank_of(user_id)? as usize;
        let start = rank.saturating_sub(radius).max(1);
        let end = (rank + radius).min(self.ordered.len());

        Some(
            self.ordered[start - 1..end]
                .iter()
                .enumerate()
                .map(|(i, e)| LeaderboardEntry {
                    user_id: e.user_id.clone(),
                    score: e.score,
                    rank: (start + i) as i64,
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// One built index plus its staleness marker. The marker lives outside the
/// lock so writers can flag divergence without awaiting.
#[derive(Debug, Default)]
struct InstanceCell {
    index: RwLock<InstanceIndex>,
    stale: AtomicBool,
}

/// Registry of per-instance indexes. Each instance index is exclusively
/// owned here and accessed through its own `RwLock`; there is no global
/// lock across instances.
#[derive(Debug, Default)]
pub struct RankedIndex {
    instances: DashMap<String, Arc<InstanceCell>>,
}

impl RankedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, instance_id: &str) -> Option<Arc<InstanceCell>> {
        self.instances.get(instance_id).map(|e| e.value().clone())
    }

    /// An index has been built for the instance and has not been marked
    /// stale. Used by reads to decide between fast path and fallback.
    pub fn is_populated(&self, instance_id: &str) -> bool {
        match self.cell(instance_id) {
            Some(cell) => !cell.stale.load(Ordering::Acquire),
            None => false,
        }
    }

    /// Apply a write to the instance index if one has been built. A cold
    /// instance is left untouched; the next read rebuilds it from the store.
    /// Returns whether the write was applied.
    pub async fn upsert_if_present(&self, instance_id: &str, user_id: &str, score: f64) -> bool {
        match self.cell(instance_id) {
            Some(cell) => {
                cell.index.write().await.upsert(user_id, score);
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, instance_id: &str, user_id: &str) {
        if let Some(cell) = self.cell(instance_id) {
            cell.index.write().await.remove(user_id);
        }
    }

    pub async fn rank_of(&self, instance_id: &str, user_id: &str) -> Option<LeaderboardEntry> {
        let cell = self.cell(instance_id)?;
        let guard = cell.index.read().await;
        guard.entry_for(user_id)
    }

    pub async fn top_n(
        &self,
        instance_id: &str,
        limit: usize,
        offset: usize,
    ) -> Vec<LeaderboardEntry> {
        match self.cell(instance_id) {
            Some(cell) => cell.index.read().await.top_n(limit, offset),
            None => Vec::new(),
        }
    }

    pub async fn around(
        &self,
        instance_id: &str,
        user_id: &str,
        radius: usize,
    ) -> Option<Vec<LeaderboardEntry>> {
        let cell = self.cell(instance_id)?;
        let guard = cell.index.read().await;
        guard.around(user_id, radius)
    }

    pub async fn len(&self, instance_id: &str) -> usize {
        match self.cell(instance_id) {
            Some(cell) => cell.index.read().await.len(),
            None => 0,
        }
    }

    /// Flag an instance index as diverged from the durable store. The next
    /// read rebuilds it; staleness is never surfaced to callers.
    pub fn mark_stale(&self, instance_id: &str) {
        if let Some(cell) = self.cell(instance_id) {
            cell.stale.store(true, Ordering::Release);
        }
    }

    /// Atomically swap in a freshly built index for the instance. Readers
    /// holding the old index finish against the old snapshot; new readers
    /// see only the complete replacement.
    pub fn replace(&self, instance_id: &str, entries: Vec<(String, f64)>) {
        let mut fresh = InstanceIndex::default();
        for (user_id, score) in entries {
            fresh.upsert(&user_id, score);
        }
        self.instances.insert(
            instance_id.to_string(),
            Arc::new(InstanceCell {
                index: RwLock::new(fresh),
                stale: AtomicBool::new(false),
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> InstanceIndex {
        // user01 (1000) .. user10 (100), step 100, mirroring the seed data
        // the service is exercised with end to end.
        let mut idx = InstanceIndex::default();
        for i in 1..=10u32 {
            idx.upsert(&format!("user{:02}", i), 1000.0 - (i - 1) as f64 * 100.0);
        }
        idx
    }

    #[test]
    fn top_n_orders_by_score_descending() {
        let idx = populated();
        let top = idx.top_n(3, 0);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].user_id, "user01");
        assert_eq!(top[0].score, 1000.0);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[2].user_id, "user03");
        assert_eq!(top[2].rank, 3);
    }

    #[test]
    fn top_n_with_offset() {
        let idx = populated();
        let page = idx.top_n(3, 3);

        assert_eq!(
            page.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![4, 5, 6]
        );
        assert_eq!(page[0].user_id, "user04");
    }

    #[test]
    fn rank_of_is_one_based() {
        let idx = populated();
        assert_eq!(idx.rank_of("user05"), Some(5));
        assert_eq!(idx.rank_of("user01"), Some(1));
        assert_eq!(idx.rank_of("ghost"), None);
    }

    #[test]
    fn around_returns_symmetric_window() {
        let idx = populated();
        let window = idx.around("user05", 2).unwrap();

        assert_eq!(window.len(), 5);
        assert_eq!(
            window.iter().map(|e| e.user_id.as_str()).collect::<Vec<_>>(),
            vec!["user03", "user04", "user05", "user06", "user07"]
        );
        assert_eq!(
            window.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![3, 4, 5, 6, 7]
        );
    }

    #[test]
    fn around_clips_at_top_boundary() {
        let idx = populated();
        let window = idx.around("user01", 2).unwrap();

        // Clipped, not shifted: ranks 1..=3 only.
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].rank, 1);
        assert_eq!(window[2].user_id, "user03");
    }

    #[test]
    fn around_clips_at_bottom_boundary() {
        let idx = populated();
        let window = idx.around("user10", 3).unwrap();

        assert_eq!(window.len(), 4);
        assert_eq!(
            window.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![7, 8, 9, 10]
        );
    }

    #[test]
    fn around_of_absent_user_is_none() {
        let idx = populated();
        assert!(idx.around("ghost", 2).is_none());
    }

    #[test]
    fn upsert_replaces_existing_entry() {
        let mut idx = populated();
        idx.upsert("user10", 950.0);

        assert_eq!(idx.len(), 10);
        assert_eq!(idx.rank_of("user10"), Some(2));
        assert_eq!(idx.rank_of("user02"), Some(3));
    }

    #[test]
    fn upsert_same_score_is_a_no_op() {
        let mut idx = populated();
        idx.upsert("user05", 600.0);
        idx.upsert("user05", 600.0);

        assert_eq!(idx.len(), 10);
        assert_eq!(idx.rank_of("user05"), Some(5));
    }

    #[test]
    fn equal_scores_tie_break_by_user_id() {
        let mut idx = InstanceIndex::default();
        idx.upsert("carol", 500.0);
        idx.upsert("alice", 500.0);
        idx.upsert("bob", 500.0);

        let top = idx.top_n(10, 0);
        assert_eq!(
            top.iter().map(|e| e.user_id.as_str()).collect::<Vec<_>>(),
            vec!["alice", "bob", "carol"]
        );
    }

    #[test]
    fn remove_drops_entry_and_shifts_ranks() {
        let mut idx = populated();
        idx.remove("user03");

        assert_eq!(idx.len(), 9);
        assert_eq!(idx.rank_of("user03"), None);
        assert_eq!(idx.rank_of("user04"), Some(3));
    }

    #[tokio::test]
    async fn registry_skips_writes_for_cold_instances() {
        let registry = RankedIndex::new();

        assert!(!registry.upsert_if_present("board", "user1", 10.0).await);
        assert!(!registry.is_populated("board"));

        registry.replace("board", vec![("user1".to_string(), 10.0)]);
        assert!(registry.is_populated("board"));
        assert!(registry.upsert_if_present("board", "user2", 20.0).await);
        assert_eq!(registry.len("board").await, 2);
    }

    #[tokio::test]
    async fn stale_instances_report_unpopulated_until_replaced() {
        let registry = RankedIndex::new();
        registry.replace("board", vec![("user1".to_string(), 10.0)]);

        registry.mark_stale("board");
        assert!(!registry.is_populated("board"));

        registry.replace("board", vec![("user1".to_string(), 10.0)]);
        assert!(registry.is_populated("board"));
    }
}

//! Shared test fixtures: an in-memory `ScoreStore` so the ranking engine
//! can be exercised without Postgres, plus failure injection for the
//! fallback paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use leaderboard_service::error::{AppError, Result};
use leaderboard_service::models::{rank_ordering, LeaderboardEntry};
use leaderboard_service::repository::ScoreStore;

#[derive(Default)]
pub struct MemoryScoreStore {
    rows: Mutex<HashMap<String, HashMap<String, f64>>>,
    unavailable: AtomicBool,
    pub fetch_all_calls: AtomicUsize,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every store call fail with `StoreUnavailable` until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Seed a row directly, bypassing the coordinator. Simulates data that
    /// predates this process (cold start) or writes from another node.
    pub fn seed(&self, instance_id: &str, user_id: &str, score: f64) {
        self.rows
            .lock()
            .unwrap()
            .entry(instance_id.to_string())
            .or_default()
            .insert(user_id.to_string(), score);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AppError::StoreUnavailable(
                "injected store failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn ranked(&self, instance_id: &str) -> Vec<LeaderboardEntry> {
        let rows = self.rows.lock().unwrap();
        let mut entries: Vec<(String, f64)> = rows
            .get(instance_id)
            .map(|m| m.iter().map(|(u, s)| (u.clone(), *s)).collect())
            .unwrap_or_default();

        entries.sort_by(|a, b| rank_ordering(a.1, &a.0, b.1, &b.0));

        entries
            .into_iter()
            .enumerate()
            .map(|(i, (user_id, score))| LeaderboardEntry {
                user_id,
                score,
                rank: i as i64 + 1,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn upsert(&self, instance_id: &str, user_id: &str, score: f64) -> Result<()> {
        self.check_available()?;
        self.seed(instance_id, user_id, score);
        Ok(())
    }

    async fn get(&self, instance_id: &str, user_id: &str) -> Result<Option<f64>> {
        self.check_available()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(instance_id)
            .and_then(|m| m.get(user_id))
            .copied())
    }

    async fn rank_of(
        &self,
        instance_id: &str,
        user_id: &str,
    ) -> Result<Option<LeaderboardEntry>> {
        self.check_available()?;
        Ok(self
            .ranked(instance_id)
            .into_iter()
            .find(|e| e.user_id == user_id))
    }

    async fn top_n(
        &self,
        instance_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntry>> {
        self.check_available()?;
        Ok(self
            .ranked(instance_id)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn around(
        &self,
        instance_id: &str,
        user_id: &str,
        radius: i64,
    ) -> Result<Option<Vec<LeaderboardEntry>>> {
        self.check_available()?;
        let ranked = self.ranked(instance_id);
        let Some(target) = ranked.iter().find(|e| e.user_id == user_id) else {
            return Ok(None);
        };

        let rank = target.rank;
        let start = (rank - radius).max(1);
        let end = rank + radius;
        Ok(Some(
            ranked
                .into_iter()
                .filter(|e| e.rank >= start && e.rank <= end)
                .collect(),
        ))
    }

    async fn fetch_all(&self, instance_id: &str) -> Result<Vec<(String, f64)>> {
        self.check_available()?;
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .ranked(instance_id)
            .into_iter()
            .map(|e| (e.user_id, e.score))
            .collect())
    }

    async fn count(&self, instance_id: &str) -> Result<i64> {
        self.check_available()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(instance_id)
            .map(|m| m.len() as i64)
            .unwrap_or(0))
    }
}

//! Write path and dual-store consistency.
//!
//! The durable store is the source of truth; the ranked index is a derived,
//! rebuildable cache. Every write goes store-first, then index, inside a
//! per-instance critical section so the two stores always agree on which of
//! two racing writes won. Rebuilds take the same critical section, so
//! readers never observe a half-built index.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::index::RankedIndex;
use crate::metrics::{INDEX_REBUILD_TOTAL, WRITE_TOTAL};
use crate::repository::ScoreStore;

pub struct ConsistencyCoordinator {
    store: Arc<dyn ScoreStore>,
    index: Arc<RankedIndex>,
    /// One mutex per leaderboard instance, shared by writers and rebuilds.
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ConsistencyCoordinator {
    pub fn new(store: Arc<dyn ScoreStore>, index: Arc<RankedIndex>) -> Self {
        Self {
            store,
            index,
            write_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> Arc<dyn ScoreStore> {
        self.store.clone()
    }

    pub fn index(&self) -> Arc<RankedIndex> {
        self.index.clone()
    }

    fn write_lock(&self, instance_id: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(instance_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Write a score to both stores. Store-first: if the durable write
    /// fails, the operation fails and the index is untouched. The sequence
    /// runs on a detached task so a caller abandoning the request cannot
    /// leave the store written but the index not.
    pub async fn write_score(&self, instance_id: &str, user_id: &str, score: f64) -> Result<()> {
        if instance_id.is_empty() || user_id.is_empty() {
            return Err(AppError::BadRequest(
                "instanceId and userId must be non-empty".to_string(),
            ));
        }
        if !score.is_finite() {
            return Err(AppError::BadRequest(format!(
                "score must be a finite number, got {}",
                score
            )));
        }

        let store = self.store.clone();
        let index = self.index.clone();
        let lock = self.write_lock(instance_id);
        let instance = instance_id.to_string();
        let user = user_id.to_string();

        let handle = tokio::spawn(async move {
            let _guard = lock.lock().await;

            store.upsert(&instance, &user, score).await?;

            let applied = index.upsert_if_present(&instance, &user, score).await;
            debug!(
                instance_id = %instance,
                user_id = %user,
                score,
                index_applied = applied,
                "score written"
            );
            Ok::<(), AppError>(())
        });

        let result = handle
            .await
            .map_err(|e| AppError::Internal(format!("write task failed: {}", e)))?;

        match &result {
            Ok(()) => WRITE_TOTAL.with_label_values(&["success"]).inc(),
            Err(e) => {
                WRITE_TOTAL.with_label_values(&["error"]).inc();
                warn!(instance_id, user_id, error = %e, "score write failed");
            }
        }

        result
    }

    /// Make sure a usable index exists for the instance, rebuilding it from
    /// the durable store when it is missing or marked stale. All-or-nothing:
    /// a failed rebuild leaves the previous state and the caller falls back
    /// to the store.
    pub async fn ensure_index(&self, instance_id: &str) -> Result<()> {
        if self.index.is_populated(instance_id) {
            return Ok(());
        }

        let lock = self.write_lock(instance_id);
        let _guard = lock.lock().await;

        // Another reader may have rebuilt while we waited.
        if self.index.is_populated(instance_id) {
            return Ok(());
        }

        let entries = match self.store.fetch_all(instance_id).await {
            Ok(entries) => entries,
            Err(e) => {
                INDEX_REBUILD_TOTAL.with_label_values(&["error"]).inc();
                warn!(instance_id, error = %e, "index rebuild failed, reads fall back to store");
                return Err(e);
            }
        };

        let count = entries.len();
        self.index.replace(instance_id, entries);
        INDEX_REBUILD_TOTAL.with_label_values(&["success"]).inc();
        info!(instance_id, entries = count, "ranked index rebuilt from store");

        Ok(())
    }

    /// Flag an instance index as diverged; the next read heals it.
    pub fn invalidate_index(&self, instance_id: &str) {
        self.index.mark_stale(instance_id);
    }
}

//! Read path: ranked index fast path with store fallback.
//!
//! Both paths compute ranks with the same comparator and the same 1-based
//! numbering, so a caller cannot tell which backend answered.

use std::sync::Arc;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::index::RankedIndex;
use crate::metrics::READ_PATH_TOTAL;
use crate::models::LeaderboardEntry;
use crate::repository::ScoreStore;
use crate::services::ConsistencyCoordinator;

pub struct QueryEngine {
    coordinator: Arc<ConsistencyCoordinator>,
    store: Arc<dyn ScoreStore>,
    index: Arc<RankedIndex>,
}

impl QueryEngine {
    pub fn new(coordinator: Arc<ConsistencyCoordinator>) -> Self {
        let store = coordinator.store();
        let index = coordinator.index();
        Self {
            coordinator,
            store,
            index,
        }
    }

    /// True when the index is usable for this instance; false routes the
    /// read to the store. Infrastructure errors during rebuild degrade to
    /// the fallback rather than failing the read.
    async fn index_ready(&self, instance_id: &str, operation: &str) -> bool {
        match self.coordinator.ensure_index(instance_id).await {
            Ok(()) => {
                READ_PATH_TOTAL
                    .with_label_values(&[operation, "index"])
                    .inc();
                true
            }
            Err(e) => {
                READ_PATH_TOTAL
                    .with_label_values(&[operation, "store"])
                    .inc();
                warn!(instance_id, operation, error = %e, "index unavailable, serving from store");
                false
            }
        }
    }

    pub async fn top_n(
        &self,
        instance_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeaderboardEntry>> {
        if self.index_ready(instance_id, "top_n").await {
            return Ok(self
                .index
                .top_n(instance_id, limit as usize, offset as usize)
                .await);
        }
        self.store.top_n(instance_id, limit, offset).await
    }

    pub async fn rank_of(&self, instance_id: &str, user_id: &str) -> Result<LeaderboardEntry> {
        if self.index_ready(instance_id, "rank_of").await {
            // A freshly ensured index mirrors the store, so absence here is
            // authoritative.
            return self
                .index
                .rank_of(instance_id, user_id)
                .await
                .ok_or_else(|| not_found(instance_id, user_id));
        }
        self.store
            .rank_of(instance_id, user_id)
            .await?
            .ok_or_else(|| not_found(instance_id, user_id))
    }

    pub async fn around(
        &self,
        instance_id: &str,
        user_id: &str,
        radius: i64,
    ) -> Result<Vec<LeaderboardEntry>> {
        if self.index_ready(instance_id, "around").await {
            return self
                .index
                .around(instance_id, user_id, radius as usize)
                .await
                .ok_or_else(|| not_found(instance_id, user_id));
        }
        self.store
            .around(instance_id, user_id, radius)
            .await?
            .ok_or_else(|| not_found(instance_id, user_id))
    }
}

fn not_found(instance_id: &str, user_id: &str) -> AppError {
    AppError::NotFound(format!(
        "user '{}' has no score in leaderboard '{}'",
        user_id, instance_id
    ))
}

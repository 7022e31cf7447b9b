use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use marquee_model::{MediaKey, MediaType, RelationKind, StoreOrder};
use tracing::info;

use crate::clock::Clock;
use crate::database::LocalStore;
use crate::error::Result;

/// Outcome of an eviction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub media_deleted: usize,
    pub details_deleted: usize,
    /// Rows that qualified for deletion but were kept because a relation
    /// references them.
    pub protected: usize,
}

impl SweepReport {
    pub fn total_deleted(&self) -> usize {
        self.media_deleted + self.details_deleted
    }
}

/// Evicts cached media. Relation rows themselves are never touched.
#[derive(Clone, Debug)]
pub struct CacheJanitor {
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn Clock>,
    retention: TimeDelta,
}

impl CacheJanitor {
    pub fn new(
        store: Arc<dyn LocalStore>,
        clock: Arc<dyn Clock>,
        retention: TimeDelta,
    ) -> Self {
        Self {
            store,
            clock,
            retention,
        }
    }

    fn expired(&self, stamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - stamp > self.retention
    }

    /// Delete summaries and details older than the retention window, keeping
    /// anything a favorite or watched row points at.
    pub async fn sweep_expired(&self) -> Result<SweepReport> {
        let mut protected: HashSet<MediaKey> = HashSet::new();
        for kind in RelationKind::ALL {
            protected.extend(self.store.relation_keys(kind).await?);
        }

        let now = self.clock.now();
        let mut report = SweepReport::default();

        for media_type in MediaType::ALL {
            for item in self.store.all_media(media_type, StoreOrder::Title).await? {
                if !self.expired(item.cached_at, now) {
                    continue;
                }
                if protected.contains(&item.key()) {
                    report.protected += 1;
                } else if self.store.delete_media(item.key()).await? {
                    report.media_deleted += 1;
                }
            }

            for stamp in self.store.detail_stamps(media_type).await? {
                if !self.expired(stamp.last_updated, now) {
                    continue;
                }
                if protected.contains(&stamp.key) {
                    report.protected += 1;
                } else if self.store.delete_detail(stamp.key).await? {
                    report.details_deleted += 1;
                }
            }
        }

        info!(
            "Expired cache sweep removed {} summaries and {} details ({} protected)",
            report.media_deleted, report.details_deleted, report.protected
        );
        Ok(report)
    }

    /// Drop every cached summary and detail that no user has favorited.
    /// Watched rows do not protect their media here.
    pub async fn purge_except_favorites(&self) -> Result<SweepReport> {
        let protected = self.store.relation_keys(RelationKind::Favorite).await?;
        let mut report = SweepReport::default();

        for media_type in MediaType::ALL {
            for item in self.store.all_media(media_type, StoreOrder::Title).await? {
                if protected.contains(&item.key()) {
                    report.protected += 1;
                } else if self.store.delete_media(item.key()).await? {
                    report.media_deleted += 1;
                }
            }

            for stamp in self.store.detail_stamps(media_type).await? {
                if protected.contains(&stamp.key) {
                    report.protected += 1;
                } else if self.store.delete_detail(stamp.key).await? {
                    report.details_deleted += 1;
                }
            }
        }

        info!(
            "Startup purge removed {} summaries and {} details, kept {} favorites",
            report.media_deleted, report.details_deleted, report.protected
        );
        Ok(report)
    }
}

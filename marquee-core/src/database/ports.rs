use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_model::{
    EpisodeKey, MediaDetail, MediaItem, MediaKey, MediaType, RelationKind,
    RelationRecord, StoreOrder, UserId, UserRecord,
};
use tokio::sync::broadcast;

use crate::error::Result;

/// Notification published after every successful write. Subscriptions use it
/// to decide whether to re-run their query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Media(MediaType),
    Detail(MediaKey),
    Relation { kind: RelationKind, user_id: UserId },
    EpisodeWatch { user_id: UserId, series_id: i64 },
    Users,
}

/// Key and freshness stamp of a cached detail, as returned by full scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailStamp {
    pub key: MediaKey,
    pub last_updated: DateTime<Utc>,
}

/// Persistent cache of summaries, details, relations and users.
///
/// Implementations are shared behind an `Arc` by every component; concurrent
/// upserts to the same key resolve as last-write-wins.
#[async_trait]
pub trait LocalStore: Send + Sync + std::fmt::Debug {
    /// Insert or replace summaries by (id, media_type).
    async fn upsert_media(&self, items: &[MediaItem]) -> Result<()>;

    /// Insert `item` only if no row exists for its key. Returns whether a row
    /// was written.
    async fn insert_media_if_absent(&self, item: &MediaItem) -> Result<bool>;

    async fn get_media(&self, key: MediaKey) -> Result<Option<MediaItem>>;

    /// Bulk lookup. The result order is unspecified; callers that care must
    /// re-sort by their own id order.
    async fn get_media_by_ids(
        &self,
        media_type: MediaType,
        ids: &[i64],
    ) -> Result<Vec<MediaItem>>;

    /// Full scan of one media type.
    async fn all_media(
        &self,
        media_type: MediaType,
        order: StoreOrder,
    ) -> Result<Vec<MediaItem>>;

    /// Case-insensitive substring match over title and overview.
    async fn search_media(
        &self,
        media_type: MediaType,
        needle: &str,
    ) -> Result<Vec<MediaItem>>;

    async fn delete_media(&self, key: MediaKey) -> Result<bool>;

    async fn upsert_detail(&self, detail: &MediaDetail) -> Result<()>;

    async fn get_detail(&self, key: MediaKey) -> Result<Option<MediaDetail>>;

    async fn detail_stamps(
        &self,
        media_type: MediaType,
    ) -> Result<Vec<DetailStamp>>;

    async fn delete_detail(&self, key: MediaKey) -> Result<bool>;

    /// Idempotent insert keyed by the full triple. An existing row keeps its
    /// original `added_at`; the return value tells whether a row was written.
    async fn insert_relation(
        &self,
        kind: RelationKind,
        record: RelationRecord,
        added_at: DateTime<Utc>,
    ) -> Result<bool>;

    async fn delete_relation(
        &self,
        kind: RelationKind,
        record: RelationRecord,
    ) -> Result<bool>;

    async fn relation_exists(
        &self,
        kind: RelationKind,
        record: RelationRecord,
    ) -> Result<bool>;

    /// Member ids in insertion order.
    async fn relation_ids(
        &self,
        kind: RelationKind,
        user_id: UserId,
        media_type: MediaType,
    ) -> Result<Vec<i64>>;

    /// Every key referenced by `kind`, across all users.
    async fn relation_keys(
        &self,
        kind: RelationKind,
    ) -> Result<HashSet<MediaKey>>;

    /// Fails with [`SyncError::UserExists`] when the username is taken.
    ///
    /// [`SyncError::UserExists`]: crate::error::SyncError::UserExists
    async fn insert_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord>;

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>>;

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>>;

    async fn set_episode_watched(
        &self,
        user_id: UserId,
        key: EpisodeKey,
        watched: bool,
        at: DateTime<Utc>,
    ) -> Result<()>;

    async fn watched_episodes(
        &self,
        user_id: UserId,
        series_id: i64,
    ) -> Result<HashSet<EpisodeKey>>;

    /// Receiver for write notifications issued after this call.
    fn changes(&self) -> broadcast::Receiver<StoreChange>;

    /// Release the underlying connections. Further calls fail.
    async fn close(&self);
}

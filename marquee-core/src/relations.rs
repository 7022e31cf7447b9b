//! Per-user media relations (favorites, watched).
//!
//! Every operation accepts an optional user. Guests get no-op writes, `false`
//! membership and empty lists; they never see an error.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use marquee_model::{
    MediaItem, MediaKey, MediaType, RelationKind, RelationRecord,
    RelationWrite, UserId,
};
use tracing::debug;

use crate::clock::Clock;
use crate::database::{LocalStore, StoreChange, Subscription, observe};
use crate::error::Result;

#[derive(Clone, Debug)]
pub struct RelationRepository {
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn Clock>,
    kind: RelationKind,
}

impl RelationRepository {
    pub fn new(
        store: Arc<dyn LocalStore>,
        clock: Arc<dyn Clock>,
        kind: RelationKind,
    ) -> Self {
        Self { store, clock, kind }
    }

    pub fn favorites(store: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self {
        Self::new(store, clock, RelationKind::Favorite)
    }

    pub fn watched(store: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self {
        Self::new(store, clock, RelationKind::Watched)
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Add `key` for `user`. A placeholder summary is written first when the
    /// media has never been cached, so member lists can resolve it.
    pub async fn add(
        &self,
        user: Option<UserId>,
        key: MediaKey,
    ) -> Result<RelationWrite> {
        let Some(user_id) = user else {
            return Ok(RelationWrite::Ignored);
        };
        let now = self.clock.now();
        self.store
            .insert_media_if_absent(&MediaItem::stub(key, now))
            .await?;
        self.insert(user_id, key).await
    }

    /// Like [`add`](Self::add) but seeds the summary with `item` when none is
    /// cached yet.
    pub async fn add_with(
        &self,
        user: Option<UserId>,
        item: &MediaItem,
    ) -> Result<RelationWrite> {
        let Some(user_id) = user else {
            return Ok(RelationWrite::Ignored);
        };
        self.store.insert_media_if_absent(item).await?;
        self.insert(user_id, item.key()).await
    }

    async fn insert(
        &self,
        user_id: UserId,
        key: MediaKey,
    ) -> Result<RelationWrite> {
        let record = RelationRecord::new(user_id, key);
        let inserted = self
            .store
            .insert_relation(self.kind, record, self.clock.now())
            .await?;
        if !inserted {
            debug!("{} {} already present for user {}", self.kind, key, user_id);
        }
        Ok(RelationWrite::Applied)
    }

    pub async fn remove(
        &self,
        user: Option<UserId>,
        key: MediaKey,
    ) -> Result<RelationWrite> {
        let Some(user_id) = user else {
            return Ok(RelationWrite::Ignored);
        };
        self.store
            .delete_relation(self.kind, RelationRecord::new(user_id, key))
            .await?;
        Ok(RelationWrite::Applied)
    }

    /// Flip membership. Returns the new state.
    pub async fn toggle(
        &self,
        user: Option<UserId>,
        key: MediaKey,
    ) -> Result<bool> {
        if user.is_none() {
            return Ok(false);
        }
        if self.contains(user, key).await? {
            self.remove(user, key).await?;
            Ok(false)
        } else {
            self.add(user, key).await?;
            Ok(true)
        }
    }

    pub async fn contains(
        &self,
        user: Option<UserId>,
        key: MediaKey,
    ) -> Result<bool> {
        let Some(user_id) = user else {
            return Ok(false);
        };
        self.store
            .relation_exists(self.kind, RelationRecord::new(user_id, key))
            .await
    }

    /// Live membership flag.
    pub fn is_member(
        &self,
        user: Option<UserId>,
        key: MediaKey,
    ) -> Subscription<bool> {
        let Some(user_id) = user else {
            return futures::stream::once(async { Ok(false) }).boxed();
        };
        let kind = self.kind;
        let record = RelationRecord::new(user_id, key);
        observe(
            Arc::clone(&self.store),
            move |change| {
                matches!(change, StoreChange::Relation { kind: k, user_id: u }
                    if *k == kind && *u == user_id)
            },
            move |store| async move { store.relation_exists(kind, record).await },
        )
    }

    /// One-shot read of the member summaries in insertion order.
    pub async fn members(
        &self,
        user: Option<UserId>,
        media_type: MediaType,
    ) -> Result<Vec<MediaItem>> {
        let Some(user_id) = user else {
            return Ok(Vec::new());
        };
        member_items(self.store.as_ref(), self.kind, user_id, media_type).await
    }

    /// Live member list in insertion order. Re-emits on relation changes and
    /// on summary refreshes of the same media type.
    pub fn list_members(
        &self,
        user: Option<UserId>,
        media_type: MediaType,
    ) -> Subscription<Vec<MediaItem>> {
        let Some(user_id) = user else {
            return futures::stream::once(async { Ok(Vec::new()) }).boxed();
        };
        let kind = self.kind;
        observe(
            Arc::clone(&self.store),
            move |change| match change {
                StoreChange::Relation { kind: k, user_id: u } => {
                    *k == kind && *u == user_id
                }
                StoreChange::Media(t) => *t == media_type,
                _ => false,
            },
            move |store| async move {
                member_items(store.as_ref(), kind, user_id, media_type).await
            },
        )
    }
}

/// Join relation ids against cached summaries, restoring relation order.
/// Ids whose summary has been evicted are skipped.
pub(crate) async fn member_items(
    store: &dyn LocalStore,
    kind: RelationKind,
    user_id: UserId,
    media_type: MediaType,
) -> Result<Vec<MediaItem>> {
    let ids = store.relation_ids(kind, user_id, media_type).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_id: HashMap<i64, MediaItem> = store
        .get_media_by_ids(media_type, &ids)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let items: Vec<MediaItem> =
        ids.iter().filter_map(|id| by_id.remove(id)).collect();
    if items.len() < ids.len() {
        debug!(
            "{} of {} {} members have no cached summary",
            ids.len() - items.len(),
            ids.len(),
            kind
        );
    }
    Ok(items)
}

//! Cache-first reads with stale-while-revalidate refreshes.
//!
//! Every read returns a stream of at most two values: whatever the local
//! store already has, then the refreshed value (or an error when there was
//! nothing cached to fall back on). The network round trip and the write
//! back into the store run on a spawned task, so dropping the stream early
//! never loses a fetched result.

use std::sync::Arc;

use chrono::TimeDelta;
use futures::stream::BoxStream;
use marquee_model::{
    Fetched, GenreFilter, ListRequest, MediaDetail, MediaItem, MediaKey,
    MediaType, RemoteFeed, StoreOrder, UserId,
};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::database::LocalStore;
use crate::error::{Result, SyncError};
use crate::network::NetworkMonitor;
use crate::providers::RemoteSource;
use crate::relations::member_items;

/// Stream returned by every read on [`SyncRepository`].
pub type ReadStream<T> = BoxStream<'static, Result<Fetched<T>>>;

#[derive(Clone, Debug)]
pub struct SyncRepository {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteSource>,
    network: NetworkMonitor,
    clock: Arc<dyn Clock>,
    retention: TimeDelta,
}

impl SyncRepository {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteSource>,
        network: NetworkMonitor,
        clock: Arc<dyn Clock>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            store,
            remote,
            network,
            clock,
            retention: config.retention(),
        }
    }

    pub fn network(&self) -> &NetworkMonitor {
        &self.network
    }

    /// Cached list first, then the upstream page named by `request`.
    ///
    /// The favorites and watched views are served from the local relation
    /// tables only and emit once.
    pub fn list_by_category(
        &self,
        request: ListRequest,
    ) -> ReadStream<Vec<MediaItem>> {
        let this = self.clone();
        Box::pin(async_stream::stream! {
            let Some(feed) = request.sort.feed() else {
                yield this.relation_view(&request).await.map(Fetched::fresh);
                return;
            };

            let media_type = request.media_type;
            let cached = this
                .cached_list(media_type, request.sort.store_order(), &request.genres)
                .await;
            let had_cache = !cached.is_empty();
            if had_cache {
                yield Ok(Fetched::cached(cached));
            }

            if !this.network.is_online() {
                debug!("Offline; serving cached {} list only", media_type);
                if !had_cache {
                    yield Err(SyncError::NoDataOffline);
                }
                return;
            }

            let page = request.page.unwrap_or(1).max(1);
            match this.refresh_list(media_type, feed, page).await {
                Ok(items) => yield Ok(Fetched::fresh(request.genres.apply(items))),
                Err(err) if had_cache => {
                    warn!("Refreshing {} list failed, keeping cache: {}", media_type, err);
                }
                Err(err) => yield Err(err),
            }
        })
    }

    /// Cached matches first, then upstream search results. A blank query
    /// yields a single empty result without touching either side.
    pub fn search(
        &self,
        media_type: MediaType,
        query: &str,
    ) -> ReadStream<Vec<MediaItem>> {
        let this = self.clone();
        let query = query.trim().to_string();
        Box::pin(async_stream::stream! {
            if query.is_empty() {
                yield Ok(Fetched::fresh(Vec::new()));
                return;
            }

            let cached = match this.store.search_media(media_type, &query).await {
                Ok(items) => items,
                Err(err) => {
                    warn!("Local search failed: {}", err);
                    Vec::new()
                }
            };
            let had_cache = !cached.is_empty();
            if had_cache {
                yield Ok(Fetched::cached(cached));
            }

            if !this.network.is_online() {
                if !had_cache {
                    yield Err(SyncError::NoDataOffline);
                }
                return;
            }

            match this.refresh_search(media_type, query.clone()).await {
                Ok(items) => yield Ok(Fetched::fresh(items)),
                Err(err) if had_cache => {
                    warn!("Search for {:?} failed, keeping cache: {}", query, err);
                }
                Err(err) => yield Err(err),
            }
        })
    }

    /// Detail read gated by the retention window.
    ///
    /// A fresh cached detail is served without a network call. A stale one is
    /// served immediately and refreshed behind it; on failure the stale value
    /// stands. With `user` set, series episodes carry their watched flags.
    pub fn detail_by_id(
        &self,
        key: MediaKey,
        user: Option<UserId>,
    ) -> ReadStream<MediaDetail> {
        let this = self.clone();
        Box::pin(async_stream::stream! {
            let cached = match this.store.get_detail(key).await {
                Ok(detail) => detail,
                Err(err) => {
                    warn!("Reading cached detail {} failed: {}", key, err);
                    None
                }
            };
            let now = this.clock.now();

            match cached {
                Some(detail) if !detail.is_stale(now, this.retention) => {
                    yield Ok(Fetched::cached(this.with_watch_view(detail, user).await));
                }
                Some(detail) => {
                    yield Ok(Fetched::stale(this.with_watch_view(detail, user).await));
                    if this.network.is_online() {
                        match this.refresh_detail(key).await {
                            Ok(fresh) => {
                                yield Ok(Fetched::fresh(this.with_watch_view(fresh, user).await));
                            }
                            Err(err) => {
                                warn!("Refreshing stale detail {} failed: {}", key, err);
                            }
                        }
                    }
                }
                None if !this.network.is_online() => {
                    yield Err(SyncError::NoDataOffline);
                }
                None => match this.refresh_detail(key).await {
                    Ok(fresh) => {
                        yield Ok(Fetched::fresh(this.with_watch_view(fresh, user).await));
                    }
                    Err(err) => yield Err(err),
                },
            }
        })
    }

    async fn cached_list(
        &self,
        media_type: MediaType,
        order: StoreOrder,
        genres: &GenreFilter,
    ) -> Vec<MediaItem> {
        match self.store.all_media(media_type, order).await {
            // Placeholders written ahead of relation rows are not list entries.
            Ok(items) => genres.apply(
                items.into_iter().filter(|item| !item.is_stub()).collect(),
            ),
            Err(err) => {
                warn!("Reading cached {} list failed: {}", media_type, err);
                Vec::new()
            }
        }
    }

    async fn relation_view(&self, request: &ListRequest) -> Result<Vec<MediaItem>> {
        let (Some(kind), Some(user_id)) = (request.sort.relation_kind(), request.user)
        else {
            return Ok(Vec::new());
        };
        let items =
            member_items(self.store.as_ref(), kind, user_id, request.media_type)
                .await?;
        Ok(request.genres.apply(items))
    }

    async fn with_watch_view(
        &self,
        mut detail: MediaDetail,
        user: Option<UserId>,
    ) -> MediaDetail {
        let Some(user_id) = user else {
            return detail;
        };
        if detail.media_type() != MediaType::Series {
            return detail;
        }
        match self.store.watched_episodes(user_id, detail.base.id).await {
            Ok(watched) => {
                detail.apply_episode_watch_view(|key| watched.contains(key))
            }
            Err(err) => warn!("Reading episode watches failed: {}", err),
        }
        detail
    }

    async fn refresh_list(
        &self,
        media_type: MediaType,
        feed: RemoteFeed,
        page: u32,
    ) -> Result<Vec<MediaItem>> {
        let store = Arc::clone(&self.store);
        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            let items = remote.list(media_type, feed, page).await?;
            write_back(store.as_ref(), &items).await;
            Ok::<_, SyncError>(items)
        })
        .await?
    }

    async fn refresh_search(
        &self,
        media_type: MediaType,
        query: String,
    ) -> Result<Vec<MediaItem>> {
        let store = Arc::clone(&self.store);
        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            let items = remote.search(media_type, &query, 1).await?;
            write_back(store.as_ref(), &items).await;
            Ok::<_, SyncError>(items)
        })
        .await?
    }

    async fn refresh_detail(&self, key: MediaKey) -> Result<MediaDetail> {
        let store = Arc::clone(&self.store);
        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            let detail = remote.detail(key).await?;
            if let Err(err) = store.upsert_detail(&detail).await {
                warn!("Caching detail {} failed: {}", key, err);
            }
            write_back(store.as_ref(), &[detail.to_summary()]).await;
            Ok::<_, SyncError>(detail)
        })
        .await?
    }
}

/// Upsert fetched summaries. The fetched value stays authoritative even if
/// the write fails.
async fn write_back(store: &dyn LocalStore, items: &[MediaItem]) {
    if let Err(err) = store.upsert_media(items).await {
        warn!("Caching {} fetched items failed: {}", items.len(), err);
    }
}

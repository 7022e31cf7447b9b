//! Cache-first read policy of the sync repository.

mod support;

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use futures::StreamExt;
use marquee_core::{
    Clock, EpisodeWatchLog, LocalStore, ManualClock, NetworkMonitor,
    RelationRepository, SyncConfig, SyncError, SyncRepository,
};
use marquee_model::{
    EpisodeKey, Fetched, Freshness, GenreFilter, ListRequest, MediaDetail,
    MediaItem, MediaKey, MediaType, RemoteFeed, SortKey, UserId,
};
use support::{
    FakeRemote, clock, epoch, init_tracing, item, memory_store, movie,
    movie_detail, series_detail,
};

struct Harness {
    repo: SyncRepository,
    store: Arc<dyn LocalStore>,
    remote: Arc<FakeRemote>,
    network: NetworkMonitor,
    clock: ManualClock,
}

async fn harness(online: bool) -> Harness {
    init_tracing();
    let store = memory_store().await;
    let remote = FakeRemote::new();
    let network = NetworkMonitor::new(online);
    let clock = clock();
    let repo = SyncRepository::new(
        store.clone(),
        remote.clone(),
        network.clone(),
        Arc::new(clock.clone()),
        &SyncConfig::default(),
    );
    Harness {
        repo,
        store,
        remote,
        network,
        clock,
    }
}

fn popular_movies() -> ListRequest {
    ListRequest::new(MediaType::Movie, SortKey::Popular)
}

async fn collect_list(
    repo: &SyncRepository,
    request: ListRequest,
) -> Vec<Result<Fetched<Vec<MediaItem>>, SyncError>> {
    repo.list_by_category(request).collect().await
}

async fn collect_detail(
    repo: &SyncRepository,
    key: MediaKey,
    user: Option<UserId>,
) -> Vec<Result<Fetched<MediaDetail>, SyncError>> {
    repo.detail_by_id(key, user).collect().await
}

fn titles(items: &[MediaItem]) -> Vec<&str> {
    items.iter().map(|item| item.title.as_str()).collect()
}

#[tokio::test]
async fn list_emits_cache_then_network() {
    let h = harness(true).await;
    h.store.upsert_media(&[movie(1, "Cached")]).await.unwrap();
    h.remote.set_list(
        MediaType::Movie,
        RemoteFeed::Popular,
        1,
        vec![movie(2, "Fetched"), movie(3, "Also fetched")],
    );

    let emitted = collect_list(&h.repo, popular_movies()).await;

    assert_eq!(emitted.len(), 2);
    let cached = emitted[0].as_ref().unwrap();
    assert_eq!(cached.freshness, Freshness::Cached);
    assert_eq!(titles(&cached.value), vec!["Cached"]);
    let fresh = emitted[1].as_ref().unwrap();
    assert_eq!(fresh.freshness, Freshness::Fresh);
    assert_eq!(titles(&fresh.value), vec!["Fetched", "Also fetched"]);

    // Fetched rows were written back.
    assert!(h.store.get_media(MediaKey::movie(3)).await.unwrap().is_some());
}

#[tokio::test]
async fn empty_cache_online_emits_only_network() {
    let h = harness(true).await;
    h.remote
        .set_list(MediaType::Movie, RemoteFeed::Popular, 1, vec![movie(2, "Fetched")]);

    let emitted = collect_list(&h.repo, popular_movies()).await;

    assert_eq!(emitted.len(), 1);
    assert!(emitted[0].as_ref().unwrap().is_fresh());
}

#[tokio::test]
async fn offline_serves_cache_without_calling_remote() {
    let h = harness(false).await;
    h.store.upsert_media(&[movie(1, "Cached")]).await.unwrap();

    let emitted = collect_list(&h.repo, popular_movies()).await;

    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].as_ref().unwrap().freshness, Freshness::Cached);
    assert_eq!(h.remote.calls(), 0);
}

#[tokio::test]
async fn offline_with_empty_cache_reports_no_data() {
    let h = harness(false).await;

    let emitted = collect_list(&h.repo, popular_movies()).await;

    assert_eq!(emitted.len(), 1);
    assert!(matches!(emitted[0], Err(SyncError::NoDataOffline)));
    assert_eq!(h.remote.calls(), 0);
}

#[tokio::test]
async fn going_offline_is_seen_by_the_next_read() {
    let h = harness(true).await;
    h.store.upsert_media(&[movie(1, "Cached")]).await.unwrap();

    h.network.report(false);
    let emitted = collect_list(&h.repo, popular_movies()).await;

    assert_eq!(emitted.len(), 1);
    assert_eq!(h.remote.calls(), 0);
}

#[tokio::test]
async fn remote_failure_keeps_the_cached_emission() {
    let h = harness(true).await;
    h.store.upsert_media(&[movie(1, "Cached")]).await.unwrap();
    h.remote.set_failing(true);

    let emitted = collect_list(&h.repo, popular_movies()).await;

    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].as_ref().unwrap().freshness, Freshness::Cached);
    assert_eq!(h.remote.calls(), 1);
}

#[tokio::test]
async fn cached_list_honours_genres_and_rating_order() {
    let h = harness(false).await;
    h.store
        .upsert_media(&[
            item(1, MediaType::Movie, "Low drama", 5.0, &[18]),
            item(2, MediaType::Movie, "High drama", 9.0, &[18]),
            item(3, MediaType::Movie, "Comedy", 8.0, &[35]),
        ])
        .await
        .unwrap();

    let request = popular_movies().with_genres(GenreFilter::of([18]));
    let emitted = collect_list(&h.repo, request).await;

    let cached = emitted[0].as_ref().unwrap();
    assert_eq!(titles(&cached.value), vec!["High drama", "Low drama"]);
}

#[tokio::test]
async fn favorites_view_is_local_and_insertion_ordered() {
    let h = harness(true).await;
    let favorites =
        RelationRepository::favorites(h.store.clone(), Arc::new(h.clock.clone()));
    let ada = Some(UserId(1));
    h.store
        .upsert_media(&[movie(1, "Alien"), movie(2, "Brazil")])
        .await
        .unwrap();
    favorites.add(ada, MediaKey::movie(2)).await.unwrap();
    h.clock.advance(TimeDelta::seconds(1));
    favorites.add(ada, MediaKey::movie(1)).await.unwrap();

    let request =
        ListRequest::new(MediaType::Movie, SortKey::Favorites).with_user(ada);
    let emitted = collect_list(&h.repo, request).await;

    assert_eq!(emitted.len(), 1);
    let view = emitted[0].as_ref().unwrap();
    assert_eq!(view.freshness, Freshness::Fresh);
    assert_eq!(titles(&view.value), vec!["Brazil", "Alien"]);
    assert_eq!(h.remote.calls(), 0);
}

#[tokio::test]
async fn guest_relation_view_is_empty() {
    let h = harness(true).await;

    let request = ListRequest::new(MediaType::Series, SortKey::Watched);
    let emitted = collect_list(&h.repo, request).await;

    assert_eq!(emitted.len(), 1);
    assert!(emitted[0].as_ref().unwrap().value.is_empty());
}

#[tokio::test]
async fn blank_search_is_a_single_empty_result() {
    let h = harness(true).await;

    let emitted: Vec<_> = h.repo.search(MediaType::Movie, "   ").collect().await;

    assert_eq!(emitted.len(), 1);
    assert!(emitted[0].as_ref().unwrap().value.is_empty());
    assert_eq!(h.remote.calls(), 0);
}

#[tokio::test]
async fn search_matches_cache_then_network() {
    let h = harness(true).await;
    h.store.upsert_media(&[movie(1, "Heat")]).await.unwrap();
    h.remote.set_search(
        MediaType::Movie,
        "heat",
        vec![movie(1, "Heat"), movie(2, "The Heat")],
    );

    let emitted: Vec<_> = h.repo.search(MediaType::Movie, " heat ").collect().await;

    assert_eq!(emitted.len(), 2);
    assert_eq!(titles(&emitted[0].as_ref().unwrap().value), vec!["Heat"]);
    assert_eq!(
        titles(&emitted[1].as_ref().unwrap().value),
        vec!["Heat", "The Heat"]
    );
}

#[tokio::test]
async fn search_failure_without_cache_surfaces() {
    let h = harness(true).await;
    h.remote.set_failing(true);

    let emitted: Vec<_> = h.repo.search(MediaType::Series, "lost").collect().await;

    assert_eq!(emitted.len(), 1);
    assert!(matches!(emitted[0], Err(SyncError::Remote { .. })));
}

#[tokio::test]
async fn fresh_detail_skips_the_network() {
    let h = harness(true).await;
    h.store
        .upsert_detail(&movie_detail(10, "Dune", epoch() - TimeDelta::hours(1)))
        .await
        .unwrap();

    let emitted = collect_detail(&h.repo, MediaKey::movie(10), None).await;

    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].as_ref().unwrap().freshness, Freshness::Cached);
    assert_eq!(h.remote.calls(), 0);
}

#[tokio::test]
async fn stale_detail_is_served_then_refreshed() {
    let h = harness(true).await;
    h.store
        .upsert_detail(&movie_detail(10, "Dune", epoch() - TimeDelta::days(2)))
        .await
        .unwrap();
    h.remote.set_detail(movie_detail(10, "Dune: Part One", epoch()));

    let emitted = collect_detail(&h.repo, MediaKey::movie(10), None).await;

    assert_eq!(emitted.len(), 2);
    let stale = emitted[0].as_ref().unwrap();
    assert_eq!(stale.freshness, Freshness::Stale);
    assert_eq!(stale.value.base.title, "Dune");
    let fresh = emitted[1].as_ref().unwrap();
    assert_eq!(fresh.freshness, Freshness::Fresh);
    assert_eq!(fresh.value.base.title, "Dune: Part One");

    let cached = h.store.get_detail(MediaKey::movie(10)).await.unwrap().unwrap();
    assert_eq!(cached.base.title, "Dune: Part One");
    let summary = h.store.get_media(MediaKey::movie(10)).await.unwrap().unwrap();
    assert_eq!(summary.title, "Dune: Part One");
}

#[tokio::test]
async fn stale_detail_stands_when_refresh_fails() {
    let h = harness(true).await;
    h.store
        .upsert_detail(&movie_detail(10, "Dune", epoch() - TimeDelta::days(2)))
        .await
        .unwrap();
    h.remote.set_failing(true);

    let emitted = collect_detail(&h.repo, MediaKey::movie(10), None).await;

    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].as_ref().unwrap().freshness, Freshness::Stale);
    assert_eq!(h.remote.calls(), 1);
}

#[tokio::test]
async fn stale_detail_offline_is_not_refreshed() {
    let h = harness(false).await;
    h.store
        .upsert_detail(&movie_detail(10, "Dune", epoch() - TimeDelta::days(2)))
        .await
        .unwrap();

    let emitted = collect_detail(&h.repo, MediaKey::movie(10), None).await;

    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].as_ref().unwrap().freshness, Freshness::Stale);
    assert_eq!(h.remote.calls(), 0);
}

#[tokio::test]
async fn missing_detail_offline_reports_no_data() {
    let h = harness(false).await;

    let emitted = collect_detail(&h.repo, MediaKey::series(20), None).await;

    assert_eq!(emitted.len(), 1);
    assert!(matches!(emitted[0], Err(SyncError::NoDataOffline)));
}

#[tokio::test]
async fn missing_detail_online_is_fetched_and_cached() {
    let h = harness(true).await;
    h.remote.set_detail(series_detail(20, "Severance", epoch()));

    let emitted = collect_detail(&h.repo, MediaKey::series(20), None).await;

    assert_eq!(emitted.len(), 1);
    assert!(emitted[0].as_ref().unwrap().is_fresh());
    assert!(h.store.get_detail(MediaKey::series(20)).await.unwrap().is_some());
    assert!(h.store.get_media(MediaKey::series(20)).await.unwrap().is_some());
}

#[tokio::test]
async fn series_detail_carries_the_users_watch_flags() {
    let h = harness(false).await;
    let log = EpisodeWatchLog::new(
        h.store.clone(),
        Arc::new(h.clock.clone()) as Arc<dyn Clock>,
    );
    let ada = Some(UserId(1));
    h.store
        .upsert_detail(&series_detail(20, "Severance", epoch()))
        .await
        .unwrap();
    log.mark(ada, EpisodeKey::new(20, 1, 2), true).await.unwrap();

    let for_ada = collect_detail(&h.repo, MediaKey::series(20), ada).await;
    let flags: Vec<bool> = for_ada[0].as_ref().unwrap().value.seasons()[0]
        .episodes
        .iter()
        .map(|episode| episode.watched)
        .collect();
    assert_eq!(flags, vec![false, true, false]);

    let for_guest = collect_detail(&h.repo, MediaKey::series(20), None).await;
    let seasons = for_guest[0].as_ref().unwrap().value.seasons().to_vec();
    assert!(seasons[0].episodes.iter().all(|episode| !episode.watched));
}

#[tokio::test]
async fn write_back_survives_a_dropped_stream() {
    let h = harness(true).await;
    h.remote.set_delay(Duration::from_millis(100));
    h.remote.set_list(
        MediaType::Movie,
        RemoteFeed::Popular,
        1,
        vec![movie(7, "Slow")],
    );

    let mut stream = h.repo.list_by_category(popular_movies());
    let early = tokio::time::timeout(Duration::from_millis(10), stream.next()).await;
    assert!(early.is_err());
    drop(stream);

    let key = MediaKey::movie(7);
    let mut written = false;
    for _ in 0..50 {
        if h.store.get_media(key).await.unwrap().is_some() {
            written = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(written, "fetched page was not written back");
}

#[tokio::test]
async fn cached_lists_skip_favorite_placeholders() {
    let h = harness(false).await;
    let favorites =
        RelationRepository::favorites(h.store.clone(), Arc::new(h.clock.clone()));
    let ada = Some(UserId(7));
    h.store.upsert_media(&[movie(1, "Heat")]).await.unwrap();
    favorites.add(ada, MediaKey::movie(999)).await.unwrap();

    let emitted = collect_list(&h.repo, popular_movies()).await;

    assert_eq!(emitted.len(), 1);
    let cached = emitted[0].as_ref().unwrap();
    let ids: Vec<i64> = cached.value.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![1]);

    // The relation view still resolves the placeholder.
    let request =
        ListRequest::new(MediaType::Movie, SortKey::Favorites).with_user(ada);
    let view = collect_list(&h.repo, request).await;
    let ids: Vec<i64> = view[0].as_ref().unwrap().value.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![999]);
}

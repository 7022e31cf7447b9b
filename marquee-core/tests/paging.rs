//! Page loading, cursor math and refresh anchoring.

mod support;

use std::sync::Arc;

use marquee_core::{
    LoadResult, PageProvider, PageQuery, PageSummary, PagingState, SyncConfig,
    SyncError,
};
use marquee_model::{
    GenreFilter, MediaKey, MediaType, RemoteFeed, SortKey, StoreOrder,
};
use support::{FakeRemote, item, memory_store, movie};

fn movies(range: std::ops::RangeInclusive<i64>) -> Vec<marquee_model::MediaItem> {
    range.map(|id| movie(id, &format!("Movie {id}"))).collect()
}

async fn provider(remote: Arc<FakeRemote>, query: PageQuery) -> PageProvider {
    PageProvider::new(memory_store().await, remote, query, &SyncConfig::default())
}

#[tokio::test]
async fn cursors_follow_page_numbers() {
    let remote = FakeRemote::new();
    remote.set_list(MediaType::Movie, RemoteFeed::Popular, 1, movies(1..=20));
    remote.set_list(MediaType::Movie, RemoteFeed::Popular, 2, movies(21..=40));
    let pager =
        provider(remote.clone(), PageQuery::new(MediaType::Movie, SortKey::Popular)).await;

    let first = pager.load(None).await.into_result().unwrap();
    assert_eq!(first.cursor, 1);
    assert_eq!(first.prev_cursor, None);
    assert_eq!(first.next_cursor, Some(2));
    assert_eq!(first.items.len(), 20);

    let second = pager.load(first.next_cursor).await.into_result().unwrap();
    assert_eq!(second.prev_cursor, Some(1));
    assert_eq!(second.next_cursor, Some(3));

    let third = pager.load(second.next_cursor).await.into_result().unwrap();
    assert!(third.items.is_empty());
    assert!(third.is_last());
    assert_eq!(remote.calls(), 3);
}

#[tokio::test]
async fn last_representable_cursor_has_no_successor() {
    let remote = FakeRemote::new();
    remote.set_list(MediaType::Movie, RemoteFeed::Popular, u32::MAX, movies(1..=2));
    let pager =
        provider(remote, PageQuery::new(MediaType::Movie, SortKey::Popular)).await;

    let page = pager.load(Some(u32::MAX)).await.into_result().unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.prev_cursor, Some(u32::MAX - 1));
    assert_eq!(page.next_cursor, None);
}

#[tokio::test]
async fn genre_filter_can_empty_a_page_without_ending_it() {
    let remote = FakeRemote::new();
    remote.set_list(
        MediaType::Movie,
        RemoteFeed::Discover,
        1,
        vec![
            item(1, MediaType::Movie, "Comedy", 6.0, &[35]),
            item(2, MediaType::Movie, "Drama", 7.0, &[18]),
        ],
    );
    let query = PageQuery::new(MediaType::Movie, SortKey::Discover)
        .with_genres(GenreFilter::of([27]));
    let pager = provider(remote, query).await;

    let page = pager.load(None).await.into_result().unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.next_cursor, Some(2));
}

#[tokio::test]
async fn genre_filter_keeps_any_match() {
    let remote = FakeRemote::new();
    remote.set_list(
        MediaType::Series,
        RemoteFeed::TopRated,
        1,
        vec![
            item(1, MediaType::Series, "Both", 8.0, &[18, 80]),
            item(2, MediaType::Series, "Crime", 8.5, &[80]),
            item(3, MediaType::Series, "Kids", 6.0, &[10762]),
        ],
    );
    let query = PageQuery::new(MediaType::Series, SortKey::TopRated)
        .with_genres(GenreFilter::of([18, 80]));
    let pager = provider(remote, query).await;

    let ids: Vec<i64> = pager
        .load(None)
        .await
        .into_result()
        .unwrap()
        .items
        .into_iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn failures_become_error_pages() {
    let remote = FakeRemote::new();
    remote.set_failing(true);
    let pager =
        provider(remote.clone(), PageQuery::new(MediaType::Movie, SortKey::Popular)).await;

    let result = pager.load(Some(4)).await;

    assert!(result.is_error());
    assert!(result.page().is_none());
    assert!(matches!(
        result,
        LoadResult::Error(SyncError::Remote { status: 503, .. })
    ));
    assert_eq!(remote.calls(), 1);
}

#[tokio::test]
async fn relation_views_are_a_single_empty_page() {
    let remote = FakeRemote::new();
    let pager =
        provider(remote.clone(), PageQuery::new(MediaType::Movie, SortKey::Favorites)).await;

    let page = pager.load(None).await.into_result().unwrap();

    assert!(page.items.is_empty());
    assert!(page.is_last());
    assert_eq!(remote.calls(), 0);
}

#[tokio::test]
async fn loaded_pages_are_written_to_the_cache() {
    let remote = FakeRemote::new();
    remote.set_list(MediaType::Movie, RemoteFeed::Popular, 1, movies(1..=3));
    let store = memory_store().await;
    let pager = PageProvider::new(
        store.clone(),
        remote,
        PageQuery::new(MediaType::Movie, SortKey::Popular),
        &SyncConfig::default(),
    );

    pager.load(None).await.into_result().unwrap();

    assert_eq!(
        store
            .all_media(MediaType::Movie, StoreOrder::Title)
            .await
            .unwrap()
            .len(),
        3
    );
    assert!(store.get_media(MediaKey::movie(2)).await.unwrap().is_some());
}

#[tokio::test]
async fn search_text_switches_to_the_search_endpoint() {
    let remote = FakeRemote::new();
    remote.set_search(MediaType::Movie, "heat", vec![movie(949, "Heat")]);
    remote.set_list(MediaType::Movie, RemoteFeed::Popular, 1, movies(1..=5));
    let query =
        PageQuery::new(MediaType::Movie, SortKey::Popular).with_search("  heat ");
    let pager = provider(remote, query).await;

    let page = pager.load(None).await.into_result().unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "Heat");
}

#[tokio::test]
async fn blank_search_text_uses_the_feed() {
    let remote = FakeRemote::new();
    remote.set_list(MediaType::Movie, RemoteFeed::Popular, 1, movies(1..=5));
    let query = PageQuery::new(MediaType::Movie, SortKey::Popular).with_search("   ");
    let pager = provider(remote, query).await;

    let page = pager.load(None).await.into_result().unwrap();

    assert_eq!(page.items.len(), 5);
}

fn summary(prev: Option<u32>, next: Option<u32>, len: usize) -> PageSummary {
    PageSummary {
        prev_cursor: prev,
        next_cursor: next,
        len,
    }
}

#[tokio::test]
async fn refresh_cursor_reloads_the_anchored_page() {
    let pager = provider(
        FakeRemote::new(),
        PageQuery::new(MediaType::Movie, SortKey::Popular),
    )
    .await;
    let pages = vec![
        summary(None, Some(2), 20),
        summary(Some(1), Some(3), 20),
        summary(Some(2), Some(4), 20),
    ];

    let no_anchor = PagingState {
        pages: pages.clone(),
        anchor_position: None,
    };
    assert_eq!(pager.refresh_cursor(&no_anchor), None);

    let on_first = PagingState {
        pages: pages.clone(),
        anchor_position: Some(5),
    };
    assert_eq!(pager.refresh_cursor(&on_first), Some(1));

    let on_third = PagingState {
        pages: pages.clone(),
        anchor_position: Some(45),
    };
    assert_eq!(pager.refresh_cursor(&on_third), Some(3));

    let past_end = PagingState {
        pages,
        anchor_position: Some(500),
    };
    assert_eq!(pager.refresh_cursor(&past_end), Some(3));
}

#[tokio::test]
async fn refresh_cursor_without_pages_divides_by_page_size() {
    let pager = provider(
        FakeRemote::new(),
        PageQuery::new(MediaType::Movie, SortKey::Popular),
    )
    .await;
    let state = PagingState {
        pages: Vec::new(),
        anchor_position: Some(45),
    };

    assert_eq!(pager.refresh_cursor(&state), Some(3));
}

#[tokio::test]
async fn load_more_triggers_inside_prefetch_distance() {
    let pager = provider(
        FakeRemote::new(),
        PageQuery::new(MediaType::Movie, SortKey::Popular),
    )
    .await;

    // 40 loaded, default prefetch distance of 3.
    assert!(!pager.should_load_more(35, 40));
    assert!(pager.should_load_more(37, 40));
    assert!(pager.should_load_more(39, 40));
    assert!(pager.should_load_more(0, 0));
}

//! Shared fixtures for marquee-core integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use marquee_core::{
    LocalStore, ManualClock, RemoteSource, SqliteLocalStore, SyncError,
};
use marquee_model::{
    DetailBase, EpisodeDetails, GenreInfo, MediaDetail, MediaDetailKind,
    MediaItem, MediaKey, MediaType, MovieExtras, RemoteFeed, SeasonDetails,
    SeriesExtras,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_core=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn clock() -> ManualClock {
    ManualClock::new(epoch())
}

pub async fn memory_store() -> Arc<dyn LocalStore> {
    Arc::new(
        SqliteLocalStore::in_memory()
            .await
            .expect("open in-memory store"),
    )
}

pub fn movie(id: i64, title: &str) -> MediaItem {
    item(id, MediaType::Movie, title, 7.0, &[])
}

pub fn item(
    id: i64,
    media_type: MediaType,
    title: &str,
    rating: f32,
    genres: &[i64],
) -> MediaItem {
    MediaItem {
        id,
        media_type,
        title: title.to_string(),
        overview: format!("Overview of {title}"),
        poster_url: Some(format!("https://image.tmdb.org/t/p/w500/{id}.jpg")),
        backdrop_url: None,
        vote_average: rating,
        genres: genres
            .iter()
            .map(|genre| GenreInfo::new(*genre, format!("Genre {genre}")))
            .collect(),
        cached_at: epoch(),
    }
}

fn base(id: i64, title: &str) -> DetailBase {
    DetailBase {
        id,
        title: title.to_string(),
        overview: format!("Overview of {title}"),
        poster_url: None,
        backdrop_url: None,
        vote_average: 8.0,
        vote_count: Some(1200),
        release_date: Some("2021-10-22".into()),
        tagline: Some("Fear is the mind-killer.".into()),
        status: Some("Released".into()),
        genres: vec![GenreInfo::new(878, "Science Fiction")],
        production_companies: Vec::new(),
    }
}

pub fn movie_detail(
    id: i64,
    title: &str,
    last_updated: DateTime<Utc>,
) -> MediaDetail {
    MediaDetail {
        base: base(id, title),
        kind: MediaDetailKind::Movie(MovieExtras {
            runtime: Some(155),
            budget: Some(165_000_000),
            revenue: Some(402_000_000),
        }),
        last_updated,
    }
}

pub fn series_detail(
    id: i64,
    title: &str,
    last_updated: DateTime<Utc>,
) -> MediaDetail {
    let episodes = (1..=3)
        .map(|number| EpisodeDetails {
            episode_number: number,
            name: format!("Episode {number}"),
            overview: None,
            still_url: None,
            air_date: None,
            runtime: Some(50),
            watched: false,
        })
        .collect();
    MediaDetail {
        base: base(id, title),
        kind: MediaDetailKind::Series(SeriesExtras {
            number_of_seasons: Some(1),
            number_of_episodes: Some(3),
            seasons: vec![SeasonDetails {
                season_number: 1,
                name: "Season 1".into(),
                overview: None,
                poster_url: None,
                air_date: Some("2022-02-17".into()),
                episode_count: Some(3),
                episodes,
            }],
        }),
        last_updated,
    }
}

/// In-process stand-in for the content API with call counting.
#[derive(Debug, Default)]
pub struct FakeRemote {
    lists: Mutex<HashMap<(MediaType, RemoteFeed, u32), Vec<MediaItem>>>,
    searches: Mutex<HashMap<(MediaType, String), Vec<MediaItem>>>,
    details: Mutex<HashMap<MediaKey, MediaDetail>>,
    delay: Mutex<Option<Duration>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_list(
        &self,
        media_type: MediaType,
        feed: RemoteFeed,
        page: u32,
        items: Vec<MediaItem>,
    ) {
        self.lists
            .lock()
            .unwrap()
            .insert((media_type, feed, page), items);
    }

    pub fn set_search(
        &self,
        media_type: MediaType,
        query: &str,
        items: Vec<MediaItem>,
    ) {
        self.searches
            .lock()
            .unwrap()
            .insert((media_type, query.to_string()), items);
    }

    pub fn set_detail(&self, detail: MediaDetail) {
        self.details.lock().unwrap().insert(detail.key(), detail);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, endpoint: &str) -> Result<(), SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Remote {
                status: 503,
                endpoint: endpoint.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSource for FakeRemote {
    async fn list(
        &self,
        media_type: MediaType,
        feed: RemoteFeed,
        page: u32,
    ) -> marquee_core::Result<Vec<MediaItem>> {
        self.enter("list").await?;
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(&(media_type, feed, page))
            .cloned()
            .unwrap_or_default())
    }

    async fn search(
        &self,
        media_type: MediaType,
        query: &str,
        _page: u32,
    ) -> marquee_core::Result<Vec<MediaItem>> {
        self.enter("search").await?;
        Ok(self
            .searches
            .lock()
            .unwrap()
            .get(&(media_type, query.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn detail(&self, key: MediaKey) -> marquee_core::Result<MediaDetail> {
        self.enter("detail").await?;
        self.details
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(SyncError::Remote {
                status: 404,
                endpoint: format!("detail/{key}"),
            })
    }
}

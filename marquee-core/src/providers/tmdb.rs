use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use marquee_model::{
    ImageBase, MediaDetail, MediaItem, MediaKey, MediaType, RemoteFeed,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::remote::RemoteSource;
use super::wire::{
    DetailParams, ErrorBody, ListEntry, ListParams, MovieDetailWire,
    ResultsPage, SeriesDetailWire,
};
use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};

/// Relative path of a list endpoint.
pub fn feed_path(media_type: MediaType, feed: RemoteFeed) -> String {
    let segment = media_type.api_segment();
    match feed {
        RemoteFeed::Discover => format!("discover/{segment}"),
        RemoteFeed::Popular => format!("{segment}/popular"),
        RemoteFeed::TopRated => format!("{segment}/top_rated"),
    }
}

pub fn search_path(media_type: MediaType) -> String {
    format!("search/{}", media_type.api_segment())
}

pub fn detail_path(key: MediaKey) -> String {
    format!("{}/{}", key.media_type.api_segment(), key.id)
}

/// [`RemoteSource`] backed by the TMDB v3 REST API.
pub struct TmdbRemoteSource {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
    images: ImageBase,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TmdbRemoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbRemoteSource")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("images", &self.images)
            .finish_non_exhaustive()
    }
}

impl TmdbRemoteSource {
    pub fn new(config: &SyncConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let api_key = config.api_key.clone().unwrap_or_default();
        if api_key.is_empty() {
            warn!("No TMDB API key configured; remote requests will be rejected");
        }

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            language: config.language.clone(),
            images: config.image_base(),
            clock,
        })
    }

    async fn get_json<Q, T>(&self, path: &str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.http.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.status_message)
                .unwrap_or_else(|| status.to_string());
            warn!("TMDB request to {} failed: {}", path, message);
            return Err(SyncError::Remote {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            SyncError::Decode(format!("unexpected payload from {path}: {e}"))
        })
    }

    async fn fetch_page(
        &self,
        media_type: MediaType,
        path: &str,
        page: u32,
        text: Option<&str>,
    ) -> Result<Vec<MediaItem>> {
        let query = ListParams {
            api_key: &self.api_key,
            language: &self.language,
            page: page.max(1),
            query: text,
        };
        let page_body: ResultsPage<ListEntry> =
            self.get_json(path, &query).await?;

        let now = self.clock.now();
        let items: Vec<MediaItem> = page_body
            .results
            .into_iter()
            .map(|entry| entry.into_media_item(media_type, &self.images, now))
            .collect();
        debug!("Fetched {} items from {} page {}", items.len(), path, page);
        Ok(items)
    }
}

#[async_trait]
impl RemoteSource for TmdbRemoteSource {
    async fn list(
        &self,
        media_type: MediaType,
        feed: RemoteFeed,
        page: u32,
    ) -> Result<Vec<MediaItem>> {
        let path = feed_path(media_type, feed);
        self.fetch_page(media_type, &path, page, None).await
    }

    async fn search(
        &self,
        media_type: MediaType,
        query: &str,
        page: u32,
    ) -> Result<Vec<MediaItem>> {
        let path = search_path(media_type);
        self.fetch_page(media_type, &path, page, Some(query)).await
    }

    async fn detail(&self, key: MediaKey) -> Result<MediaDetail> {
        let path = detail_path(key);
        let query = DetailParams {
            api_key: &self.api_key,
            language: &self.language,
        };
        let now = self.clock.now();

        let detail = match key.media_type {
            MediaType::Movie => self
                .get_json::<_, MovieDetailWire>(&path, &query)
                .await?
                .into_detail(&self.images, now),
            MediaType::Series => self
                .get_json::<_, SeriesDetailWire>(&path, &query)
                .await?
                .into_detail(&self.images, now),
        };
        Ok(detail)
    }
}

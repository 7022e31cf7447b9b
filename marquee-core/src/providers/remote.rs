use async_trait::async_trait;
use marquee_model::{MediaDetail, MediaItem, MediaKey, MediaType, RemoteFeed};

use crate::error::Result;

/// Paginated content API. Implementations return domain values; wire formats
/// never leave the provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteSource: Send + Sync + std::fmt::Debug {
    /// One page (1-based) of a list feed.
    async fn list(
        &self,
        media_type: MediaType,
        feed: RemoteFeed,
        page: u32,
    ) -> Result<Vec<MediaItem>>;

    async fn search(
        &self,
        media_type: MediaType,
        query: &str,
        page: u32,
    ) -> Result<Vec<MediaItem>>;

    async fn detail(&self, key: MediaKey) -> Result<MediaDetail>;
}

//! Cursor-based paging over the remote feeds.
//!
//! Cursors are 1-based page numbers. A page that comes back empty upstream is
//! the only end-of-data signal; genre filtering can shrink a page to nothing
//! without ending the sequence.

use std::sync::Arc;

use marquee_model::{GenreFilter, MediaItem, MediaType, SortKey};
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::database::LocalStore;
use crate::error::{Result, SyncError};
use crate::providers::RemoteSource;

pub const FIRST_PAGE: u32 = 1;

/// What a pager walks over.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageQuery {
    pub media_type: MediaType,
    pub sort: SortKey,
    /// Non-blank text switches the pager to the search endpoint.
    pub search: Option<String>,
    pub genres: GenreFilter,
}

impl PageQuery {
    pub fn new(media_type: MediaType, sort: SortKey) -> Self {
        Self {
            media_type,
            sort,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn with_genres(mut self, genres: GenreFilter) -> Self {
        self.genres = genres;
        self
    }

    fn search_text(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<MediaItem>,
    pub cursor: u32,
    pub prev_cursor: Option<u32>,
    pub next_cursor: Option<u32>,
}

impl Page {
    fn terminal(cursor: u32) -> Self {
        Self {
            items: Vec::new(),
            cursor,
            prev_cursor: None,
            next_cursor: None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Result of a single load. Errors are page state, not retried here.
#[derive(Debug)]
pub enum LoadResult {
    Page(Page),
    Error(SyncError),
}

impl LoadResult {
    pub fn page(&self) -> Option<&Page> {
        match self {
            LoadResult::Page(page) => Some(page),
            LoadResult::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadResult::Error(_))
    }

    pub fn into_result(self) -> Result<Page> {
        match self {
            LoadResult::Page(page) => Ok(page),
            LoadResult::Error(err) => Err(err),
        }
    }
}

/// Shape of one loaded page as seen by the list holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub prev_cursor: Option<u32>,
    pub next_cursor: Option<u32>,
    pub len: usize,
}

impl From<&Page> for PageSummary {
    fn from(page: &Page) -> Self {
        Self {
            prev_cursor: page.prev_cursor,
            next_cursor: page.next_cursor,
            len: page.items.len(),
        }
    }
}

/// Loaded pages in order plus the item position the user was looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagingState {
    pub pages: Vec<PageSummary>,
    pub anchor_position: Option<usize>,
}

impl PagingState {
    /// Page covering `position`, or the last page when it lies past the end.
    fn closest_page(&self, position: usize) -> Option<&PageSummary> {
        let mut offset = 0;
        for page in &self.pages {
            offset += page.len;
            if position < offset {
                return Some(page);
            }
        }
        self.pages.last()
    }
}

#[derive(Clone, Debug)]
pub struct PageProvider {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteSource>,
    query: PageQuery,
    page_size: u32,
    prefetch_distance: u32,
}

impl PageProvider {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteSource>,
        query: PageQuery,
        config: &SyncConfig,
    ) -> Self {
        Self {
            store,
            remote,
            query,
            page_size: config.page_size.max(1),
            prefetch_distance: config.prefetch_distance,
        }
    }

    pub fn query(&self) -> &PageQuery {
        &self.query
    }

    /// Load the page at `cursor` (the first page when `None`).
    pub async fn load(&self, cursor: Option<u32>) -> LoadResult {
        let cursor = cursor.unwrap_or(FIRST_PAGE).max(FIRST_PAGE);

        let Some(feed) = self.query.sort.feed() else {
            return LoadResult::Page(Page::terminal(cursor));
        };

        let media_type = self.query.media_type;
        let fetched = match self.query.search_text() {
            Some(text) => self.remote.search(media_type, text, cursor).await,
            None => self.remote.list(media_type, feed, cursor).await,
        };

        let upstream = match fetched {
            Ok(items) => items,
            Err(err) => {
                warn!(
                    "Loading {} page {} failed: {}",
                    media_type, cursor, err
                );
                return LoadResult::Error(err);
            }
        };

        let exhausted = upstream.is_empty();
        let items = self.query.genres.apply(upstream);

        // The page itself is still valid when the cache write fails.
        if let Err(err) = self.store.upsert_media(&items).await {
            warn!("Caching {} page {} failed: {}", media_type, cursor, err);
        }

        debug!(
            "Loaded {} page {} ({} items after filtering)",
            media_type,
            cursor,
            items.len()
        );
        LoadResult::Page(Page {
            items,
            cursor,
            prev_cursor: (cursor > FIRST_PAGE).then(|| cursor - 1),
            next_cursor: if exhausted { None } else { cursor.checked_add(1) },
        })
    }

    /// Cursor to reload so the anchor stays on screen after a refresh.
    /// `None` means start over from the first page.
    pub fn refresh_cursor(&self, state: &PagingState) -> Option<u32> {
        let anchor = state.anchor_position?;
        if let Some(page) = state.closest_page(anchor) {
            return page
                .prev_cursor
                .map(|prev| prev.saturating_add(1))
                .or_else(|| page.next_cursor.map(|next| next - 1));
        }
        let page_index = u32::try_from(anchor / self.page_size as usize)
            .unwrap_or(u32::MAX - 1);
        Some(page_index + FIRST_PAGE)
    }

    /// Whether the list is close enough to its end to fetch the next page.
    pub fn should_load_more(
        &self,
        last_visible_index: usize,
        loaded_count: usize,
    ) -> bool {
        let remaining =
            loaded_count.saturating_sub(last_visible_index.saturating_add(1));
        remaining < self.prefetch_distance as usize
    }
}

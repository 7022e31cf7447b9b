use std::collections::BTreeSet;

use crate::ids::UserId;
use crate::media::MediaItem;
use crate::media_type::MediaType;
use crate::relation::RelationKind;

/// Upstream list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RemoteFeed {
    Discover,
    Popular,
    TopRated,
}

/// Ordering applied when reading cached summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOrder {
    Title,
    Rating,
}

/// How a list is sorted, including the two relation-backed views.
///
/// The relation views are variants of the same enum so a list cannot be both
/// "sorted by popularity" and "favorites only" at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SortKey {
    #[default]
    Popular,
    TopRated,
    Discover,
    Favorites,
    Watched,
}

impl SortKey {
    pub fn feed(&self) -> Option<RemoteFeed> {
        match self {
            SortKey::Popular => Some(RemoteFeed::Popular),
            SortKey::TopRated => Some(RemoteFeed::TopRated),
            SortKey::Discover => Some(RemoteFeed::Discover),
            SortKey::Favorites | SortKey::Watched => None,
        }
    }

    pub fn is_relation_view(&self) -> bool {
        self.feed().is_none()
    }

    /// Relation backing a relation view.
    pub fn relation_kind(&self) -> Option<RelationKind> {
        match self {
            SortKey::Favorites => Some(RelationKind::Favorite),
            SortKey::Watched => Some(RelationKind::Watched),
            _ => None,
        }
    }

    pub fn store_order(&self) -> StoreOrder {
        match self {
            SortKey::Popular | SortKey::TopRated => StoreOrder::Rating,
            SortKey::Discover | SortKey::Favorites | SortKey::Watched => {
                StoreOrder::Title
            }
        }
    }
}

/// Client-side genre filter. An empty filter accepts everything; otherwise an
/// item passes when it carries at least one of the selected genres.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GenreFilter(BTreeSet<i64>);

impl GenreFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of(ids: impl IntoIterator<Item = i64>) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    pub fn matches(&self, item: &MediaItem) -> bool {
        self.0.is_empty() || self.0.iter().any(|id| item.has_genre(*id))
    }

    pub fn apply(&self, items: Vec<MediaItem>) -> Vec<MediaItem> {
        if self.0.is_empty() {
            return items;
        }
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

/// Parameters of a `list_by_category` read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListRequest {
    pub media_type: MediaType,
    pub sort: SortKey,
    pub genres: GenreFilter,
    /// Upstream page to refresh from; defaults to the first page.
    pub page: Option<u32>,
    /// Required for the relation views; ignored otherwise.
    pub user: Option<UserId>,
}

impl ListRequest {
    pub fn new(media_type: MediaType, sort: SortKey) -> Self {
        Self {
            media_type,
            sort,
            ..Self::default()
        }
    }

    pub fn with_genres(mut self, genres: GenreFilter) -> Self {
        self.genres = genres;
        self
    }

    pub fn with_user(mut self, user: Option<UserId>) -> Self {
        self.user = user;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

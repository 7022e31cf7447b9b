use chrono::{DateTime, Utc};

use crate::ids::MediaKey;
use crate::media_type::MediaType;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenreInfo {
    pub id: i64,
    pub name: String,
}

impl GenreInfo {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Summary row shown in lists and grids.
///
/// Values are immutable once built; refreshed data produces a new value that
/// replaces the cached row for the same [`MediaKey`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaItem {
    pub id: i64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub vote_average: f32,
    /// Ordered as delivered upstream. Empty when unknown.
    #[cfg_attr(feature = "serde", serde(default))]
    pub genres: Vec<GenreInfo>,
    pub cached_at: DateTime<Utc>,
}

impl MediaItem {
    /// Minimal placeholder inserted ahead of a relation row so later joins
    /// against the summary table resolve.
    pub fn stub(key: MediaKey, cached_at: DateTime<Utc>) -> Self {
        Self {
            id: key.id,
            media_type: key.media_type,
            title: String::new(),
            overview: String::new(),
            poster_url: None,
            backdrop_url: None,
            vote_average: 0.0,
            genres: Vec::new(),
            cached_at,
        }
    }

    pub fn key(&self) -> MediaKey {
        MediaKey::new(self.id, self.media_type)
    }

    pub fn is_stub(&self) -> bool {
        self.title.is_empty() && self.poster_url.is_none()
    }

    pub fn has_genre(&self, genre_id: i64) -> bool {
        self.genres.iter().any(|genre| genre.id == genre_id)
    }

    /// Case-insensitive substring match over title and overview.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.title.to_lowercase().contains(&needle)
            || self.overview.to_lowercase().contains(&needle)
    }

    pub fn with_cached_at(mut self, cached_at: DateTime<Utc>) -> Self {
        self.cached_at = cached_at;
        self
    }
}

use chrono::{DateTime, TimeDelta, Utc};

use crate::ids::MediaKey;
use crate::media::{GenreInfo, MediaItem};
use crate::media_type::MediaType;
use crate::watch::EpisodeKey;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProductionCompany {
    pub id: i64,
    pub name: String,
    pub origin_country: Option<String>,
}

/// Fields shared by every detail variant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetailBase {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub vote_average: f32,
    pub vote_count: Option<u32>,
    pub release_date: Option<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub genres: Vec<GenreInfo>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub production_companies: Vec<ProductionCompany>,
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovieExtras {
    pub runtime: Option<u32>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesExtras {
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub seasons: Vec<SeasonDetails>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeasonDetails {
    pub season_number: u16,
    pub name: String,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub air_date: Option<String>,
    pub episode_count: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub episodes: Vec<EpisodeDetails>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeDetails {
    pub episode_number: u16,
    pub name: String,
    pub overview: Option<String>,
    pub still_url: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<u32>,
    /// View over the per-episode watch log; never persisted with the season
    /// payload.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub watched: bool,
}

/// Type-specific half of a detail record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum MediaDetailKind {
    Movie(MovieExtras),
    Series(SeriesExtras),
}

impl MediaDetailKind {
    pub fn media_type(&self) -> MediaType {
        match self {
            MediaDetailKind::Movie(_) => MediaType::Movie,
            MediaDetailKind::Series(_) => MediaType::Series,
        }
    }
}

/// Full detail record for a movie or series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaDetail {
    pub base: DetailBase,
    pub kind: MediaDetailKind,
    pub last_updated: DateTime<Utc>,
}

impl MediaDetail {
    pub fn key(&self) -> MediaKey {
        MediaKey::new(self.base.id, self.media_type())
    }

    pub fn media_type(&self) -> MediaType {
        self.kind.media_type()
    }

    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.last_updated
    }

    /// Stale once strictly older than `ttl`.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        self.age(now) > ttl
    }

    /// Summary projection written alongside the detail so list views and
    /// relation joins can resolve it.
    pub fn to_summary(&self) -> MediaItem {
        MediaItem {
            id: self.base.id,
            media_type: self.media_type(),
            title: self.base.title.clone(),
            overview: self.base.overview.clone(),
            poster_url: self.base.poster_url.clone(),
            backdrop_url: self.base.backdrop_url.clone(),
            vote_average: self.base.vote_average,
            genres: self.base.genres.clone(),
            cached_at: self.last_updated,
        }
    }

    pub fn seasons(&self) -> &[SeasonDetails] {
        match &self.kind {
            MediaDetailKind::Series(series) => &series.seasons,
            MediaDetailKind::Movie(_) => &[],
        }
    }

    /// Recomputes every episode's `watched` flag from `is_watched`.
    pub fn apply_episode_watch_view(
        &mut self,
        is_watched: impl Fn(&EpisodeKey) -> bool,
    ) {
        let series_id = self.base.id;
        if let MediaDetailKind::Series(series) = &mut self.kind {
            for season in &mut series.seasons {
                for episode in &mut season.episodes {
                    let key = EpisodeKey {
                        series_id,
                        season_number: season.season_number,
                        episode_number: episode.episode_number,
                    };
                    episode.watched = is_watched(&key);
                }
            }
        }
    }
}

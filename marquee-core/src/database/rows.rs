//! Row shapes read back from SQLite and their conversion into model types.

use chrono::{DateTime, Utc};
use marquee_model::{
    DetailBase, GenreInfo, MediaDetail, MediaDetailKind, MediaItem, MediaKey,
    MediaType, MovieExtras, ProductionCompany, SeasonDetails, SeriesExtras,
    UserId, UserRecord,
};
use sqlx::FromRow;

use super::codec;
use crate::error::{Result, SyncError};

#[derive(Debug, FromRow)]
pub(crate) struct MediaItemRow {
    pub id: i64,
    pub media_type: String,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub vote_average: f64,
    pub genres_json: Option<String>,
    pub cached_at: DateTime<Utc>,
}

impl TryFrom<MediaItemRow> for MediaItem {
    type Error = SyncError;

    fn try_from(row: MediaItemRow) -> Result<Self> {
        let genres: Vec<GenreInfo> =
            codec::decode_list("genres_json", row.genres_json.as_deref());
        Ok(MediaItem {
            id: row.id,
            media_type: row.media_type.parse::<MediaType>()?,
            title: row.title,
            overview: row.overview,
            poster_url: row.poster_url,
            backdrop_url: row.backdrop_url,
            vote_average: row.vote_average as f32,
            genres,
            cached_at: row.cached_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct MediaDetailRow {
    pub id: i64,
    pub media_type: String,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub vote_average: f64,
    pub vote_count: Option<i64>,
    pub release_date: Option<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    pub runtime: Option<i64>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub number_of_seasons: Option<i64>,
    pub number_of_episodes: Option<i64>,
    pub genres_json: Option<String>,
    pub companies_json: Option<String>,
    pub seasons_json: Option<String>,
    pub last_updated: DateTime<Utc>,
}

fn narrow<T: TryFrom<i64>>(value: Option<i64>) -> Option<T> {
    value.and_then(|v| T::try_from(v).ok())
}

impl TryFrom<MediaDetailRow> for MediaDetail {
    type Error = SyncError;

    fn try_from(row: MediaDetailRow) -> Result<Self> {
        let media_type = row.media_type.parse::<MediaType>()?;
        let genres: Vec<GenreInfo> =
            codec::decode_list("genres_json", row.genres_json.as_deref());
        let production_companies: Vec<ProductionCompany> = codec::decode_list(
            "companies_json",
            row.companies_json.as_deref(),
        );

        let kind = match media_type {
            MediaType::Movie => MediaDetailKind::Movie(MovieExtras {
                runtime: narrow(row.runtime),
                budget: narrow(row.budget),
                revenue: narrow(row.revenue),
            }),
            MediaType::Series => {
                let seasons: Vec<SeasonDetails> = codec::decode_list(
                    "seasons_json",
                    row.seasons_json.as_deref(),
                );
                MediaDetailKind::Series(SeriesExtras {
                    number_of_seasons: narrow(row.number_of_seasons),
                    number_of_episodes: narrow(row.number_of_episodes),
                    seasons,
                })
            }
        };

        Ok(MediaDetail {
            base: DetailBase {
                id: row.id,
                title: row.title,
                overview: row.overview,
                poster_url: row.poster_url,
                backdrop_url: row.backdrop_url,
                vote_average: row.vote_average as f32,
                vote_count: narrow(row.vote_count),
                release_date: row.release_date,
                tagline: row.tagline,
                status: row.status,
                genres,
                production_companies,
            },
            kind,
            last_updated: row.last_updated,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct DetailStampRow {
    pub id: i64,
    pub media_type: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub(crate) struct RelationKeyRow {
    pub media_id: i64,
    pub media_type: String,
}

impl TryFrom<RelationKeyRow> for MediaKey {
    type Error = SyncError;

    fn try_from(row: RelationKeyRow) -> Result<Self> {
        Ok(MediaKey::new(
            row.media_id,
            row.media_type.parse::<MediaType>()?,
        ))
    }
}

#[derive(FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: UserId(row.id),
            username: row.username,
            password: row.password,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct EpisodeWatchRow {
    pub season_number: i64,
    pub episode_number: i64,
}

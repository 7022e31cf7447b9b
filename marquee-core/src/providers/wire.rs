//! TMDB response shapes and their conversion into model values.

use chrono::{DateTime, Utc};
use marquee_model::{
    DetailBase, EpisodeDetails, GenreInfo, ImageBase, MediaDetail,
    MediaDetailKind, MediaItem, MediaType, MovieExtras, ProductionCompany,
    SeasonDetails, SeriesExtras,
};
use serde::{Deserialize, Serialize};

use super::genres::resolve_genres;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ListParams<'a> {
    pub api_key: &'a str,
    pub language: &'a str,
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DetailParams<'a> {
    pub api_key: &'a str,
    pub language: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub status_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResultsPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Movie and tv list entries share one shape apart from the title and date
/// field names.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListEntry {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub genre_ids: Option<Vec<i64>>,
}

impl ListEntry {
    pub fn into_media_item(
        self,
        media_type: MediaType,
        images: &ImageBase,
        now: DateTime<Utc>,
    ) -> MediaItem {
        let title = match media_type {
            MediaType::Movie => self.title.or(self.name),
            MediaType::Series => self.name.or(self.title),
        };
        MediaItem {
            id: self.id,
            media_type,
            title: title.unwrap_or_default(),
            overview: self.overview.unwrap_or_default(),
            poster_url: images.poster_url(self.poster_path.as_deref()),
            backdrop_url: images.backdrop_url(self.backdrop_path.as_deref()),
            vote_average: self.vote_average.unwrap_or_default(),
            genres: resolve_genres(
                media_type,
                self.genre_ids.as_deref().unwrap_or_default(),
            ),
            cached_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GenreWire {
    pub id: i64,
    pub name: String,
}

impl From<GenreWire> for GenreInfo {
    fn from(genre: GenreWire) -> Self {
        GenreInfo::new(genre.id, genre.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompanyWire {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub origin_country: Option<String>,
}

impl From<CompanyWire> for ProductionCompany {
    fn from(company: CompanyWire) -> Self {
        ProductionCompany {
            id: company.id,
            name: company.name,
            origin_country: non_empty(company.origin_country),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MovieDetailWire {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub vote_count: Option<u32>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub genres: Vec<GenreWire>,
    #[serde(default)]
    pub production_companies: Vec<CompanyWire>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub revenue: Option<u64>,
}

impl MovieDetailWire {
    pub fn into_detail(
        self,
        images: &ImageBase,
        now: DateTime<Utc>,
    ) -> MediaDetail {
        MediaDetail {
            base: DetailBase {
                id: self.id,
                title: self.title,
                overview: self.overview.unwrap_or_default(),
                poster_url: images.poster_url(self.poster_path.as_deref()),
                backdrop_url: images
                    .backdrop_url(self.backdrop_path.as_deref()),
                vote_average: self.vote_average.unwrap_or_default(),
                vote_count: self.vote_count,
                release_date: non_empty(self.release_date),
                tagline: non_empty(self.tagline),
                status: non_empty(self.status),
                genres: self.genres.into_iter().map(Into::into).collect(),
                production_companies: self
                    .production_companies
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            },
            kind: MediaDetailKind::Movie(MovieExtras {
                runtime: self.runtime.filter(|r| *r > 0),
                budget: self.budget.filter(|b| *b > 0),
                revenue: self.revenue.filter(|r| *r > 0),
            }),
            last_updated: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EpisodeWire {
    pub episode_number: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub still_path: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SeasonWire {
    pub season_number: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub episode_count: Option<u32>,
    #[serde(default)]
    pub episodes: Vec<EpisodeWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SeriesDetailWire {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub vote_count: Option<u32>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub genres: Vec<GenreWire>,
    #[serde(default)]
    pub production_companies: Vec<CompanyWire>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub seasons: Vec<SeasonWire>,
}

impl SeriesDetailWire {
    pub fn into_detail(
        self,
        images: &ImageBase,
        now: DateTime<Utc>,
    ) -> MediaDetail {
        let seasons = self
            .seasons
            .into_iter()
            .map(|season| SeasonDetails {
                season_number: season.season_number,
                name: season.name,
                overview: non_empty(season.overview),
                poster_url: images.poster_url(season.poster_path.as_deref()),
                air_date: non_empty(season.air_date),
                episode_count: season.episode_count,
                episodes: season
                    .episodes
                    .into_iter()
                    .map(|episode| EpisodeDetails {
                        episode_number: episode.episode_number,
                        name: episode.name,
                        overview: non_empty(episode.overview),
                        still_url: images
                            .still_url(episode.still_path.as_deref()),
                        air_date: non_empty(episode.air_date),
                        runtime: episode.runtime,
                        watched: false,
                    })
                    .collect(),
            })
            .collect();

        MediaDetail {
            base: DetailBase {
                id: self.id,
                title: self.name,
                overview: self.overview.unwrap_or_default(),
                poster_url: images.poster_url(self.poster_path.as_deref()),
                backdrop_url: images
                    .backdrop_url(self.backdrop_path.as_deref()),
                vote_average: self.vote_average.unwrap_or_default(),
                vote_count: self.vote_count,
                release_date: non_empty(self.first_air_date),
                tagline: non_empty(self.tagline),
                status: non_empty(self.status),
                genres: self.genres.into_iter().map(Into::into).collect(),
                production_companies: self
                    .production_companies
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            },
            kind: MediaDetailKind::Series(SeriesExtras {
                number_of_seasons: self.number_of_seasons,
                number_of_episodes: self.number_of_episodes,
                seasons,
            }),
            last_updated: now,
        }
    }
}

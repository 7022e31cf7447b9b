//! Static genre tables. List endpoints only return genre ids, so names are
//! filled in locally instead of spending a request on the genre endpoints.

use marquee_model::{GenreInfo, MediaType};

const MOVIE_GENRES: &[(i64, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

const TV_GENRES: &[(i64, &str)] = &[
    (10759, "Action & Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (10762, "Kids"),
    (9648, "Mystery"),
    (10763, "News"),
    (10764, "Reality"),
    (10765, "Sci-Fi & Fantasy"),
    (10766, "Soap"),
    (10767, "Talk"),
    (10768, "War & Politics"),
    (37, "Western"),
];

pub fn genre_name(media_type: MediaType, id: i64) -> Option<&'static str> {
    let table = match media_type {
        MediaType::Movie => MOVIE_GENRES,
        MediaType::Series => TV_GENRES,
    };
    table
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map(|(_, name)| *name)
}

/// Resolve ids in upstream order. Ids missing from the table keep their id so
/// filtering still works.
pub fn resolve_genres(media_type: MediaType, ids: &[i64]) -> Vec<GenreInfo> {
    ids.iter()
        .map(|id| {
            GenreInfo::new(*id, genre_name(media_type, *id).unwrap_or("Unknown"))
        })
        .collect()
}

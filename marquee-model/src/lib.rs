//! Core data model definitions shared across Marquee crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod catalog;
pub mod details;
pub mod error;
pub mod freshness;
pub mod ids;
pub mod image;
pub mod media;
pub mod media_type;
pub mod relation;
pub mod user;
pub mod watch;

// Intentionally curated re-exports for downstream consumers.
pub use catalog::{GenreFilter, ListRequest, RemoteFeed, SortKey, StoreOrder};
pub use details::{
    DetailBase, EpisodeDetails, MediaDetail, MediaDetailKind, MovieExtras,
    ProductionCompany, SeasonDetails, SeriesExtras,
};
pub use error::{ModelError, Result as ModelResult};
pub use freshness::{Fetched, Freshness};
pub use ids::{MediaKey, UserId};
pub use image::{BackdropSize, ImageBase, PosterSize, StillSize};
pub use media::{GenreInfo, MediaItem};
pub use media_type::MediaType;
pub use relation::{RelationKind, RelationRecord, RelationWrite};
pub use user::UserRecord;
pub use watch::EpisodeKey;

//! # Marquee Core
//!
//! Offline-first sync and caching core for the Marquee catalog browser.
//!
//! ## Overview
//!
//! - **Local store**: SQLite cache of summaries, details, user relations and
//!   episode watches, with live query subscriptions
//! - **Remote source**: TMDB-shaped content API client
//! - **Sync repository**: cache-first reads with stale-while-revalidate
//!   refreshes gated by connectivity
//! - **Paging**: cursor-based page loading with client-side genre filtering
//! - **Relations**: per-user favorites and watched lists
//! - **Janitor**: TTL eviction and the startup purge
//!
//! ## Examples
//!
//! ```no_run
//! use futures::StreamExt;
//! use marquee_core::{Catalog, SyncConfig};
//! use marquee_model::{ListRequest, MediaType, SortKey};
//!
//! async fn popular_movies() -> Result<(), Box<dyn std::error::Error>> {
//!     let (config, _source) = SyncConfig::load_from_env()?;
//!     let catalog = Catalog::open(config).await?;
//!
//!     let mut reads = catalog
//!         .sync()
//!         .list_by_category(ListRequest::new(MediaType::Movie, SortKey::Popular));
//!     while let Some(read) = reads.next().await {
//!         let read = read?;
//!         println!("{:?}: {} items", read.freshness, read.value.len());
//!     }
//!
//!     catalog.shutdown().await;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod catalog;
pub mod clock;
pub mod config;
pub mod database;
pub mod episodes;
pub mod error;
pub mod janitor;
pub mod network;
pub mod paging;
pub mod providers;
pub mod relations;
pub mod sync;
pub mod users;

/// Embedded schema migrations for the local store.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use catalog::Catalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigSource, SyncConfig};
pub use database::{
    DetailStamp, LocalStore, SqliteLocalStore, StoreChange, Subscription,
    observe_media,
};
pub use episodes::EpisodeWatchLog;
pub use error::{Result, SyncError};
pub use janitor::{CacheJanitor, SweepReport};
pub use network::{ConnectivityProbe, HttpProbe, MonitorHandle, NetworkMonitor};
pub use paging::{LoadResult, Page, PageProvider, PageQuery, PageSummary, PagingState};
pub use providers::{RemoteSource, TmdbRemoteSource};
pub use relations::RelationRepository;
pub use sync::{ReadStream, SyncRepository};
pub use users::UserStore;

pub use marquee_model as model;

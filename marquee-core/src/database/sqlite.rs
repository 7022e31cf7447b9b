use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_model::{
    EpisodeKey, MediaDetail, MediaDetailKind, MediaItem, MediaKey, MediaType,
    RelationKind, RelationRecord, StoreOrder, UserId, UserRecord,
};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
};
use sqlx::{QueryBuilder, Sqlite};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::codec;
use super::ports::{DetailStamp, LocalStore, StoreChange};
use super::rows::{
    DetailStampRow, EpisodeWatchRow, MediaDetailRow, MediaItemRow,
    RelationKeyRow, UserRow,
};
use crate::MIGRATOR;
use crate::error::{Result, SyncError};

const CHANGE_CHANNEL_CAPACITY: usize = 256;
const ID_CHUNK: usize = 500;

const MEDIA_COLUMNS: &str = "id, media_type, title, overview, poster_url, \
     backdrop_url, vote_average, genres_json, cached_at";

const DETAIL_COLUMNS: &str = "id, media_type, title, overview, poster_url, \
     backdrop_url, vote_average, vote_count, release_date, tagline, status, \
     runtime, budget, revenue, number_of_seasons, number_of_episodes, \
     genres_json, companies_json, seasons_json, last_updated";

fn order_clause(order: StoreOrder) -> &'static str {
    match order {
        StoreOrder::Title => "ORDER BY title COLLATE NOCASE, id",
        StoreOrder::Rating => {
            "ORDER BY vote_average DESC, title COLLATE NOCASE, id"
        }
    }
}

fn to_i64<T: TryInto<i64>>(value: Option<T>) -> Option<i64> {
    value.and_then(|v| v.try_into().ok())
}

/// SQLite implementation of [`LocalStore`].
#[derive(Debug, Clone)]
pub struct SqliteLocalStore {
    pool: SqlitePool,
    changes: broadcast::Sender<StoreChange>,
}

impl SqliteLocalStore {
    /// Open (or create) a database file and bring its schema up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::Internal(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        info!("Opened local store at {}", path.display());
        Self::from_pool(pool).await
    }

    /// Private in-memory database. A single pinned connection keeps the data
    /// alive for the lifetime of the store.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        MIGRATOR.run(&pool).await?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self { pool, changes })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn notify(&self, change: StoreChange) {
        // No subscribers is not an error.
        let _ = self.changes.send(change);
    }

    async fn fetch_media_rows(
        &self,
        media_type: MediaType,
        order: StoreOrder,
    ) -> Result<Vec<MediaItem>> {
        let sql = format!(
            "SELECT {MEDIA_COLUMNS} FROM media_items WHERE media_type = ? {}",
            order_clause(order)
        );
        let rows = sqlx::query_as::<_, MediaItemRow>(&sql)
            .bind(media_type.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(MediaItem::try_from).collect()
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn upsert_media(&self, items: &[MediaItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for item in items {
            let genres = codec::encode_list(&item.genres)?;
            sqlx::query(
                r#"
                INSERT INTO media_items (
                    id, media_type, title, overview, poster_url,
                    backdrop_url, vote_average, genres_json, cached_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (id, media_type) DO UPDATE SET
                    title = excluded.title,
                    overview = excluded.overview,
                    poster_url = excluded.poster_url,
                    backdrop_url = excluded.backdrop_url,
                    vote_average = excluded.vote_average,
                    genres_json = excluded.genres_json,
                    cached_at = excluded.cached_at
                "#,
            )
            .bind(item.id)
            .bind(item.media_type.as_str())
            .bind(&item.title)
            .bind(&item.overview)
            .bind(&item.poster_url)
            .bind(&item.backdrop_url)
            .bind(f64::from(item.vote_average))
            .bind(genres)
            .bind(item.cached_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let touched: BTreeSet<MediaType> =
            items.iter().map(|item| item.media_type).collect();
        debug!("Upserted {} media rows", items.len());
        for media_type in touched {
            self.notify(StoreChange::Media(media_type));
        }
        Ok(())
    }

    async fn insert_media_if_absent(&self, item: &MediaItem) -> Result<bool> {
        let genres = codec::encode_list(&item.genres)?;
        let result = sqlx::query(
            r#"
            INSERT INTO media_items (
                id, media_type, title, overview, poster_url,
                backdrop_url, vote_average, genres_json, cached_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id, media_type) DO NOTHING
            "#,
        )
        .bind(item.id)
        .bind(item.media_type.as_str())
        .bind(&item.title)
        .bind(&item.overview)
        .bind(&item.poster_url)
        .bind(&item.backdrop_url)
        .bind(f64::from(item.vote_average))
        .bind(genres)
        .bind(item.cached_at)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            self.notify(StoreChange::Media(item.media_type));
        }
        Ok(inserted)
    }

    async fn get_media(&self, key: MediaKey) -> Result<Option<MediaItem>> {
        let sql = format!(
            "SELECT {MEDIA_COLUMNS} FROM media_items \
             WHERE id = ? AND media_type = ?"
        );
        sqlx::query_as::<_, MediaItemRow>(&sql)
            .bind(key.id)
            .bind(key.media_type.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(MediaItem::try_from)
            .transpose()
    }

    async fn get_media_by_ids(
        &self,
        media_type: MediaType,
        ids: &[i64],
    ) -> Result<Vec<MediaItem>> {
        let mut items = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(ID_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                format!("SELECT {MEDIA_COLUMNS} FROM media_items WHERE media_type = "),
            );
            builder.push_bind(media_type.as_str());
            builder.push(" AND id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            let rows = builder
                .build_query_as::<MediaItemRow>()
                .fetch_all(&self.pool)
                .await?;
            for row in rows {
                items.push(MediaItem::try_from(row)?);
            }
        }
        Ok(items)
    }

    async fn all_media(
        &self,
        media_type: MediaType,
        order: StoreOrder,
    ) -> Result<Vec<MediaItem>> {
        self.fetch_media_rows(media_type, order).await
    }

    async fn search_media(
        &self,
        media_type: MediaType,
        needle: &str,
    ) -> Result<Vec<MediaItem>> {
        // SQLite's lower() only folds ASCII, so matching happens here.
        let items = self.fetch_media_rows(media_type, StoreOrder::Title).await?;
        Ok(items
            .into_iter()
            .filter(|item| item.matches_text(needle))
            .collect())
    }

    async fn delete_media(&self, key: MediaKey) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM media_items WHERE id = ? AND media_type = ?",
        )
        .bind(key.id)
        .bind(key.media_type.as_str())
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            self.notify(StoreChange::Media(key.media_type));
        }
        Ok(deleted)
    }

    async fn upsert_detail(&self, detail: &MediaDetail) -> Result<()> {
        let base = &detail.base;
        let genres = codec::encode_list(&base.genres)?;
        let companies = codec::encode_list(&base.production_companies)?;

        let (runtime, budget, revenue) = match &detail.kind {
            MediaDetailKind::Movie(movie) => (
                to_i64(movie.runtime),
                to_i64(movie.budget),
                to_i64(movie.revenue),
            ),
            MediaDetailKind::Series(_) => (None, None, None),
        };
        let (number_of_seasons, number_of_episodes, seasons) =
            match &detail.kind {
                MediaDetailKind::Series(series) => (
                    to_i64(series.number_of_seasons),
                    to_i64(series.number_of_episodes),
                    codec::encode_list(&series.seasons)?,
                ),
                MediaDetailKind::Movie(_) => (None, None, None),
            };

        sqlx::query(
            r#"
            INSERT INTO media_details (
                id, media_type, title, overview, poster_url, backdrop_url,
                vote_average, vote_count, release_date, tagline, status,
                runtime, budget, revenue, number_of_seasons,
                number_of_episodes, genres_json, companies_json,
                seasons_json, last_updated
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id, media_type) DO UPDATE SET
                title = excluded.title,
                overview = excluded.overview,
                poster_url = excluded.poster_url,
                backdrop_url = excluded.backdrop_url,
                vote_average = excluded.vote_average,
                vote_count = excluded.vote_count,
                release_date = excluded.release_date,
                tagline = excluded.tagline,
                status = excluded.status,
                runtime = excluded.runtime,
                budget = excluded.budget,
                revenue = excluded.revenue,
                number_of_seasons = excluded.number_of_seasons,
                number_of_episodes = excluded.number_of_episodes,
                genres_json = excluded.genres_json,
                companies_json = excluded.companies_json,
                seasons_json = excluded.seasons_json,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(base.id)
        .bind(detail.media_type().as_str())
        .bind(&base.title)
        .bind(&base.overview)
        .bind(&base.poster_url)
        .bind(&base.backdrop_url)
        .bind(f64::from(base.vote_average))
        .bind(to_i64(base.vote_count))
        .bind(&base.release_date)
        .bind(&base.tagline)
        .bind(&base.status)
        .bind(runtime)
        .bind(budget)
        .bind(revenue)
        .bind(number_of_seasons)
        .bind(number_of_episodes)
        .bind(genres)
        .bind(companies)
        .bind(seasons)
        .bind(detail.last_updated)
        .execute(&self.pool)
        .await?;

        self.notify(StoreChange::Detail(detail.key()));
        Ok(())
    }

    async fn get_detail(&self, key: MediaKey) -> Result<Option<MediaDetail>> {
        let sql = format!(
            "SELECT {DETAIL_COLUMNS} FROM media_details \
             WHERE id = ? AND media_type = ?"
        );
        sqlx::query_as::<_, MediaDetailRow>(&sql)
            .bind(key.id)
            .bind(key.media_type.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(MediaDetail::try_from)
            .transpose()
    }

    async fn detail_stamps(
        &self,
        media_type: MediaType,
    ) -> Result<Vec<DetailStamp>> {
        let rows = sqlx::query_as::<_, DetailStampRow>(
            "SELECT id, media_type, last_updated FROM media_details \
             WHERE media_type = ?",
        )
        .bind(media_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<DetailStamp> {
                Ok(DetailStamp {
                    key: MediaKey::new(
                        row.id,
                        row.media_type.parse::<MediaType>()?,
                    ),
                    last_updated: row.last_updated,
                })
            })
            .collect()
    }

    async fn delete_detail(&self, key: MediaKey) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM media_details WHERE id = ? AND media_type = ?",
        )
        .bind(key.id)
        .bind(key.media_type.as_str())
        .execute(&self.pool)
        .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            self.notify(StoreChange::Detail(key));
        }
        Ok(deleted)
    }

    async fn insert_relation(
        &self,
        kind: RelationKind,
        record: RelationRecord,
        added_at: DateTime<Utc>,
    ) -> Result<bool> {
        let sql = format!(
            "INSERT INTO {} (user_id, media_id, media_type, added_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (user_id, media_id, media_type) DO NOTHING",
            kind.table()
        );
        let result = sqlx::query(&sql)
            .bind(record.user_id.as_i64())
            .bind(record.media.id)
            .bind(record.media.media_type.as_str())
            .bind(added_at)
            .execute(&self.pool)
            .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            self.notify(StoreChange::Relation {
                kind,
                user_id: record.user_id,
            });
        }
        Ok(inserted)
    }

    async fn delete_relation(
        &self,
        kind: RelationKind,
        record: RelationRecord,
    ) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = ? AND media_id = ? AND media_type = ?",
            kind.table()
        );
        let result = sqlx::query(&sql)
            .bind(record.user_id.as_i64())
            .bind(record.media.id)
            .bind(record.media.media_type.as_str())
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            self.notify(StoreChange::Relation {
                kind,
                user_id: record.user_id,
            });
        }
        Ok(deleted)
    }

    async fn relation_exists(
        &self,
        kind: RelationKind,
        record: RelationRecord,
    ) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} \
             WHERE user_id = ? AND media_id = ? AND media_type = ?)",
            kind.table()
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(record.user_id.as_i64())
            .bind(record.media.id)
            .bind(record.media.media_type.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn relation_ids(
        &self,
        kind: RelationKind,
        user_id: UserId,
        media_type: MediaType,
    ) -> Result<Vec<i64>> {
        let sql = format!(
            "SELECT media_id FROM {} WHERE user_id = ? AND media_type = ? \
             ORDER BY added_at, rowid",
            kind.table()
        );
        let ids: Vec<i64> = sqlx::query_scalar(&sql)
            .bind(user_id.as_i64())
            .bind(media_type.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn relation_keys(
        &self,
        kind: RelationKind,
    ) -> Result<HashSet<MediaKey>> {
        let sql = format!(
            "SELECT DISTINCT media_id, media_type FROM {}",
            kind.table()
        );
        let rows = sqlx::query_as::<_, RelationKeyRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(MediaKey::try_from).collect()
    }

    async fn insert_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord> {
        let result = sqlx::query(
            "INSERT INTO users (username, password) VALUES (?, ?)",
        )
        .bind(username)
        .bind(password)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(SyncError::UserExists(username.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        self.notify(StoreChange::Users);
        Ok(UserRecord {
            id: UserId(result.last_insert_rowid()),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password FROM users WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRecord::from))
    }

    async fn set_episode_watched(
        &self,
        user_id: UserId,
        key: EpisodeKey,
        watched: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let query = if watched {
            sqlx::query(
                r#"
                INSERT INTO episode_watches (
                    user_id, series_id, season_number, episode_number,
                    watched_at
                )
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (user_id, series_id, season_number, episode_number)
                DO NOTHING
                "#,
            )
            .bind(user_id.as_i64())
            .bind(key.series_id)
            .bind(i64::from(key.season_number))
            .bind(i64::from(key.episode_number))
            .bind(at)
        } else {
            sqlx::query(
                "DELETE FROM episode_watches WHERE user_id = ? AND series_id = ? \
                 AND season_number = ? AND episode_number = ?",
            )
            .bind(user_id.as_i64())
            .bind(key.series_id)
            .bind(i64::from(key.season_number))
            .bind(i64::from(key.episode_number))
        };

        let result = query.execute(&self.pool).await?;
        if result.rows_affected() > 0 {
            self.notify(StoreChange::EpisodeWatch {
                user_id,
                series_id: key.series_id,
            });
        }
        Ok(())
    }

    async fn watched_episodes(
        &self,
        user_id: UserId,
        series_id: i64,
    ) -> Result<HashSet<EpisodeKey>> {
        let rows = sqlx::query_as::<_, EpisodeWatchRow>(
            "SELECT season_number, episode_number FROM episode_watches \
             WHERE user_id = ? AND series_id = ?",
        )
        .bind(user_id.as_i64())
        .bind(series_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                Some(EpisodeKey::new(
                    series_id,
                    u16::try_from(row.season_number).ok()?,
                    u16::try_from(row.episode_number).ok()?,
                ))
            })
            .collect())
    }

    fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("Local store closed");
    }
}

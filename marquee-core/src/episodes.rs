use std::collections::HashSet;
use std::sync::Arc;

use marquee_model::{
    EpisodeKey, MediaDetail, MediaType, RelationWrite, UserId,
};

use crate::clock::Clock;
use crate::database::{LocalStore, StoreChange, Subscription, observe};
use crate::error::Result;

/// Per-episode watch log. Series details expose it through each episode's
/// `watched` flag.
#[derive(Clone, Debug)]
pub struct EpisodeWatchLog {
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn Clock>,
}

impl EpisodeWatchLog {
    pub fn new(store: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn mark(
        &self,
        user: Option<UserId>,
        episode: EpisodeKey,
        watched: bool,
    ) -> Result<RelationWrite> {
        let Some(user_id) = user else {
            return Ok(RelationWrite::Ignored);
        };
        self.store
            .set_episode_watched(user_id, episode, watched, self.clock.now())
            .await?;
        Ok(RelationWrite::Applied)
    }

    pub async fn watched_in_series(
        &self,
        user: Option<UserId>,
        series_id: i64,
    ) -> Result<HashSet<EpisodeKey>> {
        match user {
            Some(user_id) => {
                self.store.watched_episodes(user_id, series_id).await
            }
            None => Ok(HashSet::new()),
        }
    }

    /// Live set of watched episodes for one series.
    pub fn observe_series(
        &self,
        user: Option<UserId>,
        series_id: i64,
    ) -> Subscription<HashSet<EpisodeKey>> {
        let Some(user_id) = user else {
            return Box::pin(futures::stream::once(async {
                Ok(HashSet::new())
            }));
        };
        observe(
            Arc::clone(&self.store),
            move |change| {
                matches!(change, StoreChange::EpisodeWatch { user_id: u, series_id: s }
                    if *u == user_id && *s == series_id)
            },
            move |store| async move {
                store.watched_episodes(user_id, series_id).await
            },
        )
    }

    /// Fill in the `watched` flags of a series detail. Movies are untouched.
    pub async fn apply_to(
        &self,
        user: Option<UserId>,
        detail: &mut MediaDetail,
    ) -> Result<()> {
        if detail.media_type() != MediaType::Series {
            return Ok(());
        }
        let watched = self.watched_in_series(user, detail.base.id).await?;
        detail.apply_episode_watch_view(|key| watched.contains(key));
        Ok(())
    }
}

use std::sync::Arc;

use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::database::{LocalStore, SqliteLocalStore};
use crate::episodes::EpisodeWatchLog;
use crate::error::Result;
use crate::janitor::CacheJanitor;
use crate::network::{HttpProbe, MonitorHandle, NetworkMonitor};
use crate::paging::{PageProvider, PageQuery};
use crate::providers::{RemoteSource, TmdbRemoteSource};
use crate::relations::RelationRepository;
use crate::sync::SyncRepository;
use crate::users::UserStore;

/// Wires every component around one shared store handle.
#[derive(Debug)]
pub struct Catalog {
    config: SyncConfig,
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteSource>,
    network: NetworkMonitor,
    sync: SyncRepository,
    favorites: RelationRepository,
    watched: RelationRepository,
    episodes: EpisodeWatchLog,
    users: UserStore,
    janitor: CacheJanitor,
    monitor: Option<MonitorHandle>,
}

impl Catalog {
    /// Open the SQLite store and TMDB client described by `config`, start the
    /// connectivity poll when a probe URL is set, then purge everything but
    /// favorites from the cache.
    pub async fn open(config: SyncConfig) -> Result<Self> {
        config.validate()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store: Arc<dyn LocalStore> = match &config.database_path {
            Some(path) => Arc::new(SqliteLocalStore::open(path).await?),
            None => Arc::new(SqliteLocalStore::in_memory().await?),
        };
        let remote: Arc<dyn RemoteSource> =
            Arc::new(TmdbRemoteSource::new(&config, Arc::clone(&clock))?);

        let network = NetworkMonitor::new(true);
        let monitor = match &config.probe_url {
            Some(url) => {
                let probe = HttpProbe::new(url.clone(), config.request_timeout)?;
                Some(network.spawn(Arc::new(probe), config.poll_interval, None))
            }
            None => None,
        };

        let mut catalog =
            Self::with_parts(config, store, remote, network, clock).await?;
        catalog.monitor = monitor;
        Ok(catalog)
    }

    /// Assemble from explicit parts. Runs the startup purge.
    pub async fn with_parts(
        config: SyncConfig,
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteSource>,
        network: NetworkMonitor,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let sync = SyncRepository::new(
            Arc::clone(&store),
            Arc::clone(&remote),
            network.clone(),
            Arc::clone(&clock),
            &config,
        );
        let janitor = CacheJanitor::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.retention(),
        );

        if let Err(err) = janitor.purge_except_favorites().await {
            warn!("Startup cache purge failed: {}", err);
        }

        info!("Catalog ready (online: {})", network.is_online());
        Ok(Self {
            favorites: RelationRepository::favorites(
                Arc::clone(&store),
                Arc::clone(&clock),
            ),
            watched: RelationRepository::watched(
                Arc::clone(&store),
                Arc::clone(&clock),
            ),
            episodes: EpisodeWatchLog::new(Arc::clone(&store), clock),
            users: UserStore::new(Arc::clone(&store)),
            config,
            store,
            remote,
            network,
            sync,
            janitor,
            monitor: None,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.store
    }

    pub fn network(&self) -> &NetworkMonitor {
        &self.network
    }

    pub fn sync(&self) -> &SyncRepository {
        &self.sync
    }

    pub fn favorites(&self) -> &RelationRepository {
        &self.favorites
    }

    pub fn watched(&self) -> &RelationRepository {
        &self.watched
    }

    pub fn episodes(&self) -> &EpisodeWatchLog {
        &self.episodes
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn janitor(&self) -> &CacheJanitor {
        &self.janitor
    }

    /// A fresh pager over `query`.
    pub fn page_provider(&self, query: PageQuery) -> PageProvider {
        PageProvider::new(
            Arc::clone(&self.store),
            Arc::clone(&self.remote),
            query,
            &self.config,
        )
    }

    /// Stop the connectivity poll and close the store.
    pub async fn shutdown(mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.shutdown();
        }
        self.store.close().await;
        info!("Catalog shut down");
    }
}

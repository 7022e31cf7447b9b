//! Connectivity state shared by every read path.
//!
//! The state is a single boolean held in a `watch` channel. Platform
//! notifications are pushed in through [`NetworkMonitor::report`] (or the
//! push channel handed to [`NetworkMonitor::spawn`]); a periodic probe covers
//! notifications the platform never delivers. Repeated reports of the same
//! state do not wake subscribers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use crate::error::Result;

/// Answers "can we reach the content API right now?".
#[async_trait]
pub trait ConnectivityProbe: Send + Sync + std::fmt::Debug {
    async fn check(&self) -> bool;
}

/// Probe that issues a `HEAD` request. Any HTTP response counts as online;
/// only transport failures and timeouts count as offline.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    http: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn check(&self) -> bool {
        match self.http.head(&self.url).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!("Connectivity probe to {} failed: {}", self.url, e);
                false
            }
        }
    }
}

/// Clonable handle over the current connectivity state.
#[derive(Clone, Debug)]
pub struct NetworkMonitor {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl NetworkMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (sender, receiver) = watch::channel(initially_online);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn is_online(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Record an observation. Returns `true` when it changed the state.
    pub fn report(&self, online: bool) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
        if changed {
            info!(
                "Connectivity changed: {}",
                if online { "online" } else { "offline" }
            );
        }
        changed
    }

    /// Current state first, then every distinct transition.
    pub fn subscribe(&self) -> WatchStream<bool> {
        WatchStream::new(self.receiver.clone())
    }

    pub fn receiver(&self) -> watch::Receiver<bool> {
        self.receiver.clone()
    }

    /// Start the backup poll, optionally merged with pushed platform
    /// notifications. The task stops when the returned handle is dropped.
    pub fn spawn(
        &self,
        probe: Arc<dyn ConnectivityProbe>,
        poll_interval: Duration,
        pushes: Option<mpsc::Receiver<bool>>,
    ) -> MonitorHandle {
        let monitor = self.clone();
        let task = tokio::spawn(async move {
            monitor.run(probe, poll_interval, pushes).await;
        });
        MonitorHandle { task }
    }

    async fn run(
        self,
        probe: Arc<dyn ConnectivityProbe>,
        poll_interval: Duration,
        mut pushes: Option<mpsc::Receiver<bool>>,
    ) {
        // One probe up front, then one per `poll_interval`.
        let online = probe.check().await;
        self.report(online);

        let mut ticker =
            tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let online = probe.check().await;
                    self.report(online);
                }
                pushed = next_push(&mut pushes), if pushes.is_some() => {
                    match pushed {
                        Some(online) => {
                            self.report(online);
                        }
                        None => {
                            debug!("Connectivity push channel closed; polling only");
                            pushes = None;
                        }
                    }
                }
            }
        }
    }
}

async fn next_push(pushes: &mut Option<mpsc::Receiver<bool>>) -> Option<bool> {
    match pushes {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Owns the monitor task and aborts it on drop.
#[derive(Debug)]
pub struct MonitorHandle {
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn shutdown(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_reports_are_not_changes() {
        let monitor = NetworkMonitor::new(true);
        assert!(!monitor.report(true));
        assert!(monitor.report(false));
        assert!(!monitor.report(false));
        assert!(!monitor.is_online());
    }
}

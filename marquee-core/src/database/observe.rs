//! Live queries over the local store.
//!
//! A subscription runs its query once, then again after every relevant
//! [`StoreChange`]. Consecutive equal results are collapsed so subscribers
//! only see distinct snapshots.

use std::future::Future;
use std::sync::Arc;

use futures::stream::BoxStream;
use marquee_model::{MediaItem, MediaType, StoreOrder};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use super::ports::{LocalStore, StoreChange};
use crate::error::{Result, SyncError};

pub type Subscription<T> = BoxStream<'static, Result<T>>;

/// Re-run `query` whenever the store reports a change accepted by
/// `is_relevant`. Query failures are forwarded and the subscription keeps
/// listening.
pub fn observe<T, P, F, Fut>(
    store: Arc<dyn LocalStore>,
    is_relevant: P,
    query: F,
) -> Subscription<T>
where
    T: PartialEq + Clone + Send + 'static,
    P: Fn(&StoreChange) -> bool + Send + 'static,
    F: Fn(Arc<dyn LocalStore>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        // Subscribe before the first read so no write slips between them.
        let mut changes = store.changes();
        let mut last: Option<T> = None;

        'observe: loop {
            match query(Arc::clone(&store)).await {
                Ok(value) => {
                    if last.as_ref() != Some(&value) {
                        last = Some(value.clone());
                        yield Ok(value);
                    }
                }
                Err(e) => yield Err(e),
            }

            loop {
                match changes.recv().await {
                    Ok(change) if is_relevant(&change) => break,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Subscription lagged by {} changes, re-reading", skipped);
                        break;
                    }
                    Err(RecvError::Closed) => break 'observe,
                }
            }
        }
    })
}

/// Every cached summary of `media_type`, kept current.
pub fn observe_media(
    store: Arc<dyn LocalStore>,
    media_type: MediaType,
    order: StoreOrder,
) -> Subscription<Vec<MediaItem>> {
    observe(
        store,
        move |change| matches!(change, StoreChange::Media(t) if *t == media_type),
        move |store| async move {
            let items = store.all_media(media_type, order).await?;
            let listed: Vec<MediaItem> =
                items.into_iter().filter(|item| !item.is_stub()).collect();
            Ok::<_, SyncError>(listed)
        },
    )
}

//! Change notifications and live queries.
//!
//! Every repository write publishes a [`StoreChange`] on a shared [`ChangeFeed`].
//! A [`LiveQuery`] listens on the feed, re-runs its query whenever a relevant
//! change arrives and publishes the full result set on a `watch` channel.

use std::future::Future;

use quizzy_core::model::StudySetId;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::repository::StorageError;

const FEED_CAPACITY: usize = 64;

/// A write that happened in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// A study set row was inserted or updated.
    StudySetChanged(StudySetId),
    /// A study set was deleted together with all of its flashcards.
    StudySetDeleted(StudySetId),
    /// One or more flashcards of the set were inserted, updated or deleted.
    FlashcardsChanged(StudySetId),
}

impl StoreChange {
    /// The set whose rows were touched.
    #[must_use]
    pub fn study_set_id(&self) -> StudySetId {
        match self {
            Self::StudySetChanged(id) | Self::StudySetDeleted(id) | Self::FlashcardsChanged(id) => {
                *id
            }
        }
    }

    /// True when the flashcard list of `set_id` may have changed.
    #[must_use]
    pub fn affects_flashcards_of(&self, set_id: StudySetId) -> bool {
        match self {
            Self::FlashcardsChanged(id) | Self::StudySetDeleted(id) => *id == set_id,
            Self::StudySetChanged(_) => false,
        }
    }
}

/// Broadcast channel shared by a store backend and its live queries.
#[derive(Clone, Debug)]
pub struct ChangeFeed {
    tx: broadcast::Sender<StoreChange>,
}

impl ChangeFeed {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, change: StoreChange) {
        if self.tx.send(change).is_err() {
            log::trace!("no live queries listening for {change:?}");
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// A query result that is kept up to date with the store.
///
/// Dropping the handle cancels the background refresh task.
pub struct LiveQuery<T> {
    rx: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> LiveQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Run `fetch` once and keep re-running it for every change accepted by `filter`.
    ///
    /// The feed subscription is taken before the initial fetch so no write can
    /// slip between the two.
    ///
    /// # Errors
    ///
    /// Returns the initial fetch error; later refresh errors are logged and the
    /// previous result stays visible.
    pub async fn start<P, F, Fut>(
        feed: &ChangeFeed,
        filter: P,
        fetch: F,
    ) -> Result<Self, StorageError>
    where
        P: Fn(&StoreChange) -> bool + Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, StorageError>> + Send + 'static,
    {
        let mut changes = feed.subscribe();
        let initial = fetch().await?;
        let (tx, rx) = watch::channel(initial);

        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) if !filter(&change) => continue,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        log::debug!("live query lagged by {skipped} changes, refreshing");
                    }
                    Err(RecvError::Closed) => break,
                }

                match fetch().await {
                    Ok(value) => {
                        if tx.send(value).is_err() {
                            break;
                        }
                    }
                    Err(e) => log::warn!("live query refresh failed: {e}"),
                }
            }
        });

        Ok(Self { rx, task })
    }

    /// Latest published result.
    #[must_use]
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait for the next emission. Returns `None` once the query has stopped.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

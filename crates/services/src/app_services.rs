use std::sync::Arc;

use storage::repository::{InMemoryRepository, Storage};

use crate::config::WriteRetryPolicy;
use crate::error::AppServicesError;
use crate::sessions::StudySessionService;
use crate::study_set_service::StudySetService;

/// Assembles app-facing services over one store handle.
#[derive(Clone)]
pub struct AppServices {
    study_sets: Arc<StudySetService>,
    sessions: Arc<StudySessionService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, running migrations first.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, retry: WriteRetryPolicy) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, retry))
    }

    /// Services over a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_storage(
            &Storage::from_in_memory(InMemoryRepository::new()),
            WriteRetryPolicy::default(),
        )
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, retry: WriteRetryPolicy) -> Self {
        let study_sets = StudySetService::new(storage).with_retry_policy(retry);
        let sessions = StudySessionService::new(study_sets.clone());
        Self {
            study_sets: Arc::new(study_sets),
            sessions: Arc::new(sessions),
        }
    }

    #[must_use]
    pub fn study_sets(&self) -> Arc<StudySetService> {
        Arc::clone(&self.study_sets)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<StudySessionService> {
        Arc::clone(&self.sessions)
    }
}

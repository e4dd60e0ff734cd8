use async_trait::async_trait;
use quizzy_core::model::{
    Flashcard, FlashcardId, StudySet, StudySetId, StudySetSummary, ValidatedFlashcard,
    ValidatedStudySet,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::live::{ChangeFeed, StoreChange};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for study sets.
#[async_trait]
pub trait StudySetRepository: Send + Sync {
    /// Insert a new set and return its store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be stored.
    async fn insert_study_set(&self, set: &ValidatedStudySet) -> Result<StudySetId, StorageError>;

    /// Replace the stored record with the same id, inserting it if missing.
    ///
    /// Owned flashcards are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be stored.
    async fn upsert_study_set(&self, set: &StudySet) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` for backend failures; a missing set is `Ok(None)`.
    async fn get_study_set(&self, id: StudySetId) -> Result<Option<StudySet>, StorageError>;

    /// All sets with their card counts, ordered by title ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn list_study_sets_with_counts(&self) -> Result<Vec<StudySetSummary>, StorageError>;

    /// Delete a set and every flashcard it owns.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the set does not exist.
    async fn delete_study_set(&self, id: StudySetId) -> Result<(), StorageError>;
}

/// Repository contract for flashcards.
#[async_trait]
pub trait FlashcardRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the owning set does not exist.
    async fn insert_flashcard(&self, card: &ValidatedFlashcard)
    -> Result<FlashcardId, StorageError>;

    /// Update term, definition and known flag. The owning set never changes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the card does not exist.
    async fn update_flashcard(&self, card: &Flashcard) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` for backend failures; a missing card is `Ok(None)`.
    async fn get_flashcard(&self, id: FlashcardId) -> Result<Option<Flashcard>, StorageError>;

    /// Cards of a set, ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn flashcards_for_set(&self, set_id: StudySetId)
    -> Result<Vec<Flashcard>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the card does not exist.
    async fn delete_flashcard(&self, id: FlashcardId) -> Result<(), StorageError>;

    /// Single-column update of the known flag.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the card does not exist.
    async fn set_known_status(&self, id: FlashcardId, known: bool) -> Result<(), StorageError>;
}

#[derive(Default)]
struct MemoryTables {
    sets: BTreeMap<StudySetId, StudySet>,
    cards: BTreeMap<FlashcardId, Flashcard>,
    last_set_id: u64,
    last_card_id: u64,
    #[cfg(any(test, feature = "test-support"))]
    failing_writes: u32,
}

impl MemoryTables {
    #[cfg(any(test, feature = "test-support"))]
    fn check_write(&mut self) -> Result<(), StorageError> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(StorageError::Connection("injected write failure".into()));
        }
        Ok(())
    }

    #[cfg(not(any(test, feature = "test-support")))]
    #[allow(clippy::unnecessary_wraps, clippy::unused_self)]
    fn check_write(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Ids are handed out from monotonic counters, so they are never reused.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<MemoryTables>>,
    feed: ChangeFeed,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn changes(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Make the next `count` writes fail with a connection error.
    #[cfg(any(test, feature = "test-support"))]
    pub fn fail_next_writes(&self, count: u32) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.failing_writes = count;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryTables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl StudySetRepository for InMemoryRepository {
    async fn insert_study_set(&self, set: &ValidatedStudySet) -> Result<StudySetId, StorageError> {
        let id = {
            let mut tables = self.lock()?;
            tables.check_write()?;
            tables.last_set_id += 1;
            let id = StudySetId::new(tables.last_set_id);
            tables.sets.insert(id, set.clone().assign_id(id));
            id
        };
        self.feed.publish(StoreChange::StudySetChanged(id));
        Ok(id)
    }

    async fn upsert_study_set(&self, set: &StudySet) -> Result<(), StorageError> {
        {
            let mut tables = self.lock()?;
            tables.check_write()?;
            tables.last_set_id = tables.last_set_id.max(set.id().value());
            tables.sets.insert(set.id(), set.clone());
        }
        self.feed.publish(StoreChange::StudySetChanged(set.id()));
        Ok(())
    }

    async fn get_study_set(&self, id: StudySetId) -> Result<Option<StudySet>, StorageError> {
        Ok(self.lock()?.sets.get(&id).cloned())
    }

    async fn list_study_sets_with_counts(&self) -> Result<Vec<StudySetSummary>, StorageError> {
        let tables = self.lock()?;
        let mut summaries: Vec<StudySetSummary> = tables
            .sets
            .values()
            .map(|set| {
                let count = tables
                    .cards
                    .values()
                    .filter(|card| card.set_id() == set.id())
                    .count();
                StudySetSummary {
                    study_set: set.clone(),
                    card_count: u32::try_from(count).unwrap_or(u32::MAX),
                }
            })
            .collect();
        summaries.sort_by(|a, b| {
            a.study_set
                .title()
                .cmp(b.study_set.title())
                .then_with(|| a.study_set.id().cmp(&b.study_set.id()))
        });
        Ok(summaries)
    }

    async fn delete_study_set(&self, id: StudySetId) -> Result<(), StorageError> {
        {
            let mut tables = self.lock()?;
            tables.check_write()?;
            if tables.sets.remove(&id).is_none() {
                return Err(StorageError::NotFound);
            }
            tables.cards.retain(|_, card| card.set_id() != id);
        }
        self.feed.publish(StoreChange::StudySetDeleted(id));
        Ok(())
    }
}

#[async_trait]
impl FlashcardRepository for InMemoryRepository {
    async fn insert_flashcard(
        &self,
        card: &ValidatedFlashcard,
    ) -> Result<FlashcardId, StorageError> {
        let id = {
            let mut tables = self.lock()?;
            tables.check_write()?;
            if !tables.sets.contains_key(&card.set_id()) {
                return Err(StorageError::Conflict);
            }
            tables.last_card_id += 1;
            let id = FlashcardId::new(tables.last_card_id);
            tables.cards.insert(id, card.clone().assign_id(id));
            id
        };
        self.feed
            .publish(StoreChange::FlashcardsChanged(card.set_id()));
        Ok(id)
    }

    async fn update_flashcard(&self, card: &Flashcard) -> Result<(), StorageError> {
        let set_id = {
            let mut tables = self.lock()?;
            tables.check_write()?;
            let stored = tables
                .cards
                .get_mut(&card.id())
                .ok_or(StorageError::NotFound)?;
            let updated = stored
                .edited(card.term(), card.definition())
                .map_err(|e| StorageError::Serialization(e.to_string()))?
                .with_known(card.is_known());
            *stored = updated;
            stored.set_id()
        };
        self.feed.publish(StoreChange::FlashcardsChanged(set_id));
        Ok(())
    }

    async fn get_flashcard(&self, id: FlashcardId) -> Result<Option<Flashcard>, StorageError> {
        Ok(self.lock()?.cards.get(&id).cloned())
    }

    async fn flashcards_for_set(
        &self,
        set_id: StudySetId,
    ) -> Result<Vec<Flashcard>, StorageError> {
        // BTreeMap iteration is already ordered by id.
        Ok(self
            .lock()?
            .cards
            .values()
            .filter(|card| card.set_id() == set_id)
            .cloned()
            .collect())
    }

    async fn delete_flashcard(&self, id: FlashcardId) -> Result<(), StorageError> {
        let set_id = {
            let mut tables = self.lock()?;
            tables.check_write()?;
            tables
                .cards
                .remove(&id)
                .ok_or(StorageError::NotFound)?
                .set_id()
        };
        self.feed.publish(StoreChange::FlashcardsChanged(set_id));
        Ok(())
    }

    async fn set_known_status(&self, id: FlashcardId, known: bool) -> Result<(), StorageError> {
        let set_id = {
            let mut tables = self.lock()?;
            tables.check_write()?;
            let card = tables.cards.remove(&id).ok_or(StorageError::NotFound)?;
            let set_id = card.set_id();
            tables.cards.insert(id, card.with_known(known));
            set_id
        };
        self.feed.publish(StoreChange::FlashcardsChanged(set_id));
        Ok(())
    }
}

/// Aggregates the repositories and their change feed behind trait objects
/// for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub study_sets: Arc<dyn StudySetRepository>,
    pub flashcards: Arc<dyn FlashcardRepository>,
    pub changes: ChangeFeed,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let changes = repo.changes().clone();
        let study_sets: Arc<dyn StudySetRepository> = Arc::new(repo.clone());
        let flashcards: Arc<dyn FlashcardRepository> = Arc::new(repo);
        Self {
            study_sets,
            flashcards,
            changes,
        }
    }
}

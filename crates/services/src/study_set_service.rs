use std::sync::Arc;

use quizzy_core::model::{
    Flashcard, FlashcardDraft, FlashcardId, StudySet, StudySetDraft, StudySetId, StudySetSummary,
};
use storage::live::{ChangeFeed, LiveQuery};
use storage::repository::{FlashcardRepository, Storage, StorageError, StudySetRepository};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::WriteRetryPolicy;
use crate::error::StudySetServiceError;

/// Final state of a background known-status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownStatusWrite {
    Saved,
    /// The card was deleted before the write landed.
    Vanished,
    /// Every attempt failed.
    Failed,
}

/// Orchestrates study set and flashcard persistence.
#[derive(Clone)]
pub struct StudySetService {
    study_sets: Arc<dyn StudySetRepository>,
    flashcards: Arc<dyn FlashcardRepository>,
    changes: ChangeFeed,
    retry: WriteRetryPolicy,
    pending_writes: Arc<watch::Sender<usize>>,
    runtime: Option<Handle>,
}

impl StudySetService {
    #[must_use]
    pub fn new(storage: &Storage) -> Self {
        Self {
            study_sets: Arc::clone(&storage.study_sets),
            flashcards: Arc::clone(&storage.flashcards),
            changes: storage.changes.clone(),
            retry: WriteRetryPolicy::default(),
            pending_writes: Arc::new(watch::channel(0).0),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Override how background known-status writes are retried.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: WriteRetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runtime that background writes are spawned on.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Pin background writes to the calling runtime unless one is already set.
    pub(crate) fn bind_current_runtime(mut self) -> Self {
        if self.runtime.is_none() {
            self.runtime = Handle::try_current().ok();
        }
        self
    }

    #[must_use]
    pub fn retry_policy(&self) -> WriteRetryPolicy {
        self.retry
    }

    #[must_use]
    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    //
    // ─── STUDY SETS ────────────────────────────────────────────────────────────
    //

    /// Validate and persist a new study set.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::Validation` if the title is blank; nothing
    /// is stored in that case.
    /// Returns `StudySetServiceError::Storage` if persistence fails.
    pub async fn create_study_set(
        &self,
        title: &str,
        description: &str,
    ) -> Result<StudySetId, StudySetServiceError> {
        let validated = StudySetDraft::new(title, description).validate()?;
        let id = self.study_sets.insert_study_set(&validated).await?;
        log::debug!("created study set {id} ({:?})", validated.title());
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `StudySetServiceError::NotFound` if the set does not exist.
    pub async fn get_study_set(&self, id: StudySetId) -> Result<StudySet, StudySetServiceError> {
        self.study_sets
            .get_study_set(id)
            .await?
            .ok_or(StudySetServiceError::NotFound)
    }

    /// Fetch a set together with its cards ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::NotFound` if the set does not exist.
    /// Returns `StudySetServiceError::Storage` if repository access fails.
    pub async fn get_study_set_with_cards(
        &self,
        id: StudySetId,
    ) -> Result<(StudySet, Vec<Flashcard>), StudySetServiceError> {
        let set = self.get_study_set(id).await?;
        let cards = self.flashcards.flashcards_for_set(id).await?;
        Ok((set, cards))
    }

    /// All sets with card counts, ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::Storage` if repository access fails.
    pub async fn list_study_sets_with_counts(
        &self,
    ) -> Result<Vec<StudySetSummary>, StudySetServiceError> {
        Ok(self.study_sets.list_study_sets_with_counts().await?)
    }

    /// Live version of [`Self::list_study_sets_with_counts`]; re-emits on any
    /// set or card change.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::Storage` if the initial fetch fails.
    pub async fn watch_study_sets(
        &self,
    ) -> Result<LiveQuery<Vec<StudySetSummary>>, StudySetServiceError> {
        let sets = Arc::clone(&self.study_sets);
        let query = LiveQuery::start(
            &self.changes,
            |_| true,
            move || {
                let sets = Arc::clone(&sets);
                async move { sets.list_study_sets_with_counts().await }
            },
        )
        .await?;
        Ok(query)
    }

    /// Live card list of one set, ordered by id.
    ///
    /// A deleted set yields an empty list rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::Storage` if the initial fetch fails.
    pub async fn watch_flashcards(
        &self,
        set_id: StudySetId,
    ) -> Result<LiveQuery<Vec<Flashcard>>, StudySetServiceError> {
        let cards = Arc::clone(&self.flashcards);
        let query = LiveQuery::start(
            &self.changes,
            move |change| change.affects_flashcards_of(set_id),
            move || {
                let cards = Arc::clone(&cards);
                async move { cards.flashcards_for_set(set_id).await }
            },
        )
        .await?;
        Ok(query)
    }

    /// Store `set` under its id, replacing any existing record.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::Validation` if the title is blank.
    /// Returns `StudySetServiceError::Storage` if persistence fails.
    pub async fn update_study_set(&self, set: &StudySet) -> Result<(), StudySetServiceError> {
        let checked = StudySet::new(set.id(), set.title(), set.description())?;
        self.study_sets.upsert_study_set(&checked).await?;
        Ok(())
    }

    /// Change the title of an existing set, and its description when one is
    /// given; `None` keeps the current description.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::NotFound` if the set does not exist.
    /// Returns `StudySetServiceError::Validation` if the title is blank.
    pub async fn rename_study_set(
        &self,
        id: StudySetId,
        title: &str,
        description: Option<&str>,
    ) -> Result<(), StudySetServiceError> {
        let existing = self.get_study_set(id).await?;
        let description = description.unwrap_or(existing.description());
        let renamed = StudySet::new(id, title, description)?;
        self.study_sets.upsert_study_set(&renamed).await?;
        Ok(())
    }

    /// Delete a set and all of its cards.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::NotFound` if the set does not exist.
    pub async fn delete_study_set(&self, id: StudySetId) -> Result<(), StudySetServiceError> {
        self.study_sets.delete_study_set(id).await?;
        log::debug!("deleted study set {id}");
        Ok(())
    }

    //
    // ─── FLASHCARDS ────────────────────────────────────────────────────────────
    //

    /// Validate and persist a new card in `set_id`.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::Validation` if term or definition is blank.
    /// Returns `StudySetServiceError::NotFound` if the set does not exist.
    pub async fn add_flashcard(
        &self,
        set_id: StudySetId,
        term: &str,
        definition: &str,
    ) -> Result<FlashcardId, StudySetServiceError> {
        let validated = FlashcardDraft::new(set_id, term, definition).validate()?;
        match self.flashcards.insert_flashcard(&validated).await {
            Ok(id) => Ok(id),
            Err(StorageError::Conflict) => Err(StudySetServiceError::NotFound),
            Err(other) => Err(other.into()),
        }
    }

    /// Persist term, definition and known flag of an existing card.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::Validation` if term or definition is blank.
    /// Returns `StudySetServiceError::NotFound` if the card does not exist.
    pub async fn update_flashcard(&self, card: &Flashcard) -> Result<(), StudySetServiceError> {
        let checked = Flashcard::from_persisted(
            card.id(),
            card.set_id(),
            card.term(),
            card.definition(),
            card.is_known(),
        )?;
        self.flashcards.update_flashcard(&checked).await?;
        Ok(())
    }

    /// Replace the text of a card, keeping its known flag.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::NotFound` if the card does not exist.
    /// Returns `StudySetServiceError::Validation` if term or definition is blank.
    pub async fn edit_flashcard(
        &self,
        id: FlashcardId,
        term: &str,
        definition: &str,
    ) -> Result<Flashcard, StudySetServiceError> {
        let card = self.get_flashcard(id).await?;
        let edited = card.edited(term, definition)?;
        self.flashcards.update_flashcard(&edited).await?;
        Ok(edited)
    }

    /// # Errors
    ///
    /// Returns `StudySetServiceError::NotFound` if the card does not exist.
    pub async fn get_flashcard(&self, id: FlashcardId) -> Result<Flashcard, StudySetServiceError> {
        self.flashcards
            .get_flashcard(id)
            .await?
            .ok_or(StudySetServiceError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `StudySetServiceError::NotFound` if the card does not exist.
    pub async fn delete_flashcard(&self, id: FlashcardId) -> Result<(), StudySetServiceError> {
        self.flashcards.delete_flashcard(id).await?;
        Ok(())
    }

    /// Set the known flag of one card. Repeating the call is harmless.
    ///
    /// # Errors
    ///
    /// Returns `StudySetServiceError::NotFound` if the card does not exist.
    pub async fn set_known_status(
        &self,
        id: FlashcardId,
        known: bool,
    ) -> Result<(), StudySetServiceError> {
        self.flashcards.set_known_status(id, known).await?;
        Ok(())
    }

    /// Write the known flag in the background, retrying transient failures.
    ///
    /// Safe to call from threads outside the runtime: the write goes to the
    /// runtime captured at construction (or the caller's, if none was).
    /// Returns `None`, and logs, when no runtime is reachable. The handle may
    /// be dropped; the write keeps running.
    pub fn spawn_known_status(
        &self,
        id: FlashcardId,
        known: bool,
    ) -> Option<JoinHandle<KnownStatusWrite>> {
        let Some(runtime) = self
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        else {
            log::error!("no runtime to save known={known} for flashcard {id}");
            return None;
        };
        let flashcards = Arc::clone(&self.flashcards);
        let retry = self.retry;
        let pending = Arc::clone(&self.pending_writes);
        pending.send_modify(|n| *n += 1);
        Some(runtime.spawn(async move {
            let outcome = write_known_status(flashcards.as_ref(), retry, id, known).await;
            pending.send_modify(|n| *n = n.saturating_sub(1));
            outcome
        }))
    }

    /// Wait until every background write started so far has finished.
    pub async fn flush_pending_writes(&self) {
        let mut pending = self.pending_writes.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = pending.wait_for(|n| *n == 0).await;
    }
}

async fn write_known_status(
    flashcards: &dyn FlashcardRepository,
    retry: WriteRetryPolicy,
    id: FlashcardId,
    known: bool,
) -> KnownStatusWrite {
    let attempts = retry.attempts();
    for attempt in 1..=attempts {
        match flashcards.set_known_status(id, known).await {
            Ok(()) => return KnownStatusWrite::Saved,
            Err(StorageError::NotFound) => {
                log::debug!("flashcard {id} was deleted before known={known} was saved");
                return KnownStatusWrite::Vanished;
            }
            Err(e) if attempt < attempts => {
                log::warn!("saving known={known} for flashcard {id} failed (attempt {attempt}/{attempts}): {e}");
                tokio::time::sleep(retry.delay_after(attempt)).await;
            }
            Err(e) => {
                log::error!("giving up on known={known} for flashcard {id} after {attempts} attempts: {e}");
            }
        }
    }
    KnownStatusWrite::Failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use quizzy_core::ValidationError;
    use storage::repository::InMemoryRepository;

    fn service_with(repo: &InMemoryRepository) -> StudySetService {
        StudySetService::new(&Storage::from_in_memory(repo.clone()))
            .with_retry_policy(WriteRetryPolicy::new(3, Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn blank_title_is_rejected_without_insert() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);

        let err = service.create_study_set("   ", "desc").await.unwrap_err();
        assert!(matches!(
            err,
            StudySetServiceError::Validation(ValidationError::StudySet(_))
        ));
        assert!(service.list_study_sets_with_counts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_flashcard_to_missing_set_is_not_found() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);

        let err = service
            .add_flashcard(StudySetId::new(42), "term", "definition")
            .await
            .unwrap_err();
        assert!(matches!(err, StudySetServiceError::NotFound));
    }

    #[tokio::test]
    async fn blank_card_fields_are_rejected() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set = service.create_study_set("Set", "").await.unwrap();

        let err = service.add_flashcard(set, "term", " ").await.unwrap_err();
        assert!(matches!(
            err,
            StudySetServiceError::Validation(ValidationError::Flashcard(_))
        ));
    }

    #[tokio::test]
    async fn get_with_cards_returns_cards_in_id_order() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set = service.create_study_set("Spanish", "basics").await.unwrap();
        let a = service.add_flashcard(set, "uno", "one").await.unwrap();
        let b = service.add_flashcard(set, "dos", "two").await.unwrap();

        let (loaded, cards) = service.get_study_set_with_cards(set).await.unwrap();
        assert_eq!(loaded.title(), "Spanish");
        assert_eq!(cards.iter().map(Flashcard::id).collect::<Vec<_>>(), vec![a, b]);

        assert!(matches!(
            service.get_study_set_with_cards(StudySetId::new(99)).await,
            Err(StudySetServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn rename_keeps_description_and_cards() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set = service.create_study_set("Old", "notes").await.unwrap();
        service.add_flashcard(set, "t", "d").await.unwrap();

        service.rename_study_set(set, "New", None).await.unwrap();

        let (loaded, cards) = service.get_study_set_with_cards(set).await.unwrap();
        assert_eq!(loaded.title(), "New");
        assert_eq!(loaded.description(), "notes");
        assert_eq!(cards.len(), 1);
        assert!(service.rename_study_set(set, "", None).await.is_err());
    }

    #[tokio::test]
    async fn rename_can_replace_description() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set = service.create_study_set("Old", "notes").await.unwrap();

        service
            .rename_study_set(set, "New", Some("  fresh notes "))
            .await
            .unwrap();
        let loaded = service.get_study_set(set).await.unwrap();
        assert_eq!(loaded.title(), "New");
        assert_eq!(loaded.description(), "fresh notes");
    }

    #[tokio::test]
    async fn edit_keeps_known_flag() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set = service.create_study_set("S", "").await.unwrap();
        let card = service.add_flashcard(set, "gato", "cat").await.unwrap();
        service.set_known_status(card, true).await.unwrap();

        let edited = service.edit_flashcard(card, "perro", "dog").await.unwrap();
        assert!(edited.is_known());
        assert_eq!(edited.term(), "perro");
    }

    #[tokio::test]
    async fn background_write_retries_transient_failures() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set = service.create_study_set("S", "").await.unwrap();
        let card = service.add_flashcard(set, "t", "d").await.unwrap();

        repo.fail_next_writes(2);
        let outcome = service.spawn_known_status(card, true).unwrap().await.unwrap();
        assert_eq!(outcome, KnownStatusWrite::Saved);
        let (_, cards) = service.get_study_set_with_cards(set).await.unwrap();
        assert!(cards[0].is_known());
    }

    #[tokio::test]
    async fn background_write_gives_up_after_policy_attempts() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set = service.create_study_set("S", "").await.unwrap();
        let card = service.add_flashcard(set, "t", "d").await.unwrap();

        repo.fail_next_writes(3);
        let outcome = service.spawn_known_status(card, true).unwrap().await.unwrap();
        assert_eq!(outcome, KnownStatusWrite::Failed);
    }

    #[tokio::test]
    async fn flush_waits_for_background_writes() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set = service.create_study_set("S", "").await.unwrap();
        let a = service.add_flashcard(set, "a", "1").await.unwrap();
        let b = service.add_flashcard(set, "b", "2").await.unwrap();

        repo.fail_next_writes(1);
        drop(service.spawn_known_status(a, true));
        drop(service.spawn_known_status(b, true));
        service.flush_pending_writes().await;

        let (_, cards) = service.get_study_set_with_cards(set).await.unwrap();
        assert!(cards.iter().all(Flashcard::is_known));
    }

    #[test]
    fn background_write_without_runtime_is_skipped() {
        let service = StudySetService::new(&Storage::from_in_memory(InMemoryRepository::new()));
        assert!(service.spawn_known_status(FlashcardId::new(1), true).is_none());
    }

    #[tokio::test]
    async fn background_write_from_plain_thread_uses_captured_runtime() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set = service.create_study_set("S", "").await.unwrap();
        let card = service.add_flashcard(set, "t", "d").await.unwrap();

        let worker = service.clone();
        let spawned = std::thread::spawn(move || worker.spawn_known_status(card, true).is_some())
            .join()
            .unwrap();
        assert!(spawned);
        service.flush_pending_writes().await;
        assert!(service.get_flashcard(card).await.unwrap().is_known());
    }

    #[tokio::test]
    async fn update_flashcard_and_study_set_records() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set_id = service.create_study_set("Draft", "").await.unwrap();
        let card_id = service.add_flashcard(set_id, "t", "d").await.unwrap();

        let set = StudySet::new(set_id, "Final", "described").unwrap();
        service.update_study_set(&set).await.unwrap();
        assert_eq!(service.get_study_set(set_id).await.unwrap(), set);

        let card = service.get_flashcard(card_id).await.unwrap().with_known(true);
        service.update_flashcard(&card).await.unwrap();
        assert!(service.get_flashcard(card_id).await.unwrap().is_known());

        let missing = Flashcard::from_persisted(FlashcardId::new(77), set_id, "x", "y", false).unwrap();
        assert!(matches!(
            service.update_flashcard(&missing).await,
            Err(StudySetServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn background_write_to_deleted_card_is_tolerated() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set = service.create_study_set("S", "").await.unwrap();
        let card = service.add_flashcard(set, "t", "d").await.unwrap();
        service.delete_flashcard(card).await.unwrap();

        let outcome = service.spawn_known_status(card, true).unwrap().await.unwrap();
        assert_eq!(outcome, KnownStatusWrite::Vanished);
    }

    #[tokio::test]
    async fn watched_list_re_emits_on_card_insert() {
        let repo = InMemoryRepository::new();
        let service = service_with(&repo);
        let set = service.create_study_set("Live", "").await.unwrap();

        let mut live = service.watch_study_sets().await.unwrap();
        assert_eq!(live.current()[0].card_count, 0);

        service.add_flashcard(set, "t", "d").await.unwrap();
        let update = tokio::time::timeout(Duration::from_secs(1), live.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(update[0].card_count, 1);
    }
}

//! Sessions that stay in sync with the store.
//!
//! A [`LiveSession`] owns one study state behind a mutex, follows the live
//! flashcard query of its set and publishes a fresh snapshot after every
//! mutation and every refresh.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quizzy_core::model::{Flashcard, StudySet};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::progress::SessionProgress;
use super::quiz::{AnswerFeedback, Choices, QuizState};
use super::review::{Marked, ReviewState, Step};
use crate::error::SessionError;
use crate::study_set_service::StudySetService;

/// Consistent view of a review session at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSnapshot {
    pub cards: Vec<Flashcard>,
    pub index: usize,
    pub revealed: bool,
    pub current: Option<Flashcard>,
    pub progress: SessionProgress,
}

impl ReviewSnapshot {
    fn of(state: &ReviewState) -> Self {
        Self {
            cards: state.cards().to_vec(),
            index: state.index(),
            revealed: state.is_revealed(),
            current: state.current_card().cloned(),
            progress: state.progress(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizSnapshot {
    pub review: ReviewSnapshot,
    pub choices: Choices,
    pub feedback: Option<AnswerFeedback>,
}

/// State that can be driven by a [`LiveSession`].
pub trait SessionState: Send + 'static {
    type Snapshot: Clone + Send + Sync + 'static;

    fn review(&self) -> &ReviewState;

    fn snapshot(&self) -> Self::Snapshot;

    /// Take over the latest card list from storage.
    fn sync_cards(&mut self, cards: Vec<Flashcard>);
}

impl SessionState for ReviewState {
    type Snapshot = ReviewSnapshot;

    fn review(&self) -> &ReviewState {
        self
    }

    fn snapshot(&self) -> ReviewSnapshot {
        ReviewSnapshot::of(self)
    }

    fn sync_cards(&mut self, cards: Vec<Flashcard>) {
        self.replace_cards(cards);
    }
}

impl SessionState for QuizState {
    type Snapshot = QuizSnapshot;

    fn review(&self) -> &ReviewState {
        QuizState::review(self)
    }

    fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            review: ReviewSnapshot::of(QuizState::review(self)),
            choices: self.choices().clone(),
            feedback: self.feedback().cloned(),
        }
    }

    fn sync_cards(&mut self, cards: Vec<Flashcard>) {
        self.replace_cards(cards);
    }
}

fn lock<S>(state: &Mutex<S>) -> MutexGuard<'_, S> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A study session bound to one study set.
///
/// Dropping or closing the session stops following the store.
pub struct LiveSession<S: SessionState> {
    study_set: StudySet,
    state: Arc<Mutex<S>>,
    snapshots: Arc<watch::Sender<S::Snapshot>>,
    sync_task: JoinHandle<()>,
    service: StudySetService,
}

/// Flip-card review session.
pub type FlashcardReview = LiveSession<ReviewState>;

/// Multiple-choice quiz session.
pub type MultipleChoiceQuiz = LiveSession<QuizState>;

impl<S: SessionState> LiveSession<S> {
    /// Load the set, build the state from its cards and start following changes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` if the set does not exist.
    /// Returns `SessionError::Storage` if loading fails.
    pub(crate) async fn start(
        service: StudySetService,
        study_set: StudySet,
        build: impl FnOnce(Vec<Flashcard>) -> S,
    ) -> Result<Self, SessionError> {
        let service = service.bind_current_runtime();
        let mut cards = service.watch_flashcards(study_set.id()).await?;
        let state = build(cards.current());
        let (tx, _rx) = watch::channel(state.snapshot());
        let state = Arc::new(Mutex::new(state));
        let snapshots = Arc::new(tx);

        let sync_state = Arc::clone(&state);
        let sync_snapshots = Arc::clone(&snapshots);
        let set_id = study_set.id();
        let sync_task = tokio::spawn(async move {
            while let Some(latest) = cards.changed().await {
                let mut guard = lock(&sync_state);
                guard.sync_cards(latest);
                sync_snapshots.send_replace(guard.snapshot());
            }
            log::debug!("card feed for study set {set_id} ended");
        });

        log::debug!("opened session for study set {set_id}");
        Ok(Self {
            study_set,
            state,
            snapshots,
            sync_task,
            service,
        })
    }

    #[must_use]
    pub fn study_set(&self) -> &StudySet {
        &self.study_set
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> S::Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified on every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<S::Snapshot> {
        self.snapshots.subscribe()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        lock(&self.state).review().progress()
    }

    #[must_use]
    pub fn current_card(&self) -> Option<Flashcard> {
        lock(&self.state).review().current_card().cloned()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        lock(&self.state).review().is_last()
    }

    /// Stop following the store and discard the session state.
    pub fn close(self) {}

    /// Run `f` under the lock and publish the resulting snapshot.
    fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = lock(&self.state);
        let out = f(&mut guard);
        self.snapshots.send_replace(guard.snapshot());
        out
    }

    fn write_through(&self, marked: Option<Marked>) {
        if let Some(marked) = marked {
            drop(self.service.spawn_known_status(marked.card_id, marked.known));
        }
    }
}

impl<S: SessionState> fmt::Debug for LiveSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSession")
            .field("study_set", &self.study_set.id())
            .field("progress", &self.progress())
            .finish_non_exhaustive()
    }
}

impl<S: SessionState> Drop for LiveSession<S> {
    fn drop(&mut self) {
        self.sync_task.abort();
        log::debug!("closed session for study set {}", self.study_set.id());
    }
}

//
// ─── FLASHCARD REVIEW ──────────────────────────────────────────────────────────
//

impl LiveSession<ReviewState> {
    pub fn flip(&self) {
        self.update(ReviewState::flip);
    }

    pub fn next(&self) -> Step {
        self.update(ReviewState::next)
    }

    pub fn previous(&self) -> bool {
        self.update(ReviewState::previous)
    }

    /// Mark the current card known, persist it in the background and advance.
    pub fn mark_known(&self) -> Option<Marked> {
        self.mark(true, true)
    }

    pub fn mark_unknown(&self) -> Option<Marked> {
        self.mark(false, true)
    }

    pub fn mark(&self, known: bool, auto_advance: bool) -> Option<Marked> {
        let marked = self.update(|state| state.mark(known, auto_advance));
        self.write_through(marked);
        marked
    }

    pub fn reset_progress(&self) {
        self.update(ReviewState::reset_progress);
    }
}

//
// ─── MULTIPLE CHOICE ───────────────────────────────────────────────────────────
//

impl LiveSession<QuizState> {
    #[must_use]
    pub fn choices(&self) -> Choices {
        lock(&self.state).choices().clone()
    }

    /// Answer the current question and persist the verdict in the background.
    pub fn submit_answer(&self, choice: &str) -> Option<AnswerFeedback> {
        let feedback = self.update(|quiz| quiz.submit_answer(choice));
        self.write_through(feedback.as_ref().map(|fb| Marked {
            card_id: fb.card_id,
            known: fb.is_correct,
            was_last: fb.was_last,
        }));
        feedback
    }

    pub fn next(&self) -> Step {
        self.update(QuizState::next)
    }

    pub fn reset_progress(&self) {
        self.update(QuizState::reset_progress);
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        lock(&self.state).correct_count()
    }
}

use rand::SeedableRng;
use rand::rngs::StdRng;

use quizzy_core::model::{MIN_QUIZ_CARDS, StudyMode, StudySetId};

use super::live::{FlashcardReview, LiveSession, MultipleChoiceQuiz};
use super::quiz::QuizState;
use super::review::ReviewState;
use crate::error::SessionError;
use crate::study_set_service::StudySetService;

/// Result of trying to open a quiz.
pub enum QuizStart {
    Ready(MultipleChoiceQuiz),
    /// The set has fewer than `MIN_QUIZ_CARDS` cards.
    InsufficientCards { available: usize },
}

impl std::fmt::Debug for QuizStart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(quiz) => f
                .debug_tuple("Ready")
                .field(&quiz.study_set().id())
                .finish(),
            Self::InsufficientCards { available } => f
                .debug_struct("InsufficientCards")
                .field("available", available)
                .finish(),
        }
    }
}

/// Opens study sessions for a set.
#[derive(Clone)]
pub struct StudySessionService {
    study_sets: StudySetService,
}

impl StudySessionService {
    #[must_use]
    pub fn new(study_sets: StudySetService) -> Self {
        Self { study_sets }
    }

    /// Start a flip-card review over every card of the set.
    ///
    /// An empty set opens fine; every operation is then a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` if the set does not exist.
    /// Returns `SessionError::Storage` if loading fails.
    pub async fn open_flashcards(&self, set_id: StudySetId) -> Result<FlashcardReview, SessionError> {
        let set = self.study_sets.get_study_set(set_id).await?;
        LiveSession::start(self.study_sets.clone(), set, ReviewState::new).await
    }

    /// Start a quiz with OS-seeded randomness.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` if the set does not exist.
    /// Returns `SessionError::Storage` if loading fails.
    pub async fn open_quiz(&self, set_id: StudySetId) -> Result<QuizStart, SessionError> {
        self.open_quiz_with_rng(set_id, StdRng::from_os_rng()).await
    }

    /// Start a quiz whose options are reproducible for a given `seed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` if the set does not exist.
    /// Returns `SessionError::Storage` if loading fails.
    pub async fn open_quiz_seeded(
        &self,
        set_id: StudySetId,
        seed: u64,
    ) -> Result<QuizStart, SessionError> {
        self.open_quiz_with_rng(set_id, StdRng::seed_from_u64(seed)).await
    }

    /// Start a quiz drawing distractors from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFound` if the set does not exist.
    /// Returns `SessionError::Storage` if loading fails.
    pub async fn open_quiz_with_rng(
        &self,
        set_id: StudySetId,
        rng: StdRng,
    ) -> Result<QuizStart, SessionError> {
        let set = self.study_sets.get_study_set(set_id).await?;
        let quiz = LiveSession::start(self.study_sets.clone(), set, |cards| {
            QuizState::new(cards, rng)
        })
        .await?;

        let available = quiz.progress().total;
        if !StudyMode::MultipleChoice.is_available(available) {
            log::debug!(
                "study set {set_id} has {available} cards, quiz needs {MIN_QUIZ_CARDS}"
            );
            return Ok(QuizStart::InsufficientCards { available });
        }
        Ok(QuizStart::Ready(quiz))
    }
}

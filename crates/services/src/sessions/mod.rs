mod live;
mod progress;
mod quiz;
mod review;
mod service;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use live::{
    FlashcardReview, LiveSession, MultipleChoiceQuiz, QuizSnapshot, ReviewSnapshot, SessionState,
};
pub use progress::SessionProgress;
pub use quiz::{AnswerFeedback, Choices, QuizState, build_choices};
pub use review::{Marked, ReviewState, Step};
pub use service::{QuizStart, StudySessionService};

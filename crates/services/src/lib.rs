#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod sessions;
pub mod study_set_service;

pub use app_services::AppServices;
pub use config::WriteRetryPolicy;
pub use error::{AppServicesError, SessionError, StudySetServiceError};
pub use study_set_service::{KnownStatusWrite, StudySetService};

pub use sessions::{
    AnswerFeedback, Choices, FlashcardReview, MultipleChoiceQuiz, QuizStart, Step,
    StudySessionService,
};

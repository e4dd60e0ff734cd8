use thiserror::Error;

use crate::model::{FlashcardError, StudySetError};

/// Validation failures for user-entered study data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    StudySet(#[from] StudySetError),
    #[error(transparent)]
    Flashcard(#[from] FlashcardError),
}

//! Shared error types for the services crate.

use thiserror::Error;

use quizzy_core::ValidationError;
use quizzy_core::model::{FlashcardError, StudySetError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `StudySetService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudySetServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("study set or flashcard not found")]
    NotFound,
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for StudySetServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

impl From<StudySetError> for StudySetServiceError {
    fn from(err: StudySetError) -> Self {
        Self::Validation(err.into())
    }
}

impl From<FlashcardError> for StudySetServiceError {
    fn from(err: FlashcardError) -> Self {
        Self::Validation(err.into())
    }
}

/// Errors emitted while opening study sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("study set not found")]
    NotFound,
    #[error(transparent)]
    Storage(StorageError),
    #[error(transparent)]
    Repository(StudySetServiceError),
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

impl From<StudySetServiceError> for SessionError {
    fn from(err: StudySetServiceError) -> Self {
        match err {
            StudySetServiceError::NotFound => Self::NotFound,
            StudySetServiceError::Storage(inner) => Self::Storage(inner),
            other => Self::Repository(other),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_not_found_becomes_service_not_found() {
        let err: StudySetServiceError = StorageError::NotFound.into();
        assert!(matches!(err, StudySetServiceError::NotFound));

        let err: StudySetServiceError = StorageError::Connection("down".into()).into();
        assert!(matches!(err, StudySetServiceError::Storage(_)));
    }

    #[test]
    fn validation_errors_keep_their_message() {
        let err: StudySetServiceError = StudySetError::EmptyTitle.into();
        assert!(matches!(err, StudySetServiceError::Validation(_)));
        assert_eq!(err.to_string(), StudySetError::EmptyTitle.to_string());
    }

    #[test]
    fn session_error_flattens_service_errors() {
        let err: SessionError = StudySetServiceError::NotFound.into();
        assert!(matches!(err, SessionError::NotFound));
    }
}

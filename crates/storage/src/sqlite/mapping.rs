use quizzy_core::model::{Flashcard, FlashcardId, StudySet, StudySetId, StudySetSummary};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps a query failure, turning foreign key violations into `Conflict`.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_foreign_key_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn set_id_from_i64(v: i64) -> Result<StudySetId, StorageError> {
    Ok(StudySetId::new(i64_to_u64("set_id", v)?))
}

pub(crate) fn card_id_from_i64(v: i64) -> Result<FlashcardId, StorageError> {
    Ok(FlashcardId::new(i64_to_u64("card_id", v)?))
}

pub(crate) fn set_id_to_i64(id: StudySetId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("set_id overflow".into()))
}

pub(crate) fn card_id_to_i64(id: FlashcardId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("card_id overflow".into()))
}

pub(crate) fn map_study_set_row(row: &SqliteRow) -> Result<StudySet, StorageError> {
    StudySet::new(
        set_id_from_i64(row.try_get::<i64, _>("set_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("description").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_summary_row(row: &SqliteRow) -> Result<StudySetSummary, StorageError> {
    let count: i64 = row.try_get("card_count").map_err(ser)?;
    Ok(StudySetSummary {
        study_set: map_study_set_row(row)?,
        card_count: u32::try_from(count)
            .map_err(|_| StorageError::Serialization(format!("invalid card_count: {count}")))?,
    })
}

pub(crate) fn map_flashcard_row(row: &SqliteRow) -> Result<Flashcard, StorageError> {
    Flashcard::from_persisted(
        card_id_from_i64(row.try_get::<i64, _>("card_id").map_err(ser)?)?,
        set_id_from_i64(row.try_get::<i64, _>("set_id").map_err(ser)?)?,
        row.try_get::<String, _>("term").map_err(ser)?,
        row.try_get::<String, _>("definition").map_err(ser)?,
        row.try_get::<bool, _>("is_known").map_err(ser)?,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_rejected() {
        assert!(matches!(
            set_id_from_i64(-1),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(card_id_from_i64(5).unwrap(), FlashcardId::new(5));
    }

    #[test]
    fn huge_ids_do_not_fit_sqlite() {
        assert!(set_id_to_i64(StudySetId::new(u64::MAX)).is_err());
        assert_eq!(card_id_to_i64(FlashcardId::new(12)).unwrap(), 12);
    }
}

use quizzy_core::model::{StudySet, StudySetId, StudySetSummary, ValidatedStudySet};

use super::SqliteRepository;
use super::mapping::{db_err, map_study_set_row, map_summary_row, set_id_from_i64, set_id_to_i64};
use crate::live::StoreChange;
use crate::repository::{StorageError, StudySetRepository};

#[async_trait::async_trait]
impl StudySetRepository for SqliteRepository {
    async fn insert_study_set(&self, set: &ValidatedStudySet) -> Result<StudySetId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO study_sets (title, description)
            VALUES (?1, ?2)
            ",
        )
        .bind(set.title())
        .bind(set.description())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = set_id_from_i64(res.last_insert_rowid())?;
        self.feed.publish(StoreChange::StudySetChanged(id));
        Ok(id)
    }

    async fn upsert_study_set(&self, set: &StudySet) -> Result<(), StorageError> {
        // ON CONFLICT DO UPDATE keeps the row in place, so owned cards survive.
        sqlx::query(
            r"
            INSERT INTO study_sets (set_id, title, description)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(set_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description
            ",
        )
        .bind(set_id_to_i64(set.id())?)
        .bind(set.title())
        .bind(set.description())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.feed.publish(StoreChange::StudySetChanged(set.id()));
        Ok(())
    }

    async fn get_study_set(&self, id: StudySetId) -> Result<Option<StudySet>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT set_id, title, description
            FROM study_sets WHERE set_id = ?1
            ",
        )
        .bind(set_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_study_set_row).transpose()
    }

    async fn list_study_sets_with_counts(&self) -> Result<Vec<StudySetSummary>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT study_sets.set_id, study_sets.title, study_sets.description,
                   COUNT(flashcards.card_id) AS card_count
            FROM study_sets
            LEFT JOIN flashcards ON study_sets.set_id = flashcards.set_id
            GROUP BY study_sets.set_id
            ORDER BY study_sets.title ASC, study_sets.set_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_summary_row).collect()
    }

    async fn delete_study_set(&self, id: StudySetId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM study_sets WHERE set_id = ?1")
            .bind(set_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.feed.publish(StoreChange::StudySetDeleted(id));
        Ok(())
    }
}

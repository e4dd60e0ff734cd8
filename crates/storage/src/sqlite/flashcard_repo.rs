use quizzy_core::model::{Flashcard, FlashcardId, StudySetId, ValidatedFlashcard};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    card_id_from_i64, card_id_to_i64, db_err, map_flashcard_row, ser, set_id_from_i64,
    set_id_to_i64,
};
use crate::live::StoreChange;
use crate::repository::{FlashcardRepository, StorageError};

impl SqliteRepository {
    /// Publishes the change for a statement that returned the owning `set_id`,
    /// or reports `NotFound` when no row matched.
    fn touched_set(&self, row: Option<sqlx::sqlite::SqliteRow>) -> Result<(), StorageError> {
        let row = row.ok_or(StorageError::NotFound)?;
        let set_id = set_id_from_i64(row.try_get::<i64, _>("set_id").map_err(ser)?)?;
        self.feed.publish(StoreChange::FlashcardsChanged(set_id));
        Ok(())
    }
}

#[async_trait::async_trait]
impl FlashcardRepository for SqliteRepository {
    async fn insert_flashcard(
        &self,
        card: &ValidatedFlashcard,
    ) -> Result<FlashcardId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO flashcards (set_id, term, definition, is_known)
            VALUES (?1, ?2, ?3, 0)
            ",
        )
        .bind(set_id_to_i64(card.set_id())?)
        .bind(card.term())
        .bind(card.definition())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = card_id_from_i64(res.last_insert_rowid())?;
        self.feed
            .publish(StoreChange::FlashcardsChanged(card.set_id()));
        Ok(id)
    }

    async fn update_flashcard(&self, card: &Flashcard) -> Result<(), StorageError> {
        let row = sqlx::query(
            r"
            UPDATE flashcards
            SET term = ?1, definition = ?2, is_known = ?3
            WHERE card_id = ?4
            RETURNING set_id
            ",
        )
        .bind(card.term())
        .bind(card.definition())
        .bind(card.is_known())
        .bind(card_id_to_i64(card.id())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        self.touched_set(row)
    }

    async fn get_flashcard(&self, id: FlashcardId) -> Result<Option<Flashcard>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT card_id, set_id, term, definition, is_known
            FROM flashcards WHERE card_id = ?1
            ",
        )
        .bind(card_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_flashcard_row).transpose()
    }

    async fn flashcards_for_set(
        &self,
        set_id: StudySetId,
    ) -> Result<Vec<Flashcard>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT card_id, set_id, term, definition, is_known
            FROM flashcards
            WHERE set_id = ?1
            ORDER BY card_id ASC
            ",
        )
        .bind(set_id_to_i64(set_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_flashcard_row).collect()
    }

    async fn delete_flashcard(&self, id: FlashcardId) -> Result<(), StorageError> {
        let row = sqlx::query("DELETE FROM flashcards WHERE card_id = ?1 RETURNING set_id")
            .bind(card_id_to_i64(id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        self.touched_set(row)
    }

    async fn set_known_status(&self, id: FlashcardId, known: bool) -> Result<(), StorageError> {
        let row = sqlx::query(
            "UPDATE flashcards SET is_known = ?1 WHERE card_id = ?2 RETURNING set_id",
        )
        .bind(known)
        .bind(card_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        self.touched_set(row)
    }
}

use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{FlashcardId, StudySetId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FlashcardError {
    #[error("term is required")]
    EmptyTerm,

    #[error("definition is required")]
    EmptyDefinition,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardDraft {
    pub set_id: StudySetId,
    pub term: String,
    pub definition: String,
}

impl FlashcardDraft {
    pub fn new(
        set_id: StudySetId,
        term: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            set_id,
            term: term.into(),
            definition: definition.into(),
        }
    }

    /// # Errors
    ///
    /// Returns `FlashcardError` if the term or definition is blank after trimming.
    pub fn validate(self) -> Result<ValidatedFlashcard, FlashcardError> {
        let (term, definition) = normalize(&self.term, &self.definition)?;
        Ok(ValidatedFlashcard {
            set_id: self.set_id,
            term,
            definition,
        })
    }
}

/// A new flashcard that passed validation. Starts out unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFlashcard {
    set_id: StudySetId,
    term: String,
    definition: String,
}

impl ValidatedFlashcard {
    #[must_use]
    pub fn set_id(&self) -> StudySetId {
        self.set_id
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    #[must_use]
    pub fn definition(&self) -> &str {
        &self.definition
    }

    #[must_use]
    pub fn assign_id(self, id: FlashcardId) -> Flashcard {
        Flashcard {
            id,
            set_id: self.set_id,
            term: self.term,
            definition: self.definition,
            is_known: false,
        }
    }
}

//
// ─── FLASHCARD ─────────────────────────────────────────────────────────────────
//

/// A term/definition pair with a known/unknown review flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flashcard {
    id: FlashcardId,
    set_id: StudySetId,
    term: String,
    definition: String,
    is_known: bool,
}

impl Flashcard {
    /// Rebuild a flashcard from a stored row.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardError` if the stored text is blank.
    pub fn from_persisted(
        id: FlashcardId,
        set_id: StudySetId,
        term: impl Into<String>,
        definition: impl Into<String>,
        is_known: bool,
    ) -> Result<Self, FlashcardError> {
        let (term, definition) = normalize(&term.into(), &definition.into())?;
        Ok(Self {
            id,
            set_id,
            term,
            definition,
            is_known,
        })
    }

    /// Returns a copy with new term and definition. Id, set and known flag are kept.
    ///
    /// # Errors
    ///
    /// Returns `FlashcardError` if either field is blank after trimming.
    pub fn edited(&self, term: &str, definition: &str) -> Result<Self, FlashcardError> {
        let (term, definition) = normalize(term, definition)?;
        Ok(Self {
            term,
            definition,
            ..self.clone()
        })
    }

    #[must_use]
    pub fn with_known(mut self, known: bool) -> Self {
        self.is_known = known;
        self
    }

    #[must_use]
    pub fn id(&self) -> FlashcardId {
        self.id
    }

    #[must_use]
    pub fn set_id(&self) -> StudySetId {
        self.set_id
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    #[must_use]
    pub fn definition(&self) -> &str {
        &self.definition
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        self.is_known
    }
}

fn normalize(term: &str, definition: &str) -> Result<(String, String), FlashcardError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(FlashcardError::EmptyTerm);
    }
    let definition = definition.trim();
    if definition.is_empty() {
        return Err(FlashcardError::EmptyDefinition);
    }
    Ok((term.to_owned(), definition.to_owned()))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_fails_if_term_blank() {
        let err = FlashcardDraft::new(StudySetId::new(1), "  ", "ok")
            .validate()
            .unwrap_err();
        assert_eq!(err, FlashcardError::EmptyTerm);
    }

    #[test]
    fn draft_fails_if_definition_blank() {
        let err = FlashcardDraft::new(StudySetId::new(1), "ok", "\n")
            .validate()
            .unwrap_err();
        assert_eq!(err, FlashcardError::EmptyDefinition);
    }

    #[test]
    fn new_cards_start_unknown() {
        let card = FlashcardDraft::new(StudySetId::new(2), " hola ", " hello ")
            .validate()
            .unwrap()
            .assign_id(FlashcardId::new(10));

        assert_eq!(card.id(), FlashcardId::new(10));
        assert_eq!(card.set_id(), StudySetId::new(2));
        assert_eq!(card.term(), "hola");
        assert_eq!(card.definition(), "hello");
        assert!(!card.is_known());
    }

    #[test]
    fn edit_keeps_identity_and_known_flag() {
        let card = Flashcard::from_persisted(
            FlashcardId::new(3),
            StudySetId::new(1),
            "gato",
            "cat",
            true,
        )
        .unwrap();

        let edited = card.edited("perro", "dog").unwrap();
        assert_eq!(edited.id(), card.id());
        assert_eq!(edited.set_id(), card.set_id());
        assert!(edited.is_known());
        assert_eq!(edited.term(), "perro");

        assert_eq!(card.edited("perro", " ").unwrap_err(), FlashcardError::EmptyDefinition);
    }
}

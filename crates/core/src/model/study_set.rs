use serde::Serialize;
use thiserror::Error;

use crate::model::ids::StudySetId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudySetError {
    #[error("title is required")]
    EmptyTitle,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// User input for a new study set, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudySetDraft {
    pub title: String,
    pub description: String,
}

impl StudySetDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Validate the draft, trimming both fields.
    ///
    /// # Errors
    ///
    /// Returns `StudySetError::EmptyTitle` if the title is blank.
    pub fn validate(self) -> Result<ValidatedStudySet, StudySetError> {
        let (title, description) = normalize(&self.title, &self.description)?;
        Ok(ValidatedStudySet { title, description })
    }
}

/// A study set that passed validation but has no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStudySet {
    title: String,
    description: String,
}

impl ValidatedStudySet {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn assign_id(self, id: StudySetId) -> StudySet {
        StudySet {
            id,
            title: self.title,
            description: self.description,
        }
    }
}

//
// ─── STUDY SET ─────────────────────────────────────────────────────────────────
//

/// A named collection of flashcards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudySet {
    id: StudySetId,
    title: String,
    description: String,
}

impl StudySet {
    /// Build a full record, e.g. for a replace-on-conflict update.
    ///
    /// # Errors
    ///
    /// Returns `StudySetError::EmptyTitle` if the title is blank.
    pub fn new(
        id: StudySetId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, StudySetError> {
        let (title, description) = normalize(&title.into(), &description.into())?;
        Ok(Self {
            id,
            title,
            description,
        })
    }

    #[must_use]
    pub fn id(&self) -> StudySetId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

fn normalize(title: &str, description: &str) -> Result<(String, String), StudySetError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StudySetError::EmptyTitle);
    }
    Ok((title.to_owned(), description.trim().to_owned()))
}

/// A study set together with the number of flashcards it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudySetSummary {
    pub study_set: StudySet,
    pub card_count: u32,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_rejects_blank_title() {
        let err = StudySetDraft::new("   ", "anything").validate().unwrap_err();
        assert_eq!(err, StudySetError::EmptyTitle);
    }

    #[test]
    fn draft_trims_and_defaults_description() {
        let set = StudySetDraft::new("  Spanish verbs ", "")
            .validate()
            .unwrap()
            .assign_id(StudySetId::new(7));

        assert_eq!(set.id(), StudySetId::new(7));
        assert_eq!(set.title(), "Spanish verbs");
        assert_eq!(set.description(), "");
    }

    #[test]
    fn new_validates_like_the_draft() {
        assert!(StudySet::new(StudySetId::new(1), "\t", "x").is_err());

        let set = StudySet::new(StudySetId::new(1), "Capitals", "  of Europe ").unwrap();
        assert_eq!(set.description(), "of Europe");
    }
}

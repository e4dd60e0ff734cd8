mod flashcard;
mod ids;
mod study_mode;
mod study_set;

pub use flashcard::{Flashcard, FlashcardDraft, FlashcardError, ValidatedFlashcard};
pub use ids::{FlashcardId, ParseIdError, StudySetId};
pub use study_mode::{ParseStudyModeError, StudyMode};
pub use study_set::{StudySet, StudySetDraft, StudySetError, StudySetSummary, ValidatedStudySet};

/// Minimum number of cards a set needs before multiple choice is offered.
pub const MIN_QUIZ_CARDS: usize = 4;

/// Maximum number of wrong options shown next to the correct definition.
pub const MAX_DISTRACTORS: usize = 3;

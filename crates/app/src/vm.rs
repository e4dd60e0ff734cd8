//! Presentation-ready values derived from domain data.

use serde::Serialize;

use quizzy_core::ValidationError;
use quizzy_core::model::{MIN_QUIZ_CARDS, StudyMode, StudySetSummary};
use services::AnswerFeedback;
use services::sessions::SessionProgress;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudySetRow {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub card_count: u32,
    pub card_count_label: String,
}

impl From<&StudySetSummary> for StudySetRow {
    fn from(summary: &StudySetSummary) -> Self {
        let set = &summary.study_set;
        Self {
            id: set.id().value(),
            title: set.title().to_owned(),
            description: set.description().to_owned(),
            card_count: summary.card_count,
            card_count_label: card_count_label(summary.card_count as usize),
        }
    }
}

#[must_use]
pub fn card_count_label(count: usize) -> String {
    format!("{count} cards")
}

/// "i / n", or "0 / 0" for an empty set.
#[must_use]
pub fn position_label(progress: &SessionProgress) -> String {
    format!("{} / {}", progress.position, progress.total)
}

#[must_use]
pub fn known_label(known: usize) -> String {
    format!("{known} known")
}

#[must_use]
pub fn correct_label(correct: usize) -> String {
    format!("{correct} correct")
}

#[must_use]
pub fn review_next_label(is_last: bool) -> &'static str {
    if is_last { "Finish" } else { "Next →" }
}

#[must_use]
pub fn quiz_next_label(is_last: bool) -> &'static str {
    if is_last { "Finish" } else { "Next Question →" }
}

//
// ─── MODE SELECTION ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeOption {
    pub mode: StudyMode,
    pub title: &'static str,
    pub description: &'static str,
    pub enabled: bool,
    pub disabled_message: Option<String>,
}

#[must_use]
pub fn mode_options(card_count: usize) -> Vec<ModeOption> {
    StudyMode::ALL
        .into_iter()
        .map(|mode| {
            let enabled = mode.is_available(card_count);
            let (title, description) = match mode {
                StudyMode::Flashcards => (
                    "Flashcards",
                    "Flip cards to reveal answers. Classic study method.",
                ),
                StudyMode::MultipleChoice => (
                    "Multiple Choice",
                    "Test yourself with 4 answer choices per question.",
                ),
            };
            ModeOption {
                mode,
                title,
                description,
                enabled,
                disabled_message: (!enabled)
                    .then(|| format!("Need at least {MIN_QUIZ_CARDS} cards")),
            }
        })
        .collect()
}

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackView {
    pub title: &'static str,
    pub message: String,
}

impl From<&AnswerFeedback> for FeedbackView {
    fn from(feedback: &AnswerFeedback) -> Self {
        if feedback.is_correct {
            Self {
                title: "Correct answer!",
                message: "Great job, keep the momentum going.".to_owned(),
            }
        } else {
            Self {
                title: "Nice try!",
                message: format!("Correct answer: {}", feedback.correct_definition),
            }
        }
    }
}

pub struct CompletionPrompt;

impl CompletionPrompt {
    pub const TITLE: &'static str = "Congratulations!";
    pub const MESSAGE: &'static str = "You finished the set. Study again or go back to your list?";
    pub const STUDY_AGAIN: &'static str = "Study Again";
    pub const BACK_TO_LIST: &'static str = "Back to List";
}

/// Inline message shown next to a form instead of failing.
#[must_use]
pub fn validation_message(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::StudySet(_) => "Please enter a title to continue",
        ValidationError::Flashcard(_) => "Both term and definition are required",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizzy_core::model::{FlashcardError, FlashcardId, StudySet, StudySetError, StudySetId};

    #[test]
    fn rows_carry_count_labels() {
        let summary = StudySetSummary {
            study_set: StudySet::new(StudySetId::new(3), "Verbs", "").unwrap(),
            card_count: 12,
        };
        let row = StudySetRow::from(&summary);
        assert_eq!(row.card_count_label, "12 cards");
        assert_eq!(row.id, 3);
    }

    #[test]
    fn empty_position_reads_zero_of_zero() {
        assert_eq!(position_label(&SessionProgress::default()), "0 / 0");
        let progress = SessionProgress {
            total: 4,
            position: 2,
            known: 1,
            is_last: false,
        };
        assert_eq!(position_label(&progress), "2 / 4");
    }

    #[test]
    fn quiz_is_disabled_below_four_cards() {
        let options = mode_options(3);
        assert!(options[0].enabled);
        assert!(!options[1].enabled);
        assert_eq!(
            options[1].disabled_message.as_deref(),
            Some("Need at least 4 cards")
        );
        assert!(mode_options(4).iter().all(|o| o.enabled));
    }

    #[test]
    fn feedback_titles() {
        let mut feedback = AnswerFeedback {
            card_id: FlashcardId::new(1),
            selected: "Paris".into(),
            correct_definition: "Paris".into(),
            is_correct: true,
            was_last: false,
        };
        assert_eq!(FeedbackView::from(&feedback).title, "Correct answer!");

        feedback.is_correct = false;
        let view = FeedbackView::from(&feedback);
        assert_eq!(view.title, "Nice try!");
        assert_eq!(view.message, "Correct answer: Paris");
    }

    #[test]
    fn validation_messages() {
        assert_eq!(
            validation_message(&StudySetError::EmptyTitle.into()),
            "Please enter a title to continue"
        );
        assert_eq!(
            validation_message(&FlashcardError::EmptyDefinition.into()),
            "Both term and definition are required"
        );
    }
}

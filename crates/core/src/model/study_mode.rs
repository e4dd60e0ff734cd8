use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::MIN_QUIZ_CARDS;

/// The two ways a study set can be reviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyMode {
    /// Self-paced flip-card review.
    Flashcards,
    /// Multiple-choice quiz over the set's definitions.
    MultipleChoice,
}

impl StudyMode {
    pub const ALL: [StudyMode; 2] = [StudyMode::Flashcards, StudyMode::MultipleChoice];

    /// Smallest card count for which the mode can be opened.
    #[must_use]
    pub fn min_cards(self) -> usize {
        match self {
            Self::Flashcards => 0,
            Self::MultipleChoice => MIN_QUIZ_CARDS,
        }
    }

    #[must_use]
    pub fn is_available(self, card_count: usize) -> bool {
        card_count >= self.min_cards()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flashcards => "flashcards",
            Self::MultipleChoice => "quiz",
        }
    }
}

impl fmt::Display for StudyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStudyModeError(String);

impl fmt::Display for ParseStudyModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown study mode: {} (expected flashcards or quiz)", self.0)
    }
}

impl std::error::Error for ParseStudyModeError {}

impl FromStr for StudyMode {
    type Err = ParseStudyModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flashcards" | "cards" | "review" => Ok(Self::Flashcards),
            "quiz" | "multiple-choice" | "mc" => Ok(Self::MultipleChoice),
            other => Err(ParseStudyModeError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_needs_four_cards() {
        assert!(!StudyMode::MultipleChoice.is_available(3));
        assert!(StudyMode::MultipleChoice.is_available(4));
        assert!(StudyMode::Flashcards.is_available(0));
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("Quiz".parse::<StudyMode>().unwrap(), StudyMode::MultipleChoice);
        assert_eq!("flashcards".parse::<StudyMode>().unwrap(), StudyMode::Flashcards);
        assert!("spaced".parse::<StudyMode>().is_err());
    }
}

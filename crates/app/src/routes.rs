use std::fmt;
use std::str::FromStr;

use quizzy_core::model::{StudyMode, StudySetId};

/// Screens of the app, addressed by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    StudySetList,
    CreateSet,
    StudySetDetail(StudySetId),
    CreateFlashcard(StudySetId),
    StudyModeSelection(StudySetId),
    FlashcardReview(StudySetId),
    MultipleChoice(StudySetId),
}

impl Route {
    #[must_use]
    pub fn study(set_id: StudySetId, mode: StudyMode) -> Self {
        match mode {
            StudyMode::Flashcards => Self::FlashcardReview(set_id),
            StudyMode::MultipleChoice => Self::MultipleChoice(set_id),
        }
    }

    /// Where "back" leads from this screen.
    #[must_use]
    pub fn parent(self) -> Self {
        match self {
            Self::StudySetList | Self::CreateSet | Self::StudySetDetail(_) => Self::StudySetList,
            Self::CreateFlashcard(id) | Self::StudyModeSelection(id) => Self::StudySetDetail(id),
            Self::FlashcardReview(id) | Self::MultipleChoice(id) => Self::StudyModeSelection(id),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StudySetList => f.write_str("/sets"),
            Self::CreateSet => f.write_str("/sets/new"),
            Self::StudySetDetail(id) => write!(f, "/sets/{id}"),
            Self::CreateFlashcard(id) => write!(f, "/sets/{id}/cards/new"),
            Self::StudyModeSelection(id) => write!(f, "/sets/{id}/study"),
            Self::FlashcardReview(id) => write!(f, "/sets/{id}/study/{}", StudyMode::Flashcards),
            Self::MultipleChoice(id) => write!(f, "/sets/{id}/study/{}", StudyMode::MultipleChoice),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRouteError;

fn id(raw: &str) -> Result<StudySetId, ParseRouteError> {
    raw.parse().map_err(|_| ParseRouteError)
}

impl fmt::Display for ParseRouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown route")
    }
}

impl std::error::Error for ParseRouteError {}

impl FromStr for Route {
    type Err = ParseRouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.trim().trim_matches('/').split('/').collect();

        match segments.as_slice() {
            ["" | "sets"] => Ok(Self::StudySetList),
            ["sets", "new"] => Ok(Self::CreateSet),
            ["sets", raw] => Ok(Self::StudySetDetail(id(raw)?)),
            ["sets", raw, "cards", "new"] => Ok(Self::CreateFlashcard(id(raw)?)),
            ["sets", raw, "study"] => Ok(Self::StudyModeSelection(id(raw)?)),
            ["sets", raw, "study", mode] => {
                let mode = mode.parse::<StudyMode>().map_err(|_| ParseRouteError)?;
                Ok(Self::study(id(raw)?, mode))
            }
            _ => Err(ParseRouteError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_parse_back_into_routes() {
        let id = StudySetId::new(9);
        for route in [
            Route::StudySetList,
            Route::CreateSet,
            Route::StudySetDetail(id),
            Route::CreateFlashcard(id),
            Route::StudyModeSelection(id),
            Route::FlashcardReview(id),
            Route::MultipleChoice(id),
        ] {
            assert_eq!(route.to_string().parse::<Route>(), Ok(route));
        }
    }

    #[test]
    fn rejects_unknown_paths() {
        assert!("/sets/abc".parse::<Route>().is_err());
        assert!("/decks/1".parse::<Route>().is_err());
        assert!("/sets/1/study/spaced".parse::<Route>().is_err());
    }

    #[test]
    fn back_from_a_session_goes_to_mode_selection() {
        let id = StudySetId::new(2);
        assert_eq!(Route::MultipleChoice(id).parent(), Route::StudyModeSelection(id));
        assert_eq!(Route::StudySetDetail(id).parent(), Route::StudySetList);
    }
}

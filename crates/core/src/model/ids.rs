use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an id from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value
            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self::new).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                })
            }
        }
    };
}

store_id! {
    /// Store-assigned identifier of a study set. Never reused.
    StudySetId
}

store_id! {
    /// Store-assigned identifier of a flashcard.
    FlashcardId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_set_id_display_and_parse() {
        let id: StudySetId = "42".parse().unwrap();
        assert_eq!(id, StudySetId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn flashcard_id_rejects_garbage() {
        let err = "seven".parse::<FlashcardId>().unwrap_err();
        assert_eq!(err.to_string(), "failed to parse FlashcardId from string");
    }

    #[test]
    fn debug_names_the_kind() {
        assert_eq!(format!("{:?}", FlashcardId::new(3)), "FlashcardId(3)");
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&StudySetId::new(9)).unwrap();
        assert_eq!(json, "9");
    }
}

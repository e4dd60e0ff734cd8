use quizzy_core::model::{Flashcard, FlashcardId};

use super::progress::SessionProgress;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of asking for the next card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved,
    /// Already on the last card (or the set is empty); nothing changed.
    AtEnd,
}

/// A known/unknown verdict recorded for one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marked {
    pub card_id: FlashcardId,
    pub known: bool,
    /// The marked card was the last one; callers offer restart or exit.
    pub was_last: bool,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Flip-card review over the working set of one study set.
///
/// Invariant: `index < cards.len()` whenever the set is non-empty, and
/// `index == 0` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewState {
    cards: Vec<Flashcard>,
    index: usize,
    revealed: bool,
    question: u64,
}

impl ReviewState {
    #[must_use]
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self {
            cards,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Changes every time a different question is presented.
    pub(crate) fn question(&self) -> u64 {
        self.question
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&Flashcard> {
        self.cards.get(self.index)
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        !self.cards.is_empty() && self.index + 1 == self.cards.len()
    }

    #[must_use]
    pub fn known_count(&self) -> usize {
        self.cards.iter().filter(|card| card.is_known()).count()
    }

    /// `(index + 1) / len`, or 0 for an empty set.
    #[must_use]
    pub fn progress_fraction(&self) -> f32 {
        self.progress().fraction()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.cards.len(),
            position: if self.cards.is_empty() { 0 } else { self.index + 1 },
            known: self.known_count(),
            is_last: self.is_last(),
        }
    }

    /// Toggle between term and definition. No-op on an empty set.
    pub fn flip(&mut self) {
        if !self.cards.is_empty() {
            self.revealed = !self.revealed;
        }
    }

    pub fn next(&mut self) -> Step {
        if self.index + 1 < self.cards.len() {
            self.move_to(self.index + 1);
            Step::Moved
        } else {
            Step::AtEnd
        }
    }

    /// Returns false when already on the first card.
    pub fn previous(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.move_to(self.index - 1);
        true
    }

    /// Record a verdict for the current card and optionally advance.
    ///
    /// The known flag is applied to the local copy right away; persisting it
    /// is the caller's job. Never advances past the last card.
    pub fn mark(&mut self, known: bool, auto_advance: bool) -> Option<Marked> {
        let card_id = self.current_card()?.id();
        let was_last = self.is_last();
        self.apply_known_status(card_id, known);
        self.revealed = false;
        if auto_advance && !was_last {
            self.move_to(self.index + 1);
        }
        Some(Marked {
            card_id,
            known,
            was_last,
        })
    }

    pub fn mark_known(&mut self) -> Option<Marked> {
        self.mark(true, true)
    }

    pub fn mark_unknown(&mut self) -> Option<Marked> {
        self.mark(false, true)
    }

    /// Update the local known flag of one card, wherever it sits in the list.
    pub fn apply_known_status(&mut self, card_id: FlashcardId, known: bool) {
        if let Some(card) = self.cards.iter_mut().find(|card| card.id() == card_id) {
            *card = card.clone().with_known(known);
        }
    }

    /// Back to the first card, term side up. Stored known flags stay as they are.
    pub fn reset_progress(&mut self) {
        self.move_to(0);
    }

    /// Swap in a fresh card list from storage and clamp the position.
    ///
    /// Returns true when the position had to move.
    pub fn replace_cards(&mut self, cards: Vec<Flashcard>) -> bool {
        self.cards = cards;
        if self.cards.is_empty() || self.index >= self.cards.len() {
            self.move_to(self.cards.len().saturating_sub(1));
            return true;
        }
        false
    }

    fn move_to(&mut self, index: usize) {
        self.index = index;
        self.revealed = false;
        self.question = self.question.wrapping_add(1);
    }
}

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use quizzy_core::model::{Flashcard, FlashcardId, MAX_DISTRACTORS};

use super::review::{ReviewState, Step};

/// Options offered for the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "options", rename_all = "snake_case")]
pub enum Choices {
    /// Fewer than two cards, or no current card.
    Insufficient,
    /// Definitions in display order; exactly one is correct.
    Ready(Vec<String>),
}

impl Choices {
    #[must_use]
    pub fn options(&self) -> &[String] {
        match self {
            Self::Insufficient => &[],
            Self::Ready(options) => options,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Outcome of answering one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub card_id: FlashcardId,
    pub selected: String,
    pub correct_definition: String,
    pub is_correct: bool,
    pub was_last: bool,
}

/// Build the options for `cards[current]`: up to three distractor definitions
/// drawn without replacement from the other cards, plus the correct one, in a
/// random order.
///
/// Definitions equal to the correct one are never used as distractors, and
/// duplicate distractors collapse into one option.
pub fn build_choices<R: Rng + ?Sized>(cards: &[Flashcard], current: usize, rng: &mut R) -> Choices {
    let Some(card) = cards.get(current) else {
        return Choices::Insufficient;
    };
    if cards.len() < 2 {
        return Choices::Insufficient;
    }

    let correct = card.definition();
    let mut pool: Vec<&str> = cards
        .iter()
        .filter(|other| other.id() != card.id())
        .map(Flashcard::definition)
        .filter(|definition| *definition != correct)
        .collect();
    pool.sort_unstable();
    pool.dedup();
    pool.shuffle(rng);
    pool.truncate(MAX_DISTRACTORS);

    let mut options: Vec<String> = pool.into_iter().map(str::to_owned).collect();
    options.push(correct.to_owned());
    options.shuffle(rng);
    Choices::Ready(options)
}

#[derive(Debug, Clone)]
struct Round {
    question: u64,
    card_id: Option<FlashcardId>,
    /// Correct definition the options were dealt for.
    definition: Option<String>,
    choices: Choices,
    feedback: Option<AnswerFeedback>,
}

/// Multiple-choice quiz layered on a [`ReviewState`].
///
/// Options are dealt once per question and stay fixed until the quiz moves to
/// another card, even when the card list is refreshed underneath.
#[derive(Debug, Clone)]
pub struct QuizState {
    review: ReviewState,
    rng: StdRng,
    round: Round,
}

impl QuizState {
    #[must_use]
    pub fn new(cards: Vec<Flashcard>, rng: StdRng) -> Self {
        let mut quiz = Self {
            review: ReviewState::new(cards),
            rng,
            round: Round {
                question: 0,
                card_id: None,
                definition: None,
                choices: Choices::Insufficient,
                feedback: None,
            },
        };
        quiz.deal();
        quiz
    }

    #[must_use]
    pub fn review(&self) -> &ReviewState {
        &self.review
    }

    #[must_use]
    pub fn choices(&self) -> &Choices {
        &self.round.choices
    }

    /// Feedback for the current question once it has been answered.
    #[must_use]
    pub fn feedback(&self) -> Option<&AnswerFeedback> {
        self.round.feedback.as_ref()
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.round.feedback.is_some()
    }

    /// Cards currently flagged as known.
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.review.known_count()
    }

    /// Answer the current question. Only the first answer per question counts;
    /// later calls return `None`, as do calls without ready choices.
    ///
    /// The card is marked known or unknown without advancing.
    pub fn submit_answer(&mut self, choice: &str) -> Option<AnswerFeedback> {
        if self.round.feedback.is_some() || !self.round.choices.is_ready() {
            return None;
        }
        let correct_definition = self.round.definition.clone()?;
        let is_correct = choice == correct_definition;
        let marked = self.review.mark(is_correct, false)?;

        let feedback = AnswerFeedback {
            card_id: marked.card_id,
            selected: choice.to_owned(),
            correct_definition,
            is_correct,
            was_last: marked.was_last,
        };
        self.round.feedback = Some(feedback.clone());
        Some(feedback)
    }

    pub fn next(&mut self) -> Step {
        let step = self.review.next();
        self.refresh_round();
        step
    }

    pub fn reset_progress(&mut self) {
        self.review.reset_progress();
        self.refresh_round();
    }

    /// Swap in a fresh card list; options are re-dealt only if the question or
    /// the current card's definition changed.
    pub fn replace_cards(&mut self, cards: Vec<Flashcard>) {
        self.review.replace_cards(cards);
        self.refresh_round();
    }

    fn refresh_round(&mut self) {
        let current = self.review.current_card();
        let card_id = current.map(Flashcard::id);
        let definition = current.map(Flashcard::definition);
        if self.round.question != self.review.question()
            || self.round.card_id != card_id
            || self.round.definition.as_deref() != definition
        {
            self.deal();
        }
    }

    fn deal(&mut self) {
        let choices = build_choices(self.review.cards(), self.review.index(), &mut self.rng);
        self.round = Round {
            question: self.review.question(),
            card_id: self.review.current_card().map(Flashcard::id),
            definition: self
                .review
                .current_card()
                .map(|card| card.definition().to_owned()),
            choices,
            feedback: None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizzy_core::model::StudySetId;
    use rand::SeedableRng;

    fn card(id: u64, term: &str, definition: &str) -> Flashcard {
        Flashcard::from_persisted(FlashcardId::new(id), StudySetId::new(1), term, definition, false)
            .unwrap()
    }

    fn sample_cards(size: u64) -> Vec<Flashcard> {
        (1..=size)
            .map(|i| card(i, &format!("term {i}"), &format!("definition {i}")))
            .collect()
    }

    #[test]
    fn four_options_with_one_correct() {
        let cards = sample_cards(6);
        let mut rng = StdRng::seed_from_u64(7);

        let choices = build_choices(&cards, 2, &mut rng);
        let options = choices.options();
        assert_eq!(options.len(), 4);
        assert_eq!(
            options.iter().filter(|o| *o == "definition 3").count(),
            1
        );
        let mut unique = options.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn small_sets_offer_every_definition() {
        let cards = sample_cards(2);
        let choices = build_choices(&cards, 0, &mut StdRng::seed_from_u64(1));
        assert_eq!(choices.options().len(), 2);
    }

    #[test]
    fn single_card_is_insufficient() {
        let cards = sample_cards(1);
        let choices = build_choices(&cards, 0, &mut StdRng::seed_from_u64(1));
        assert_eq!(choices, Choices::Insufficient);
        assert_eq!(build_choices(&[], 0, &mut StdRng::seed_from_u64(1)), Choices::Insufficient);
    }

    #[test]
    fn duplicate_definitions_never_double_the_answer() {
        let cards = vec![
            card(1, "a", "same"),
            card(2, "b", "same"),
            card(3, "c", "other"),
            card(4, "d", "other"),
        ];
        let choices = build_choices(&cards, 0, &mut StdRng::seed_from_u64(3));
        let mut options = choices.options().to_vec();
        options.sort();
        assert_eq!(options, vec!["other".to_string(), "same".to_string()]);
    }

    #[test]
    fn same_seed_deals_same_options() {
        let a = QuizState::new(sample_cards(8), StdRng::seed_from_u64(42));
        let b = QuizState::new(sample_cards(8), StdRng::seed_from_u64(42));
        assert_eq!(a.choices(), b.choices());
    }

    #[test]
    fn choices_are_stable_within_a_question() {
        let mut quiz = QuizState::new(sample_cards(5), StdRng::seed_from_u64(9));
        let before = quiz.choices().clone();

        let feedback = quiz.submit_answer("definition 1").unwrap();
        assert!(feedback.is_correct);
        assert_eq!(quiz.choices(), &before);

        let mut refreshed = sample_cards(5);
        refreshed[0] = refreshed[0].clone().with_known(true);
        quiz.replace_cards(refreshed);
        assert_eq!(quiz.choices(), &before);
        assert!(quiz.is_answered());
    }

    #[test]
    fn answers_count_once_and_do_not_advance() {
        let mut quiz = QuizState::new(sample_cards(4), StdRng::seed_from_u64(5));

        let feedback = quiz.submit_answer("definition 4").unwrap();
        assert!(!feedback.is_correct);
        assert_eq!(feedback.correct_definition, "definition 1");
        assert_eq!(quiz.review().index(), 0);
        assert!(quiz.submit_answer("definition 1").is_none());
        assert_eq!(quiz.correct_count(), 0);
    }

    #[test]
    fn next_question_gets_fresh_round() {
        let mut quiz = QuizState::new(sample_cards(4), StdRng::seed_from_u64(11));
        quiz.submit_answer("definition 1");

        assert_eq!(quiz.next(), Step::Moved);
        assert!(!quiz.is_answered());
        assert!(quiz.choices().options().contains(&"definition 2".to_string()));
    }

    #[test]
    fn finishing_and_restarting() {
        let mut quiz = QuizState::new(sample_cards(4), StdRng::seed_from_u64(2));
        for i in 1..=4 {
            let feedback = quiz.submit_answer(&format!("definition {i}")).unwrap();
            assert_eq!(feedback.was_last, i == 4);
            quiz.next();
        }
        assert_eq!(quiz.correct_count(), 4);
        assert_eq!(quiz.next(), Step::AtEnd);

        quiz.reset_progress();
        assert_eq!(quiz.review().index(), 0);
        assert!(!quiz.is_answered());
        assert_eq!(quiz.correct_count(), 4);
    }

    #[test]
    fn deleting_current_card_redeals() {
        let mut quiz = QuizState::new(sample_cards(5), StdRng::seed_from_u64(4));
        quiz.submit_answer("definition 1");

        quiz.replace_cards(sample_cards(5).into_iter().skip(1).collect());
        assert!(!quiz.is_answered());
        assert!(quiz.choices().options().contains(&"definition 2".to_string()));
    }

    #[test]
    fn editing_current_definition_redeals() {
        let mut quiz = QuizState::new(sample_cards(5), StdRng::seed_from_u64(6));
        assert!(quiz.choices().options().contains(&"definition 1".to_string()));

        let mut edited = sample_cards(5);
        edited[0] = card(1, "term 1", "renamed");
        quiz.replace_cards(edited);

        let options = quiz.choices().options();
        assert!(!options.contains(&"definition 1".to_string()));
        assert_eq!(options.iter().filter(|o| *o == "renamed").count(), 1);
        let feedback = quiz.submit_answer("renamed").unwrap();
        assert!(feedback.is_correct);
        assert_eq!(feedback.correct_definition, "renamed");
    }

    #[test]
    fn editing_another_card_keeps_options() {
        let mut quiz = QuizState::new(sample_cards(5), StdRng::seed_from_u64(6));
        let before = quiz.choices().clone();

        let mut edited = sample_cards(5);
        edited[4] = card(5, "term 5", "changed elsewhere");
        quiz.replace_cards(edited);
        assert_eq!(quiz.choices(), &before);
    }

    #[test]
    fn choices_serialize_with_status_tag() {
        let json = serde_json::to_value(&Choices::Insufficient).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "insufficient" }));

        let ready = Choices::Ready(vec!["a".into(), "b".into()]);
        let json = serde_json::to_value(&ready).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["options"], serde_json::json!(["a", "b"]));
    }
}

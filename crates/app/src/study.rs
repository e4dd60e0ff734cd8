//! Interactive study loops.

use std::io::{self, Write};

use services::{Choices, FlashcardReview, MultipleChoiceQuiz, Step};
use tokio::io::AsyncBufRead;

use crate::console::Console;
use crate::vm::{
    CompletionPrompt, FeedbackView, correct_label, known_label, position_label, quiz_next_label,
    review_next_label,
};

/// How a study loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    BackToList,
    /// Nothing to study; go back to the previous screen.
    Back,
    Quit,
}

/// Offer a restart once the last card is done. Returns true to study again.
async fn study_again<R, W>(console: &mut Console<R, W>) -> io::Result<Option<bool>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    console.say(CompletionPrompt::TITLE)?;
    console.say(CompletionPrompt::MESSAGE)?;
    let answer = console
        .prompt(format!(
            "[s] {}  [b] {} >",
            CompletionPrompt::STUDY_AGAIN,
            CompletionPrompt::BACK_TO_LIST
        ))
        .await?;
    Ok(answer.map(|a| a.eq_ignore_ascii_case("s")))
}

pub async fn run_review<R, W>(console: &mut Console<R, W>, review: &FlashcardReview) -> io::Result<Exit>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    console.say(format!("Studying {} (flashcards)", review.study_set().title()))?;
    loop {
        let snapshot = review.snapshot();
        let Some(card) = snapshot.current.as_ref() else {
            console.say("This set has no cards yet.")?;
            return Ok(Exit::Back);
        };

        console.say(format!(
            "[{}]  ✓ {}",
            position_label(&snapshot.progress),
            known_label(snapshot.progress.known)
        ))?;
        if snapshot.revealed {
            console.say(format!("ANSWER: {}", card.definition()))?;
        } else {
            console.say(format!("QUESTION: {}", card.term()))?;
        }

        let Some(line) = console
            .prompt(format!(
                "[f]lip  [k]now it  [d]on't know  [n] {}  [p]revious  [q]uit >",
                review_next_label(snapshot.progress.is_last)
            ))
            .await?
        else {
            return Ok(Exit::Quit);
        };

        let finished = match line.as_str() {
            "" | "f" => {
                review.flip();
                false
            }
            "k" => review.mark_known().is_some_and(|m| m.was_last),
            "d" => review.mark_unknown().is_some_and(|m| m.was_last),
            "n" => review.next() == Step::AtEnd,
            "p" => {
                if !review.previous() {
                    console.say("Already at the first card.")?;
                }
                false
            }
            "q" => return Ok(Exit::Quit),
            other => {
                console.say(format!("Unknown command: {other}"))?;
                false
            }
        };

        if finished {
            match study_again(console).await? {
                Some(true) => review.reset_progress(),
                Some(false) => return Ok(Exit::BackToList),
                None => return Ok(Exit::Quit),
            }
        }
    }
}

pub async fn run_quiz<R, W>(console: &mut Console<R, W>, quiz: &MultipleChoiceQuiz) -> io::Result<Exit>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    console.say(format!("Studying {} (multiple choice)", quiz.study_set().title()))?;
    loop {
        let snapshot = quiz.snapshot();
        let Some(card) = snapshot.review.current.as_ref() else {
            console.say("This set has no cards yet.")?;
            return Ok(Exit::Back);
        };
        let options = match &snapshot.choices {
            Choices::Insufficient => {
                console.say("Not enough cards left for multiple choice.")?;
                return Ok(Exit::Back);
            }
            Choices::Ready(options) => options.clone(),
        };

        console.say(format!(
            "[{}]  ✓ {}",
            position_label(&snapshot.review.progress),
            correct_label(snapshot.review.progress.known)
        ))?;
        console.say(format!("QUESTION: {}", card.term()))?;
        for (i, option) in options.iter().enumerate() {
            console.say(format!("  {}) {option}", i + 1))?;
        }

        let answer = loop {
            let Some(line) = console
                .prompt(format!("Pick 1-{} or [q]uit >", options.len()))
                .await?
            else {
                return Ok(Exit::Quit);
            };
            if line == "q" {
                return Ok(Exit::Quit);
            }
            match line.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => break options[n - 1].clone(),
                _ => console.say(format!("Enter a number between 1 and {}.", options.len()))?,
            }
        };

        let Some(feedback) = quiz.submit_answer(&answer) else {
            continue;
        };
        let view = FeedbackView::from(&feedback);
        console.say(view.title)?;
        console.say(&view.message)?;

        let Some(line) = console
            .prompt(format!("[enter] {}  [q]uit >", quiz_next_label(feedback.was_last)))
            .await?
        else {
            return Ok(Exit::Quit);
        };
        if line == "q" {
            return Ok(Exit::Quit);
        }

        if feedback.was_last {
            match study_again(console).await? {
                Some(true) => quiz.reset_progress(),
                Some(false) => return Ok(Exit::BackToList),
                None => return Ok(Exit::Quit),
            }
        } else {
            quiz.next();
        }
    }
}

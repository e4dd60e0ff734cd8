use std::error::Error;
use std::io::Write;

use quizzy_core::model::{StudyMode, StudySetId};
use services::{AppServices, QuizStart, StudySetServiceError};
use tokio::io::AsyncBufRead;

use crate::args::{Command, print_usage};
use crate::console::Console;
use crate::routes::Route;
use crate::study::{self, Exit};
use crate::vm::{self, StudySetRow};

type CommandResult<T = ()> = Result<T, Box<dyn Error>>;

/// Runs commands and screens against one set of services.
pub struct Shell<'a, R, W> {
    services: &'a AppServices,
    console: Console<R, W>,
}

impl<'a, R, W> Shell<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(services: &'a AppServices, console: Console<R, W>) -> Self {
        Self { services, console }
    }

    #[cfg(test)]
    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Execute `command`, then wait for background writes even if it failed.
    pub async fn run(&mut self, command: Command) -> CommandResult {
        let outcome = self.execute(command).await;
        self.services.study_sets().flush_pending_writes().await;
        outcome
    }

    pub async fn execute(&mut self, command: Command) -> CommandResult {
        let study_sets = self.services.study_sets();
        match command {
            Command::Help => {
                print_usage();
                Ok(())
            }
            Command::Sets { json: true } => self.print_sets_json().await,
            Command::Sets { json: false } => self.open(Route::StudySetList).await,
            Command::CreateSet { title, description } => {
                let created = study_sets.create_study_set(&title, &description).await;
                if let Some(set_id) = self.inline(created)? {
                    self.console.say(format!("Created study set #{set_id}"))?;
                    self.open(Route::StudySetDetail(set_id)).await?;
                }
                Ok(())
            }
            Command::ShowSet { set_id } => self.open(Route::StudySetDetail(set_id)).await,
            Command::RenameSet {
                set_id,
                title,
                description,
            } => {
                let renamed = study_sets
                    .rename_study_set(set_id, &title, description.as_deref())
                    .await;
                if self.inline(renamed)?.is_some() {
                    self.console.say(format!("Renamed study set #{set_id}"))?;
                }
                Ok(())
            }
            Command::DeleteSet { set_id, yes } => {
                let set = study_sets.get_study_set(set_id).await?;
                let question = format!("Delete \"{}\" and all of its cards?", set.title());
                if self.console.confirm(&question, yes).await? {
                    study_sets.delete_study_set(set_id).await?;
                    self.console.say(format!("Deleted study set #{set_id}"))?;
                }
                Ok(())
            }
            Command::AddCard {
                set_id,
                term,
                definition,
            } => {
                let added = study_sets.add_flashcard(set_id, &term, &definition).await;
                if let Some(card_id) = self.inline(added)? {
                    self.console.say(format!("Added flashcard #{card_id}"))?;
                }
                Ok(())
            }
            Command::EditCard {
                card_id,
                term,
                definition,
            } => {
                let edited = study_sets.edit_flashcard(card_id, &term, &definition).await;
                if self.inline(edited)?.is_some() {
                    self.console.say(format!("Updated flashcard #{card_id}"))?;
                }
                Ok(())
            }
            Command::DeleteCard { card_id, yes } => {
                let card = study_sets.get_flashcard(card_id).await?;
                let question = format!(
                    "Are you sure you want to delete this flashcard? Term: \"{}\"",
                    card.term()
                );
                if self.console.confirm(&question, yes).await? {
                    study_sets.delete_flashcard(card_id).await?;
                    self.console.say(format!("Deleted flashcard #{card_id}"))?;
                }
                Ok(())
            }
            Command::Study {
                set_id,
                mode: None,
                ..
            } => self.open(Route::StudyModeSelection(set_id)).await,
            Command::Study {
                set_id,
                mode: Some(mode),
                seed,
            } => {
                let next = self.study(set_id, mode, seed).await?;
                self.follow(next).await
            }
            Command::Open(route) => self.open(route).await,
        }
    }

    /// Show `route` and keep following the screens it leads to.
    pub async fn open(&mut self, route: Route) -> CommandResult {
        self.follow(Some(route)).await
    }

    async fn follow(&mut self, mut next: Option<Route>) -> CommandResult {
        while let Some(route) = next {
            log::debug!("navigating to {route}");
            next = self.show(route).await?;
        }
        Ok(())
    }

    async fn show(&mut self, route: Route) -> CommandResult<Option<Route>> {
        match route {
            Route::StudySetList => self.show_list().await.map(|()| None),
            Route::CreateSet => self.create_set_form().await,
            Route::StudySetDetail(set_id) => self.show_detail(set_id).await.map(|()| None),
            Route::CreateFlashcard(set_id) => self.create_card_form(set_id).await,
            Route::StudyModeSelection(set_id) => self.select_mode(set_id).await,
            Route::FlashcardReview(set_id) => self.study(set_id, StudyMode::Flashcards, None).await,
            Route::MultipleChoice(set_id) => {
                self.study(set_id, StudyMode::MultipleChoice, None).await
            }
        }
    }

    /// Print a validation failure inline and swallow it.
    fn inline<T>(&mut self, result: Result<T, StudySetServiceError>) -> CommandResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(StudySetServiceError::Validation(err)) => {
                self.console.say(vm::validation_message(&err))?;
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    //
    // ─── SCREENS ───────────────────────────────────────────────────────────────
    //

    async fn rows(&self) -> CommandResult<Vec<StudySetRow>> {
        let summaries = self.services.study_sets().list_study_sets_with_counts().await?;
        Ok(summaries.iter().map(StudySetRow::from).collect())
    }

    async fn print_sets_json(&mut self) -> CommandResult {
        let rows = self.rows().await?;
        self.console.say(serde_json::to_string_pretty(&rows)?)?;
        Ok(())
    }

    async fn show_list(&mut self) -> CommandResult {
        let rows = self.rows().await?;
        if rows.is_empty() {
            self.console
                .say("No study sets yet. Create one with: quizzy create-set --title <title>")?;
            return Ok(());
        }
        for row in rows {
            self.console
                .say(format!("#{:<4} {}  ({})", row.id, row.title, row.card_count_label))?;
            if !row.description.is_empty() {
                self.console.say(format!("      {}", row.description))?;
            }
        }
        Ok(())
    }

    async fn show_detail(&mut self, set_id: StudySetId) -> CommandResult {
        let (set, cards) = self
            .services
            .study_sets()
            .get_study_set_with_cards(set_id)
            .await?;
        self.console.say(set.title())?;
        if !set.description().is_empty() {
            self.console.say(set.description())?;
        }
        self.console.say(vm::card_count_label(cards.len()))?;
        for (number, card) in cards.iter().enumerate() {
            self.console
                .say(format!("Question #{} [card {}]", number + 1, card.id()))?;
            self.console.say(format!("  Question: {}", card.term()))?;
            self.console.say(format!("  Answer:   {}", card.definition()))?;
        }
        Ok(())
    }

    async fn create_set_form(&mut self) -> CommandResult<Option<Route>> {
        loop {
            let Some(title) = self.console.prompt("Study Set Title:").await? else {
                return Ok(None);
            };
            let Some(description) = self.console.prompt("Description (Optional):").await? else {
                return Ok(None);
            };
            let created = self
                .services
                .study_sets()
                .create_study_set(&title, &description)
                .await;
            if let Some(set_id) = self.inline(created)? {
                return Ok(Some(Route::StudySetDetail(set_id)));
            }
        }
    }

    async fn create_card_form(&mut self, set_id: StudySetId) -> CommandResult<Option<Route>> {
        loop {
            let Some(term) = self.console.prompt("Term:").await? else {
                return Ok(None);
            };
            let Some(definition) = self.console.prompt("Definition:").await? else {
                return Ok(None);
            };
            let added = self
                .services
                .study_sets()
                .add_flashcard(set_id, &term, &definition)
                .await;
            if self.inline(added)?.is_some() {
                return Ok(Some(Route::StudySetDetail(set_id)));
            }
        }
    }

    async fn select_mode(&mut self, set_id: StudySetId) -> CommandResult<Option<Route>> {
        let (set, cards) = self
            .services
            .study_sets()
            .get_study_set_with_cards(set_id)
            .await?;
        let options = vm::mode_options(cards.len());

        self.console.say(set.title())?;
        self.console.say("How would you like to study?")?;
        self.console.say(format!("{} flashcards", cards.len()))?;
        for (i, option) in options.iter().enumerate() {
            let note = option.disabled_message.as_deref().unwrap_or(option.description);
            self.console
                .say(format!("  [{}] {}: {note}", i + 1, option.title))?;
        }

        loop {
            let Some(line) = self.console.prompt("Choose a mode or [b]ack >").await? else {
                return Ok(None);
            };
            if line == "b" {
                return Ok(Some(Route::StudyModeSelection(set_id).parent()));
            }
            let picked = line
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i));
            match picked {
                Some(option) if option.enabled => {
                    return Ok(Some(Route::study(set_id, option.mode)));
                }
                Some(option) => {
                    let message = option.disabled_message.clone().unwrap_or_default();
                    self.console.say(message)?;
                }
                None => self.console.say("Pick one of the listed modes.")?,
            }
        }
    }

    async fn study(
        &mut self,
        set_id: StudySetId,
        mode: StudyMode,
        seed: Option<u64>,
    ) -> CommandResult<Option<Route>> {
        let sessions = self.services.sessions();
        let exit = match mode {
            StudyMode::Flashcards => {
                let review = sessions.open_flashcards(set_id).await?;
                let exit = study::run_review(&mut self.console, &review).await?;
                review.close();
                exit
            }
            StudyMode::MultipleChoice => {
                let start = match seed {
                    Some(seed) => sessions.open_quiz_seeded(set_id, seed).await?,
                    None => sessions.open_quiz(set_id).await?,
                };
                match start {
                    QuizStart::Ready(quiz) => {
                        let exit = study::run_quiz(&mut self.console, &quiz).await?;
                        quiz.close();
                        exit
                    }
                    QuizStart::InsufficientCards { available } => {
                        let option = &vm::mode_options(available)[1];
                        let message = option.disabled_message.clone().unwrap_or_default();
                        self.console.say(format!("{message} (this set has {available})"))?;
                        Exit::Back
                    }
                }
            }
        };

        Ok(match exit {
            Exit::BackToList => Some(Route::StudySetList),
            Exit::Back | Exit::Quit => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(services: &AppServices, command: Command, input: &str) -> String {
        let console = Console::new(input.as_bytes(), Vec::new());
        let mut shell = Shell::new(services, console);
        shell.execute(command).await.expect("command");
        String::from_utf8(shell.into_console().into_output()).unwrap()
    }

    async fn seeded(services: &AppServices, cards: usize) -> StudySetId {
        let study_sets = services.study_sets();
        let set_id = study_sets.create_study_set("Capitals", "").await.unwrap();
        for i in 1..=cards {
            study_sets
                .add_flashcard(set_id, &format!("country {i}"), &format!("city {i}"))
                .await
                .unwrap();
        }
        set_id
    }

    #[tokio::test]
    async fn blank_title_shows_inline_message() {
        let services = AppServices::in_memory();
        let out = run(
            &services,
            Command::CreateSet {
                title: "  ".into(),
                description: String::new(),
            },
            "",
        )
        .await;
        assert!(out.contains("Please enter a title to continue"));
        let listed = services.study_sets().list_study_sets_with_counts().await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn list_shows_card_counts() {
        let services = AppServices::in_memory();
        seeded(&services, 2).await;
        let out = run(&services, Command::Sets { json: false }, "").await;
        assert!(out.contains("Capitals"));
        assert!(out.contains("(2 cards)"));
    }

    #[tokio::test]
    async fn json_listing_is_parseable() {
        let services = AppServices::in_memory();
        seeded(&services, 1).await;
        let out = run(&services, Command::Sets { json: true }, "").await;
        let rows: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(rows[0]["card_count"], 1);
        assert_eq!(rows[0]["card_count_label"], "1 cards");
    }

    #[tokio::test]
    async fn quiz_needs_four_cards() {
        let services = AppServices::in_memory();
        let set_id = seeded(&services, 3).await;
        let out = run(
            &services,
            Command::Study {
                set_id,
                mode: Some(StudyMode::MultipleChoice),
                seed: Some(1),
            },
            "",
        )
        .await;
        assert!(out.contains("Need at least 4 cards"));
    }

    #[tokio::test]
    async fn review_session_to_completion() {
        let services = AppServices::in_memory();
        let set_id = seeded(&services, 2).await;
        // flip, know the first card, not the second, then go back to the list
        let out = run(
            &services,
            Command::Study {
                set_id,
                mode: Some(StudyMode::Flashcards),
                seed: None,
            },
            "f\nk\nd\nb\n",
        )
        .await;
        assert!(out.contains("QUESTION: country 1"));
        assert!(out.contains("ANSWER: city 1"));
        assert!(out.contains("[2 / 2]  ✓ 1 known"));
        assert!(out.contains("Congratulations!"));
        assert!(out.contains("(2 cards)"));
    }

    #[tokio::test]
    async fn quiz_session_reports_feedback() {
        let services = AppServices::in_memory();
        let set_id = seeded(&services, 4).await;
        let out = run(
            &services,
            Command::Study {
                set_id,
                mode: Some(StudyMode::MultipleChoice),
                seed: Some(3),
            },
            "1\nq\n",
        )
        .await;
        assert!(out.contains("QUESTION: country 1"));
        assert!(out.contains("Correct answer!") || out.contains("Nice try!"));
    }

    #[tokio::test]
    async fn mode_selection_refuses_disabled_quiz() {
        let services = AppServices::in_memory();
        let set_id = seeded(&services, 2).await;
        let out = run(&services, Command::Open(Route::StudyModeSelection(set_id)), "2\nb\n").await;
        assert!(out.contains("How would you like to study?"));
        assert!(out.contains("Need at least 4 cards"));
        assert!(out.contains("Question #2 [card"));
    }

    /// Yields `data` once, then fails every read.
    struct BrokenInput {
        data: Option<&'static [u8]>,
    }

    impl tokio::io::AsyncRead for BrokenInput {
        fn poll_read(
            mut self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(match self.data.take() {
                Some(data) => {
                    buf.put_slice(data);
                    Ok(())
                }
                None => Err(std::io::Error::other("input closed")),
            })
        }
    }

    #[tokio::test]
    async fn failed_study_still_saves_marks() {
        let services = AppServices::in_memory();
        let set_id = seeded(&services, 2).await;
        let input = tokio::io::BufReader::new(BrokenInput {
            data: Some(&b"k\n"[..]),
        });
        let mut shell = Shell::new(&services, Console::new(input, Vec::new()));

        let result = shell
            .run(Command::Study {
                set_id,
                mode: Some(StudyMode::Flashcards),
                seed: None,
            })
            .await;
        assert!(result.is_err());

        let (_, cards) = services.study_sets().get_study_set_with_cards(set_id).await.unwrap();
        assert!(cards[0].is_known());
    }

    #[tokio::test]
    async fn delete_card_asks_first() {
        let services = AppServices::in_memory();
        let set_id = seeded(&services, 1).await;
        let (_, cards) = services.study_sets().get_study_set_with_cards(set_id).await.unwrap();
        let card_id = cards[0].id();

        run(&services, Command::DeleteCard { card_id, yes: false }, "n\n").await;
        assert!(services.study_sets().get_flashcard(card_id).await.is_ok());

        run(&services, Command::DeleteCard { card_id, yes: false }, "y\n").await;
        assert!(services.study_sets().get_flashcard(card_id).await.is_err());
    }
}

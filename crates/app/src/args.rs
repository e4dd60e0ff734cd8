use std::fmt;

use quizzy_core::model::{FlashcardId, StudyMode, StudySetId};
use storage::sqlite::normalize_sqlite_url;

use crate::routes::Route;

pub const DB_URL_ENV: &str = "QUIZZY_DB_URL";
pub const DEFAULT_DB_URL: &str = "sqlite://quizzy.sqlite3";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { command: &'static str, flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidMode { raw: String },
    InvalidSeed { raw: String },
    InvalidRoute { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => write!(f, "{command} requires {flag}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value (expected flashcards or quiz): {raw}")
            }
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidRoute { raw } => write!(f, "invalid route: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

pub fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Sets { json: bool },
    CreateSet { title: String, description: String },
    ShowSet { set_id: StudySetId },
    RenameSet { set_id: StudySetId, title: String, description: Option<String> },
    DeleteSet { set_id: StudySetId, yes: bool },
    AddCard { set_id: StudySetId, term: String, definition: String },
    EditCard { card_id: FlashcardId, term: String, definition: String },
    DeleteCard { card_id: FlashcardId, yes: bool },
    Study { set_id: StudySetId, mode: Option<StudyMode>, seed: Option<u64> },
    Open(Route),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: String,
    pub command: Command,
}

/// Flag values collected before a command is assembled.
#[derive(Default)]
struct Flags {
    json: bool,
    yes: bool,
    title: Option<String>,
    description: Option<String>,
    set_id: Option<StudySetId>,
    card_id: Option<FlashcardId>,
    term: Option<String>,
    definition: Option<String>,
    mode: Option<StudyMode>,
    seed: Option<u64>,
    positional: Vec<String>,
}

impl Flags {
    fn require<T>(value: Option<T>, command: &'static str, flag: &'static str) -> Result<T, ArgsError> {
        value.ok_or(ArgsError::MissingFlag { command, flag })
    }
}

fn parse_id<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { flag, raw })
}

impl Args {
    /// Parse `argv` (without the program name), taking the database default from
    /// `QUIZZY_DB_URL`.
    pub fn parse(argv: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let default_db = std::env::var(DB_URL_ENV).unwrap_or_else(|_| DEFAULT_DB_URL.into());
        Self::parse_with_db(argv, default_db)
    }

    fn parse_with_db(
        argv: impl IntoIterator<Item = String>,
        default_db: String,
    ) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter();
        let mut db_url = normalize_sqlite_url(&default_db);
        let mut flags = Flags::default();
        let mut name: Option<String> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(&value);
                }
                "--json" => flags.json = true,
                "--yes" | "-y" => flags.yes = true,
                "--title" => flags.title = Some(require_value(&mut args, "--title")?),
                "--description" => {
                    flags.description = Some(require_value(&mut args, "--description")?);
                }
                "--set" => {
                    flags.set_id = Some(parse_id("--set", require_value(&mut args, "--set")?)?);
                }
                "--card" => {
                    flags.card_id = Some(parse_id("--card", require_value(&mut args, "--card")?)?);
                }
                "--term" => flags.term = Some(require_value(&mut args, "--term")?),
                "--definition" => {
                    flags.definition = Some(require_value(&mut args, "--definition")?);
                }
                "--mode" => {
                    let value = require_value(&mut args, "--mode")?;
                    flags.mode = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?,
                    );
                }
                "--seed" => {
                    let value = require_value(&mut args, "--seed")?;
                    flags.seed = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?,
                    );
                }
                "--help" | "-h" => name = Some("help".into()),
                other if other.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ if name.is_none() => name = Some(arg),
                _ => flags.positional.push(arg),
            }
        }

        let command = Self::command(name.as_deref().unwrap_or("sets"), flags)?;
        Ok(Self { db_url, command })
    }

    fn command(name: &str, mut flags: Flags) -> Result<Command, ArgsError> {
        if name != "open" && name != "help" {
            if let Some(extra) = flags.positional.pop() {
                return Err(ArgsError::UnknownArg(extra));
            }
        }

        let command = match name {
            "help" => Command::Help,
            "sets" => Command::Sets { json: flags.json },
            "create-set" => Command::CreateSet {
                title: Flags::require(flags.title, "create-set", "--title")?,
                description: flags.description.unwrap_or_default(),
            },
            "show-set" => Command::ShowSet {
                set_id: Flags::require(flags.set_id, "show-set", "--set")?,
            },
            "rename-set" => Command::RenameSet {
                set_id: Flags::require(flags.set_id, "rename-set", "--set")?,
                title: Flags::require(flags.title, "rename-set", "--title")?,
                description: flags.description,
            },
            "delete-set" => Command::DeleteSet {
                set_id: Flags::require(flags.set_id, "delete-set", "--set")?,
                yes: flags.yes,
            },
            "add-card" => Command::AddCard {
                set_id: Flags::require(flags.set_id, "add-card", "--set")?,
                term: Flags::require(flags.term, "add-card", "--term")?,
                definition: Flags::require(flags.definition, "add-card", "--definition")?,
            },
            "edit-card" => Command::EditCard {
                card_id: Flags::require(flags.card_id, "edit-card", "--card")?,
                term: Flags::require(flags.term, "edit-card", "--term")?,
                definition: Flags::require(flags.definition, "edit-card", "--definition")?,
            },
            "delete-card" => Command::DeleteCard {
                card_id: Flags::require(flags.card_id, "delete-card", "--card")?,
                yes: flags.yes,
            },
            "study" => Command::Study {
                set_id: Flags::require(flags.set_id, "study", "--set")?,
                mode: flags.mode,
                seed: flags.seed,
            },
            "open" => {
                let raw = Flags::require(flags.positional.pop(), "open", "<route>")?;
                Command::Open(
                    raw.parse()
                        .map_err(|_| ArgsError::InvalidRoute { raw: raw.clone() })?,
                )
            }
            other => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };
        Ok(command)
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quizzy [--db <sqlite_url>] <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  sets [--json]                                   List study sets (default)");
    eprintln!("  create-set --title <t> [--description <d>]      Create a study set");
    eprintln!("  show-set --set <id>                             Show a set and its cards");
    eprintln!("  rename-set --set <id> --title <t> [--description <d>]");
    eprintln!("  delete-set --set <id> [--yes]                   Delete a set and its cards");
    eprintln!("  add-card --set <id> --term <t> --definition <d> Add a flashcard");
    eprintln!("  edit-card --card <id> --term <t> --definition <d>");
    eprintln!("  delete-card --card <id> [--yes]                 Delete a flashcard");
    eprintln!("  study --set <id> [--mode flashcards|quiz] [--seed <n>]");
    eprintln!("  open <route>                                    e.g. /sets/1/study/quiz");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {DB_URL_ENV}, QUIZZY_WRITE_RETRIES, RUST_LOG");
}

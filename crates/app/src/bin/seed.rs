use std::fmt;

use services::{AppServices, WriteRetryPolicy};
use storage::sqlite::{normalize_sqlite_url, prepare_sqlite_file};

const DEFAULT_DB_URL: &str = "sqlite://quizzy.sqlite3";

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    title: String,
    description: String,
    cards: u32,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCards { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCards { raw } => write!(f, "invalid --cards value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = normalize_sqlite_url(
            &std::env::var("QUIZZY_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.into()),
        );
        let mut title =
            std::env::var("QUIZZY_SEED_TITLE").unwrap_or_else(|_| "Spanish Basics".into());
        let mut description = std::env::var("QUIZZY_SEED_DESCRIPTION")
            .unwrap_or_else(|_| "Everyday greetings and phrases".into());
        let mut cards = std::env::var("QUIZZY_SEED_CARDS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(8);

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(&value);
                }
                "--title" => title = require_value(&mut args, "--title")?,
                "--description" => description = require_value(&mut args, "--description")?,
                "--cards" => {
                    let value = require_value(&mut args, "--cards")?;
                    cards = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidCards { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            title,
            description,
            cards,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: {DEFAULT_DB_URL})");
    eprintln!("  --title <text>            Study set title (default: Spanish Basics)");
    eprintln!("  --description <text>      Study set description");
    eprintln!("  --cards <n>               Number of sample cards to add (default: 8)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!(
        "  QUIZZY_DB_URL, QUIZZY_SEED_TITLE, QUIZZY_SEED_DESCRIPTION, QUIZZY_SEED_CARDS"
    );
}

const SAMPLES: [(&str, &str); 8] = [
    ("Hola", "Hello"),
    ("Gracias", "Thank you"),
    ("Por favor", "Please"),
    ("Adiós", "Goodbye"),
    ("Buenos días", "Good morning"),
    ("Buenas noches", "Good night"),
    ("Perdón", "Sorry / Excuse me"),
    ("¿Cómo estás?", "How are you?"),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, WriteRetryPolicy::no_retry()).await?;
    let study_sets = services.study_sets();

    let set_id = study_sets
        .create_study_set(&args.title, &args.description)
        .await?;

    for i in 0..args.cards {
        let idx = (i as usize) % SAMPLES.len();
        let round = (i as usize) / SAMPLES.len();
        let (term, definition) = SAMPLES[idx];
        // Later rounds get a suffix so quiz distractors stay distinct.
        let (term, definition) = if round == 0 {
            (term.to_string(), definition.to_string())
        } else {
            (
                format!("{term} ({})", round + 1),
                format!("{definition} ({})", round + 1),
            )
        };
        study_sets.add_flashcard(set_id, &term, &definition).await?;
    }

    log::info!("seeded study set {set_id}");
    println!(
        "Seeded study set #{set_id} with {} cards into {}",
        args.cards, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

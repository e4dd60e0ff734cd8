mod args;
mod commands;
mod console;
mod routes;
mod study;
mod vm;

use services::{AppServices, WriteRetryPolicy};
use storage::sqlite::prepare_sqlite_file;
use tokio::io::BufReader;

use crate::args::{Args, Command, print_usage};
use crate::commands::Shell;
use crate::console::Console;

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if args.command == Command::Help {
        print_usage();
        return Ok(());
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, WriteRetryPolicy::from_env()).await?;
    log::debug!("using database {}", args.db_url);

    let console = Console::new(BufReader::new(tokio::io::stdin()), std::io::stdout());
    let mut shell = Shell::new(&services, console);
    shell.run(args.command).await
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

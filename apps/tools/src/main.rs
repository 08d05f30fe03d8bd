use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use storage::{RosterSeed, RosterStore, SqliteRosterStore};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://roster.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create any seeded activities that are missing from the database.
    Seed {
        #[arg(long)]
        seed_file: Option<PathBuf>,
    },
    /// Print the stored roster as JSON.
    Dump,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let store = SqliteRosterStore::new(&cli.database_url).await?;

    match cli.command {
        Command::Seed { seed_file } => {
            let seed = match seed_file {
                Some(path) => RosterSeed::load(&path)?,
                None => RosterSeed::builtin()?,
            };
            let created = store.provision(&seed).await?;
            println!(
                "created {created} of {} activities in {}",
                seed.activities.len(),
                cli.database_url
            );
        }
        Command::Dump => {
            let snapshot = store.list().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}

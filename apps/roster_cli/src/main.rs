use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{BannerKind, HttpRosterApi, RosterController, ViewState};
use shared::domain::ActivitySnapshot;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every activity with its current roster.
    List,
    Signup {
        activity: String,
        email: String,
    },
    Unregister {
        activity: String,
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let args = Args::parse();

    let api = HttpRosterApi::new(&args.server_url)?;
    debug!(server_url = %api.server_url(), command = ?args.command, "running roster command");
    let controller = RosterController::new(api);

    let succeeded = match args.command {
        Command::List => controller.refresh().await.is_ok(),
        Command::Signup { activity, email } => {
            controller.select_activity(activity).await;
            controller.set_email(email).await;
            match controller.submit_signup().await {
                Some(outcome) => outcome.is_ok(),
                None => bail!("both an activity and an email are required"),
            }
        }
        Command::Unregister { activity, email } => {
            controller.unregister(&activity, &email).await.is_ok()
        }
    };

    if let Some(banner) = controller.banner().await {
        match banner.kind {
            BannerKind::Success => println!("{}", banner.text),
            BannerKind::Error => eprintln!("error: {}", banner.text),
        }
    }

    match controller.view().await {
        ViewState::Ready(snapshot) => print_roster(&snapshot),
        ViewState::Error(message) => eprintln!("{message}"),
        ViewState::Loading => {}
    }

    if !succeeded {
        warn!(server_url = %args.server_url, "roster command failed");
        std::process::exit(1);
    }
    Ok(())
}

fn print_roster(snapshot: &ActivitySnapshot) {
    if snapshot.is_empty() {
        println!("No activities available.");
        return;
    }

    for (name, activity) in snapshot {
        println!();
        println!("{name}");
        println!("  {}", activity.description);
        println!("  Schedule: {}", activity.schedule);
        println!(
            "  Availability: {} of {} spots left",
            activity.spots_left(),
            activity.max_participants
        );
        if activity.participants.is_empty() {
            println!("  No participants yet");
        }
        for email in &activity.participants {
            println!("  - {email}");
        }
    }
}

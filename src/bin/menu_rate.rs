//! Command-line client for the mess menu ratings service.

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use menu_ratings::{
    client::{guard::SubmissionLedger, ClientError, RatingClient},
    clock::{parse_offset, Clock, SystemClock},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "menu-rate")]
#[command(about = "Rate today's meals and read the running averages")]
#[command(version)]
struct Args {
    /// Base URL of the ratings server
    #[arg(long, default_value = "http://localhost:5000", env = "MENU_API_URL")]
    base_url: String,

    /// Where today's submissions are remembered
    #[arg(long, default_value = ".menu-ratings.json", env = "MENU_LEDGER")]
    ledger: PathBuf,

    /// Local UTC offset, e.g. +05:30
    #[arg(long, default_value = "+00:00", env = "MENU_UTC_OFFSET")]
    utc_offset: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a 1-5 star rating for a meal
    Submit { meal: String, rating: i64 },
    /// Show the current averages
    Ratings,
    /// Show which meals were already rated today on this device
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "menu_ratings=warn".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(parse_offset(&args.utc_offset)?));
    let ledger = SubmissionLedger::load(&args.ledger)?;
    let mut client = RatingClient::new(&args.base_url, ledger, clock.clone())?;

    match args.command {
        Command::Submit { meal, rating } => match client.submit(&meal, rating).await {
            Ok(outcome) => println!(
                "{} ({}: {:.1} from {} ratings)",
                outcome.message,
                outcome.rating.meal,
                outcome.rating.average_rating,
                outcome.rating.rating_count
            ),
            Err(
                e @ (ClientError::NotEligible(_)
                | ClientError::AlreadySubmitted(_)
                | ClientError::Validation(_)),
            ) => {
                eprintln!("{e}");
                std::process::exit(2);
            }
            Err(e) => return Err(e.into()),
        },
        Command::Ratings => {
            for r in client.ratings().await? {
                println!("{:<10} {:>4.1}  ({} ratings)", r.meal, r.average_rating, r.rating_count);
            }
        }
        Command::Status => {
            let today = clock.now().date();
            let mut any = false;
            for (meal, record) in client.ledger().records().filter(|(_, r)| r.date == today) {
                println!("{meal:<10} rated {} today", record.rating);
                any = true;
            }
            if !any {
                println!("nothing rated today");
            }
        }
    }
    Ok(())
}

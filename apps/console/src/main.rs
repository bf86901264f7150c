use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use shared_config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "doctor-booking", version, about = "Doctor booking client console")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dates a patient can book, starting tomorrow
    Dates {
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Bookable slots of a doctor on a date
    Slots {
        #[arg(long)]
        doctor_id: String,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Weekly schedule of the logged-in doctor
    Schedule,
    /// Appointments of the logged-in doctor, today's by default
    Appointments {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, conflicts_with = "date")]
        all_dates: bool,
        #[arg(long)]
        search: Option<String>,
    },
    /// Where the dashboard would send the logged-in doctor
    Route,
    /// Block until the pending subscription payment is approved
    WaitApproval,
}

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    info!("Using backend at {}", config.api_base_url);

    let result = match cli.command {
        Command::Dates { today } => commands::dates(today),
        Command::Slots { doctor_id, date } => commands::slots(&config, &doctor_id, date).await,
        Command::Schedule => commands::schedule(&config).await,
        Command::Appointments { status, date, all_dates, search } => {
            commands::appointments(&config, status, date, all_dates, search).await
        }
        Command::Route => commands::route(&config).await,
        Command::WaitApproval => commands::wait_approval(&config).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

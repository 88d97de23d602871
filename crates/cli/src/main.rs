//! SmartMeds CLI: the main entry point.
//!
//! Commands:
//! - `onboard` : Write a default config file
//! - `status`  : Show the effective configuration
//! - `show`    : Print every record with its current risk tier
//! - `classify`: Classify every record and write the risk column back
//! - `search`  : Filter records by medication names
//! - `advise`  : Ask for medication-safety advice for one case

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "smartmeds",
    about = "SmartMeds: polypharmacy risk triage for elderly care records",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the built-in sample ward instead of the configured spreadsheet
    #[arg(long, global = true)]
    demo: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard,

    /// Show the effective configuration
    Status {
        /// Also try the record store and the text-generation provider
        #[arg(long)]
        check: bool,
    },

    /// Print every record
    Show {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify every record and write the risk column back
    Classify {
        /// Override the configured strategy (rule | model)
        #[arg(short, long)]
        classifier: Option<String>,
    },

    /// Filter records by medication names (comma-separated)
    Search {
        /// e.g. "warfarin, digoxin"
        query: String,
    },

    /// Medication-safety advice for a single case
    Advise {
        /// Comma-separated drug names
        #[arg(short, long)]
        drugs: String,

        /// Patient age in years
        #[arg(short, long)]
        age: String,

        /// Comma-separated comorbidities
        #[arg(short, long, default_value = "")]
        conditions: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let demo = cli.demo;
    let result = match cli.command {
        Commands::Onboard => commands::onboard::run().await,
        Commands::Status { check } => commands::status::run(demo, check).await,
        Commands::Show { json } => commands::show::run(demo, json).await,
        Commands::Classify { classifier } => commands::classify::run(demo, classifier).await,
        Commands::Search { query } => commands::search::run(demo, &query).await,
        Commands::Advise {
            drugs,
            age,
            conditions,
        } => commands::advise::run(demo, &drugs, &age, &conditions).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

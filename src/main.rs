use clap::{Args, Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use retail_etl::cli::{self, CARDS_TABLE, Destination, STORES_TABLE, USERS_TABLE};
use std::path::PathBuf;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Retail ETL: extract users, card details and stores, clean them, and load them into a target database
#[derive(Parser)]
#[command(name = "retl", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source API credentials from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// YAML file overriding the country and dialing code tables
    #[arg(short, long, global = true)]
    mappings: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the legacy user table and load it
    Users {
        /// Credentials file for the source database
        #[arg(short, long, default_value = "db_creds.yaml")]
        source: PathBuf,

        /// Table to read users from
        #[arg(short, long, default_value = "legacy_users")]
        table: String,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Extract card details from a PDF, clean them, and load them
    Cards {
        /// Path or http(s) URL of the PDF document
        pdf: String,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Fetch store details from the API and load them
    Stores {
        #[command(flatten)]
        load: LoadArgs,
    },

    /// List the tables in a database
    Tables {
        /// Credentials file for the database
        #[arg(default_value = "db_creds.yaml")]
        source: PathBuf,
    },
}

#[derive(Args)]
struct LoadArgs {
    /// Credentials file for the target database
    #[arg(long, default_value = "local_db_creds.yaml")]
    target: PathBuf,

    /// Name of the table to replace in the target database
    #[arg(short, long)]
    name: Option<String>,

    /// Write an NDJSON file instead of loading into the database
    #[arg(short, long, conflicts_with = "dry_run")]
    output: Option<PathBuf>,

    /// Print a preview of the cleaned table instead of loading it
    #[arg(long)]
    dry_run: bool,
}

impl LoadArgs {
    fn destination(self, default_name: &str) -> Destination {
        match (self.dry_run, self.output) {
            (true, _) => Destination::Preview,
            (false, Some(path)) => Destination::Ndjson(path),
            (false, None) => Destination::Database {
                credentials: self.target,
                name: self.name.unwrap_or_else(|| default_name.to_string()),
            },
        }
    }
}

fn describe(destination: &Destination) -> String {
    match destination {
        Destination::Database { credentials, name } => {
            format!("table {} ({})", name.cyan(), credentials.display().bright_black())
        }
        Destination::Ndjson(path) => format!("{}", path.display().bright_black()),
        Destination::Preview => format!("{}", "preview".cyan()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::from_filename(&cli.env);

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if let Err(e) = dotenv {
        log::debug!("No environment loaded from {}: {}", cli.env.bright_black(), e);
    }

    match cli.command {
        Commands::Users {
            source,
            table,
            load,
        } => {
            let config = cli::load_cleaning_config(cli.mappings.as_deref())?;
            let destination = load.destination(USERS_TABLE);
            log::info!(
                "Cleaning users from {} to {}",
                table.bright_black(),
                describe(&destination)
            );
            let count = cli::run_users(&source, &table, config, destination).await?;
            log::info!("✓ Processed {} user(s)", count);
        }
        Commands::Cards { pdf, load } => {
            let destination = load.destination(CARDS_TABLE);
            log::info!(
                "Cleaning card details from {} to {}",
                pdf.bright_black(),
                describe(&destination)
            );
            let count = cli::run_cards(&pdf, destination).await?;
            log::info!("✓ Processed {} card(s)", count);
        }
        Commands::Stores { load } => {
            let destination = load.destination(STORES_TABLE);
            log::info!("Fetching store details to {}", describe(&destination));
            let count = cli::run_stores(destination).await?;
            log::info!("✓ Processed {} store(s)", count);
        }
        Commands::Tables { source } => {
            for table in cli::list_tables(&source).await? {
                println!("{}", table);
            }
        }
    }

    Ok(())
}

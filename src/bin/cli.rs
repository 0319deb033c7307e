//! valevista CLI
//!
//! Local driver for the watcher pipeline. The chat-platform adapter is
//! external; this binary exercises the same library surface it would
//! use: one-shot queries, subscription management, and the background
//! sweep with a log-only notifier.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use valevista_watch::{
    config::Config,
    error::Result,
    messages,
    models::Rut,
    pipeline::{self, LogNotifier},
    services::BankClient,
    storage::{self, UserRepo},
};

/// valevista - Banco de Chile vale vista watcher
#[derive(Parser, Debug)]
#[command(name = "valevista", version, about = "Vale vista watcher")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "valevista.toml")]
    config: PathBuf,

    /// Override the database URL from the configuration
    #[arg(long)]
    database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query the bank for a RUT and print the result
    Check {
        /// RUT including its check digit, e.g. 12.345.678-5
        rut: String,

        /// Platform user id to query as
        #[arg(long, default_value_t = 0)]
        user: i64,
    },

    /// Store a RUT for a platform user
    SetRut {
        /// Platform user id
        user: i64,
        /// RUT including its check digit
        rut: String,
    },

    /// Subscribe a platform user to proactive notifications
    Subscribe {
        user: i64,
        chat: i64,
    },

    /// Remove a subscription
    Unsubscribe {
        user: i64,
        chat: i64,
    },

    /// Run a single sweep tick
    Sweep,

    /// Run the sweep loop until interrupted
    Watch,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Parse a RUT argument, explaining what is wrong when it fails.
fn parse_rut_arg(text: &str) -> Option<Rut> {
    match Rut::parse(text) {
        Some(rut) => Some(rut),
        None => {
            if Rut::looks_like(text) {
                eprintln!("{}", messages::LOOKS_LIKE_RUT);
            } else {
                eprintln!("'{text}' no es un rut válido.");
            }
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(database) = cli.database {
        config.database.url = database;
    }
    config.validate()?;

    let pool = storage::connect(&config.database.url).await?;

    match cli.command {
        Command::Check { rut, user } => {
            let Some(rut) = parse_rut_arg(&rut) else {
                return Ok(());
            };
            let client = BankClient::new(&config.http)?;
            match pipeline::run_query(&pool, &client, &rut, user, config.cache.expiry()).await {
                Ok(outcome) => {
                    println!("{}", outcome.display_text());
                    if outcome.from_cache() {
                        log::info!("Served from cache");
                    }
                    if outcome.is_notable() {
                        log::info!("New results worth notifying about");
                    }
                }
                Err(error) => {
                    log::warn!("Query failed: {error}");
                    println!("{}", error.public_message());
                }
            }
        }

        Command::SetRut { user, rut } => {
            let Some(rut) = parse_rut_arg(&rut) else {
                return Ok(());
            };
            UserRepo::set_rut(&pool, user, &rut).await?;
            println!("Rut {rut} guardado correctamente.");
        }

        Command::Subscribe { user, chat } => match UserRepo::subscribe(&pool, user, chat).await {
            Ok(()) => println!("Subscripción creada."),
            Err(error) => println!("{}", error.public_message()),
        },

        Command::Unsubscribe { user, chat } => {
            match UserRepo::unsubscribe(&pool, user, chat).await {
                Ok(()) => println!("Subscripción eliminada."),
                Err(error) => println!("{}", error.public_message()),
            }
        }

        Command::Sweep => {
            let client = BankClient::new(&config.http)?;
            let processed =
                pipeline::run_sweep_tick(&pool, &client, &LogNotifier, &config).await?;
            if !processed {
                log::info!("No subscribers due for refresh");
            }
        }

        Command::Watch => {
            let client = BankClient::new(&config.http)?;
            pipeline::run_watch_loop(&pool, &client, &LogNotifier, &config).await?;
        }
    }

    Ok(())
}

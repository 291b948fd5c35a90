mod config;
mod database;
mod entities;
mod error;
mod http_server;
mod logging;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config, database::Database, http_server::app::HttpServerConfig,
    logging::setup_logging,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "SHOWBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Console log level (default: off)
    #[arg(long, default_value = "off", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "SHOWBOOK_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the booking site
    Serve {
        /// The port to run the server on (overrides the config file)
        #[arg(short, long, env = "SHOWBOOK_HTTP_PORT")]
        port: Option<u16>,

        /// The address to bind to (overrides the config file)
        #[arg(long, env = "SHOWBOOK_HTTP_HOST")]
        host: Option<String>,
    },
    /// Apply pending database migrations and exit
    Migrate,
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Showbook starting");
    log::debug!("Loading configuration");

    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load showbook config")?;

    match args.command {
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                log::info!("Default config available at {}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
        Commands::Migrate => {
            let database_path = config.database_path();
            log::debug!("Migrating database at: {}", database_path.display());
            let database = Database::connect(&database_path, &config.database).await?;
            let applied = database.migrate().await?;
            log::info!("Database schema is up to date ({} migration(s) applied)", applied);
            database.close().await?;
        }
        Commands::Serve { port, host } => {
            let database_path = config.database_path();
            log::debug!("Opening database at: {}", database_path.display());
            let database = Database::open(&database_path, &config.database).await?;

            let port = port.unwrap_or(config.server.port);
            let host = host.unwrap_or_else(|| config.server.host.clone());
            log::info!("Starting HTTP server on {}:{}", host, port);
            http_server::app::start(HttpServerConfig {
                host,
                port,
                database,
            })
            .await?;
        }
    }

    Ok(())
}

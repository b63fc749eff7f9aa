use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use foodgram::config::Config;
use foodgram::services::{database_service, ingredient_service, logger_service};

#[derive(Parser, Debug)]
#[command(author, version, about = "Foodgram recipe sharing backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Import ingredients from a JSON file
    LoadIngredients {
        #[arg(long)]
        path: PathBuf,
    },
}

async fn run(command: Command, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Serve => foodgram::start_server(config).await,
        Command::Migrate => {
            database_service::prepare_database(&config.database_url).await?;
            Ok(())
        }
        Command::LoadIngredients { path } => {
            let db = database_service::prepare_database(&config.database_url).await?;
            let (created, skipped) = ingredient_service::load_ingredients(&db, &path).await?;
            info!("Imported {}: {created} created, {skipped} skipped", path.display());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logger_service::init() {
        eprintln!("Failed to initialize logger: {e}");
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command.unwrap_or(Command::Serve), config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use slips_cli::{server, telemetry, Config};

#[derive(Parser)]
#[command(name = "slips-server")]
#[command(about = "Slips task and tag backend")]
#[command(version)]
struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the RPC API (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.env_file {
        Some(path) => dotenvy::from_path(path).map(|_| ()),
        None => dotenvy::dotenv().map(|_| ()),
    };
    if let (Err(e), Some(path)) = (&loaded, &cli.env_file) {
        eprintln!("Failed to load {}: {}", path.display(), e);
        process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = telemetry::init_tracing(config.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => server::run(config).await,
        Commands::Migrate => server::migrate(&config).await,
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        process::exit(1);
    }
}

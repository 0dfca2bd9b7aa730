use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "gymlog-cli", version, about = "Gymlog CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Gym configuration (location, routines, quota)
    Gym {
        #[command(subcommand)]
        action: commands::gym::GymAction,
    },
    /// Location tracking control
    Track {
        #[command(subcommand)]
        action: commands::track::TrackAction,
    },
    /// Attendance statistics
    Stats,
    /// Application configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Gym { action } => commands::gym::run(action),
        Commands::Track { action } => commands::track::run(action),
        Commands::Stats => commands::stats::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

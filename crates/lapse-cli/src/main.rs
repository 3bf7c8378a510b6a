mod commands;
mod notifier;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lapse", about = "Time-lapse brightness deflicker tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the frames of an image folder or a saved project
    Info(commands::info::InfoArgs),
    /// Calculate target brightness for an image folder
    Calculate(commands::calculate::CalculateArgs),
    /// Render a saved project into an output folder
    Process(commands::process::ProcessArgs),
    /// Load, calculate and render in one go
    Run(commands::run::RunArgs),
    /// Print or save the default settings
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Calculate(args) => commands::calculate::run(args),
        Commands::Process(args) => commands::process::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}

mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, fingerprint, headings, round, ApplyArgs, FingerprintArgs, HeadingsArgs, RoundArgs};
use config::Config;

/// Cowrite CLI - human and agent editing on one markdown document
#[derive(Parser, Debug)]
#[command(name = "cowrite")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log engine activity (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the document's headings and their section ranges
    Headings(HeadingsArgs),

    /// Print the document fingerprint
    Fingerprint(FingerprintArgs),

    /// Apply an operation batch to a document
    Apply(ApplyArgs),

    /// Run one agent round against a recorded response
    Round(RoundArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = Config::load(&cwd)?;
    tracing::debug!(?config, "loaded config");

    match cli.command {
        Command::Headings(args) => headings(args),
        Command::Fingerprint(args) => fingerprint(args),
        Command::Apply(args) => apply(args, &config),
        Command::Round(args) => round(args, &config).await,
    }
}

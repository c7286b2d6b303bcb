mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{convert, init, search, stats, strip_mentions, ConvertArgs, InitArgs, SearchArgs, StatsArgs, StripArgs};
use std::path::PathBuf;

/// Mention Editor CLI - inspect and convert mention documents
#[derive(Parser, Debug)]
#[command(name = "mention-editor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a config file (defaults to mention-editor.config.json in the working directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a document between the tree and flat formats
    Convert(ConvertArgs),

    /// Print character, word and mention counts
    Stats(StatsArgs),

    /// Print the ranges matching a search term
    Search(SearchArgs),

    /// Print the flat text with every mention token removed
    StripMentions(StripArgs),

    /// Write a default config file
    Init(InitArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| run(cli, &cwd.display().to_string()));

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

fn run(cli: Cli, cwd: &str) -> anyhow::Result<()> {
    let load_config = || config::load(cwd, cli.config.as_deref());

    match cli.command {
        Command::Init(args) => init(args, cwd),
        Command::Convert(args) => convert(args, &load_config()?),
        Command::Stats(args) => stats(args, &load_config()?),
        Command::Search(args) => search(args, &load_config()?),
        Command::StripMentions(args) => strip_mentions(args, &load_config()?),
    }
}

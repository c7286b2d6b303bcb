use crate::commands::read_document;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use mention_document::DocumentStats;
use mention_editor::EditorConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatsFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Input file, or `-` for stdin
    pub input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: StatsFormat,
}

pub fn stats(args: StatsArgs, _config: &EditorConfig) -> Result<()> {
    let doc = read_document(&args.input)?;
    let stats = doc.stats();

    match args.format {
        StatsFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        StatsFormat::Text => {
            for (label, value) in stat_lines(&stats) {
                println!("{:<12}{}", label.bright_white(), value);
            }
        }
    }
    Ok(())
}

fn stat_lines(stats: &DocumentStats) -> [(&'static str, usize); 3] {
    [
        ("Characters", stats.characters),
        ("Words", stats.words),
        ("Mentions", stats.mentions),
    ]
}

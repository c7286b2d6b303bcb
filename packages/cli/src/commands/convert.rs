use crate::commands::read_document;
use anyhow::Result;
use clap::{Args, ValueEnum};
use mention_document::{serialize, to_flat, truncate_flat, Document, EditorValue, Format};
use mention_editor::EditorConfig;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// Flat string with inline `@mcp<app|tool>` tokens
    Text,
    /// Structured JSON tree
    Json,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input file, or `-` for stdin
    pub input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub to: Target,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pub pretty: bool,
}

pub fn convert(args: ConvertArgs, config: &EditorConfig) -> Result<()> {
    let doc = read_document(&args.input)?;
    println!("{}", render(&doc, args.to, args.pretty, config)?);
    Ok(())
}

/// Encode `doc` in the requested format. The configured length limit
/// applies to flat output only.
pub fn render(doc: &Document, to: Target, pretty: bool, config: &EditorConfig) -> Result<String> {
    match to {
        Target::Text => {
            let flat = to_flat(doc);
            let output = match config.max_length {
                Some(limit) => truncate_flat(&flat, limit).to_string(),
                None => flat,
            };
            Ok(output)
        }
        Target::Json => {
            let value: EditorValue = serialize(doc, Format::Tree);
            Ok(value.to_json_string(pretty)?)
        }
    }
}

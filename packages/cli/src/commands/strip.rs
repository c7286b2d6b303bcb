use crate::commands::read_document;
use anyhow::Result;
use clap::Args;
use mention_document::{strip_tokens, to_flat};
use mention_editor::EditorConfig;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct StripArgs {
    /// Input file, or `-` for stdin
    pub input: PathBuf,
}

pub fn strip_mentions(args: StripArgs, _config: &EditorConfig) -> Result<()> {
    let doc = read_document(&args.input)?;
    println!("{}", strip_tokens(&to_flat(&doc)));
    Ok(())
}

use crate::commands::read_document;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mention_document::Document;
use mention_editor::{EditorConfig, SearchHighlighter};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Input file, or `-` for stdin
    pub input: PathBuf,

    /// Text to look for
    #[arg(short, long)]
    pub term: String,

    /// Match case exactly (defaults to the config's caseSensitiveSearch)
    #[arg(short, long)]
    pub case_sensitive: bool,
}

/// A highlighted range together with the text it covers
#[derive(Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub from: usize,
    pub to: usize,
    pub text: String,
}

pub fn search(args: SearchArgs, config: &EditorConfig) -> Result<()> {
    let doc = read_document(&args.input)?;
    let case_sensitive = args.case_sensitive || config.case_sensitive_search;
    let hits = find_hits(&doc, &args.term, case_sensitive);

    if hits.is_empty() {
        println!("{} No matches for {:?}", "✗".yellow(), args.term);
        return Ok(());
    }

    for hit in &hits {
        println!("  {} [{}, {}) {:?}", "✓".green(), hit.from, hit.to, hit.text);
    }
    println!();
    println!("{} {}", "Matches:".bright_white(), hits.len());
    Ok(())
}

pub fn find_hits(doc: &Document, term: &str, case_sensitive: bool) -> Vec<SearchHit> {
    let mut highlighter = SearchHighlighter::new();
    highlighter.set_search_term(term, case_sensitive, doc);

    highlighter
        .ranges()
        .iter()
        .map(|range| SearchHit {
            from: range.from,
            to: range.to,
            text: doc.text_between(range.from, range.to),
        })
        .collect()
}

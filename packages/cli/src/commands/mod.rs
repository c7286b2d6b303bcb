pub mod convert;
pub mod init;
pub mod search;
pub mod stats;
pub mod strip;

pub use convert::{convert, ConvertArgs};
pub use init::{init, InitArgs};
pub use search::{search, SearchArgs};
pub use stats::{stats, StatsArgs};
pub use strip::{strip_mentions, StripArgs};

use anyhow::{Context, Result};
use mention_document::{parse, Document, EditorValue};
use std::io::Read;
use std::path::Path;

/// Read a document from a file, or from stdin when the path is `-`
pub fn read_document(input: &Path) -> Result<Document> {
    let raw = read_input(input)?;
    let value = EditorValue::from_input(&raw).with_context(|| format!("Cannot parse {}", input.display()))?;
    Ok(parse(&value))
}

fn read_input(input: &Path) -> Result<String> {
    let mut raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Cannot read {}", input.display()))?
    };

    // editors and shells append one newline to files and heredocs
    if raw.ends_with('\n') {
        raw.pop();
        if raw.ends_with('\r') {
            raw.pop();
        }
    }
    Ok(raw)
}

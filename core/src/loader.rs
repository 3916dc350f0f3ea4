//! Loading runbooks from a directory of Markdown files.
//!
//! A runbook may start with a frontmatter block:
//!
//! ```text
//! ---
//! title: Database Connection Failure
//! last_reviewed: 2024-01-15
//! ---
//! ## Symptoms
//! ...
//! ```
//!
//! The header becomes [`Metadata`]; the rest is the indexed body.

use crate::{Metadata, SourceDocument};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

const DELIMITER: &str = "---";

/// Load every `*.md` file directly inside `dir`, in file-name order.
pub fn load_runbooks<P: AsRef<Path>>(dir: P) -> Result<Vec<SourceDocument>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        bail!("runbook directory {} does not exist", dir.display());
    }

    let mut docs = Vec::new();
    let entries = WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading {}", dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) != Some("md") {
            continue;
        }
        let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let (metadata, body) = parse_frontmatter(&content);
        tracing::debug!(path = %path.display(), keys = metadata.len(), "loaded runbook");
        docs.push(SourceDocument::new(metadata, body));
    }

    if docs.is_empty() {
        bail!("No markdown files found in {}", dir.display());
    }
    tracing::info!(count = docs.len(), dir = %dir.display(), "runbooks loaded");
    Ok(docs)
}

/// Split a runbook into its frontmatter metadata and body.
///
/// Without a complete `---` block the whole content is the body, untouched.
pub fn parse_frontmatter(content: &str) -> (Metadata, String) {
    let mut metadata = Metadata::new();
    if !content.starts_with(DELIMITER) {
        return (metadata, content.to_owned());
    }
    let parts: Vec<&str> = content.splitn(3, DELIMITER).collect();
    if parts.len() < 3 {
        return (metadata, content.to_owned());
    }
    for line in parts[1].trim().lines() {
        if let Some((key, val)) = line.split_once(':') {
            metadata.insert(key.trim().to_owned(), val.trim().to_owned());
        }
    }
    (metadata, parts[2].trim().to_owned())
}

//! Structured source readers for the corpus and synonym files. Both are JSON
//! arrays, optionally annotated with `//` line comments which are stripped
//! before parsing.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct QaRecord {
    question: String,
    #[serde(default)]
    answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SynonymRecord {
    canonical: String,
    #[serde(default)]
    synonyms: Vec<String>,
}

/// Remove `//` line comments outside of string literals, keeping the
/// terminating newline. A leading BOM is dropped.
pub fn strip_line_comments(input: &str) -> String {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == '/' && chars.peek() == Some(&'/') {
            for skipped in chars.by_ref() {
                if skipped == '\n' || skipped == '\r' {
                    out.push(skipped);
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Read `[{"question": .., "answers": [..]}, ..]`. Records with an empty
/// question are dropped.
pub fn read_qa_records(path: &Path) -> Result<Vec<(String, Vec<String>)>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read corpus file {}", path.display()))?;
    let records: Vec<QaRecord> = serde_json::from_str(&strip_line_comments(&raw))
        .with_context(|| format!("malformed corpus file {}", path.display()))?;
    Ok(records
        .into_iter()
        .filter(|r| !r.question.is_empty())
        .map(|r| (r.question, r.answers))
        .collect())
}

/// Read `[{"canonical": .., "synonyms": [..]}, ..]`. Records with an empty
/// canonical term are dropped.
pub fn read_synonym_records(path: &Path) -> Result<Vec<(String, Vec<String>)>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read synonyms file {}", path.display()))?;
    let records: Vec<SynonymRecord> = serde_json::from_str(&strip_line_comments(&raw))
        .with_context(|| format!("malformed synonyms file {}", path.display()))?;
    Ok(records
        .into_iter()
        .filter(|r| !r.canonical.is_empty())
        .map(|r| (r.canonical, r.synonyms))
        .collect())
}

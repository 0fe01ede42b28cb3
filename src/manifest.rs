//! Manifest line parsing and title handling
//!
//! A manifest is a plain-text file with one entry per line in the form
//! `[Subject] Title:URL`. Bracketed subject tags are optional and repeatable;
//! the first `:` on the line splits the title part from the URL. This module
//! is pure string handling, no I/O.

use crate::error::ManifestError;
use regex::Regex;
use std::sync::OnceLock;

/// Subject label used when a title carries no bracket tags.
pub const DEFAULT_SUBJECT: &str = "General";

fn subject_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]").unwrap_or_else(|e| unreachable!("{e}")))
}

fn unsafe_char_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\-_. ]").unwrap_or_else(|e| unreachable!("{e}")))
}

/// One parsed manifest entry
///
/// Derived from a raw line, never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Subject tags in order of first appearance; `["General"]` if the title has none
    pub subjects: Vec<String>,
    /// Title part of the line, trimmed, bracket tags included
    pub title: String,
    /// Source URL part of the line, trimmed
    pub url: String,
    /// 1-based line number in the manifest
    pub line_number: usize,
}

impl ManifestEntry {
    /// The subject used for routing: the first tag in parse order.
    ///
    /// Additional tags are preserved in [`subjects`](Self::subjects) but do
    /// not fan out to multiple topics.
    #[must_use]
    pub fn routing_subject(&self) -> &str {
        self.subjects
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_SUBJECT)
    }

    /// File-system-safe name derived from the title
    #[must_use]
    pub fn safe_name(&self) -> String {
        sanitize_title(&self.title)
    }
}

/// Parse one manifest line.
///
/// The line must contain a `:`; everything before the first `:` is the title
/// part (optionally carrying bracket tags), everything after it is the URL.
/// A line without a separator yields [`ManifestError::MissingSeparator`] —
/// non-fatal to a run, the caller counts it as failed and moves on.
pub fn parse_line(raw: &str, line_number: usize) -> Result<ManifestEntry, ManifestError> {
    let Some((title_part, url_part)) = raw.split_once(':') else {
        return Err(ManifestError::MissingSeparator { line: line_number });
    };

    Ok(ManifestEntry {
        subjects: extract_subjects(title_part),
        title: title_part.trim().to_string(),
        url: url_part.trim().to_string(),
        line_number,
    })
}

/// Extract every `[Subject]` tag from a title part.
///
/// Duplicates collapse to the first occurrence, so the result is independent
/// of tag order beyond which tag comes first. A title without tags yields
/// exactly `["General"]`.
#[must_use]
pub fn extract_subjects(title: &str) -> Vec<String> {
    let mut subjects: Vec<String> = Vec::new();
    for captures in subject_tag_regex().captures_iter(title) {
        let tag = captures[1].to_string();
        if !subjects.contains(&tag) {
            subjects.push(tag);
        }
    }

    if subjects.is_empty() {
        subjects.push(DEFAULT_SUBJECT.to_string());
    }
    subjects
}

/// Sanitize a title for use as a file name and caption component.
///
/// Trims the input and strips every character outside word characters,
/// `-`, `_`, `.`, and space. Idempotent. Does not rename for uniqueness:
/// two titles that sanitize identically reuse the same local file name.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    unsafe_char_regex().replace_all(title.trim(), "").into_owned()
}

/// Split raw manifest text into trimmed, non-blank lines.
///
/// This is the ingestion normalization applied when a manifest document is
/// received; line numbers handed to [`parse_line`] index into this result.
#[must_use]
pub fn manifest_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

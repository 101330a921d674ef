//! Comment harvesting using layered regex heuristics
//!
//! Finds three comment surface forms in a single left-to-right pass:
//! - Line comments (`// ...`)
//! - Block comments (`/* ... */`, may span lines)
//! - JSX comments (`{/* ... */}`)
//!
//! Candidates that look like URLs, quoted slashes or markup attributes are
//! suppressed, delimiters are stripped, and each survivor is tagged with the
//! first line of the file that contains it.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A comment harvested from a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Comment text with delimiters stripped and whitespace trimmed
    pub text: String,
    /// Project-relative path of the owning file
    pub file: String,
    /// 1-based line on which the comment was found
    pub line_number: usize,
}

/// Surface syntax of a comment candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentForm {
    /// `// ...`
    Line,
    /// `/* ... */`
    Block,
    /// `{/* ... */}`
    Jsx,
}

impl CommentForm {
    /// Classify a raw candidate by its delimiters
    pub fn classify(candidate: &str) -> Self {
        if candidate.starts_with("{/*") && candidate.ends_with("*/}") {
            CommentForm::Jsx
        } else if candidate.starts_with("//") {
            CommentForm::Line
        } else {
            CommentForm::Block
        }
    }
}

/// Markup tags whose presence marks a JSX comment as commented-out markup
const MARKUP_TAGS: [&str; 4] = ["<a ", "<div ", "<span ", "<img "];

/// Markers that keep a JSX comment even when it contains markup
const NOTE_MARKERS: [&str; 4] = ["todo", "TODO", "note", "NOTE"];

/// Extracts comment records from raw file text
pub struct CommentExtractor {
    candidate: Regex,
    empty_attribute: Regex,
    strip_rules: Vec<Regex>,
}

impl CommentExtractor {
    /// Create a new comment extractor
    pub fn new() -> Result<Self> {
        let candidate = Regex::new(r"//[^\r\n]*|/\*(?s:.*?)\*/|\{/\*(?s:.*?)\*/\}")
            .context("Failed to compile comment pattern")?;
        let empty_attribute = Regex::new(r#"[A-Za-z0-9_]+=(?:""|'')"#)
            .context("Failed to compile attribute pattern")?;

        // Applied in this order, each anchored at one end of the candidate
        let strip_rules = [
            r"^//\s*",
            r"^/\*+\s*",
            r"\s*\*+/$",
            r"^\{\s*/\*+\s*",
            r"\s*\*+/\s*\}$",
        ]
        .iter()
        .map(|pattern| {
            Regex::new(pattern).with_context(|| format!("Failed to compile strip rule {}", pattern))
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            candidate,
            empty_attribute,
            strip_rules,
        })
    }

    /// Extract all comments from a file's content
    pub fn extract_file(&self, file: &str, content: &str) -> Vec<CommentRecord> {
        self.candidates(content)
            .into_iter()
            .filter(|candidate| self.is_retained(candidate))
            .map(|candidate| CommentRecord {
                text: self.strip_delimiters(candidate),
                file: file.to_string(),
                line_number: line_number_of(content, candidate),
            })
            .collect()
    }

    /// Find every comment candidate in source order
    ///
    /// The `//` of an `http:`/`https:` URL and a quoted slash pair (`"//"`)
    /// are not comment starts. Scanning resumes after the URL or the pair, so
    /// a real comment later on the same line is still found.
    pub fn candidates<'a>(&self, content: &'a str) -> Vec<&'a str> {
        let mut found = Vec::new();
        let mut pos = 0;

        while let Some(m) = self.candidate.find_at(content, pos) {
            if let Some(resume) = embedded_slash_pair_end(content, m.start()) {
                pos = resume;
                continue;
            }
            found.push(m.as_str());
            pos = m.end();
        }

        found
    }

    /// Apply the false-positive filters in their fixed precedence
    fn is_retained(&self, candidate: &str) -> bool {
        // JSX comments are exempt from the URL and attribute checks,
        // but commented-out markup without a note is still dropped
        if CommentForm::classify(candidate) == CommentForm::Jsx {
            return !is_bare_markup(candidate);
        }

        !is_likely_url(candidate) && !self.is_likely_attribute(candidate)
    }

    fn is_likely_attribute(&self, candidate: &str) -> bool {
        candidate.contains("target=")
            || candidate.contains("href=")
            || self.empty_attribute.is_match(candidate)
    }

    /// Strip comment delimiters until nothing more can be removed
    pub fn strip_delimiters(&self, candidate: &str) -> String {
        let mut text = candidate.trim().to_string();

        loop {
            let mut stripped = text.clone();
            for rule in &self.strip_rules {
                stripped = rule.replace(&stripped, "").into_owned();
            }
            let stripped = stripped.trim().to_string();

            if stripped == text {
                return text;
            }
            text = stripped;
        }
    }
}

/// End of a `//` at `start` that is part of a URL or a quoted slash pair
fn embedded_slash_pair_end(content: &str, start: usize) -> Option<usize> {
    let (before, after) = content.split_at(start);
    if !after.starts_with("//") {
        return None;
    }

    if follows_http_scheme(before) {
        let url_len = after
            .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`'))
            .unwrap_or(after.len());
        return Some(start + url_len);
    }

    let quoted = (before.ends_with('"') && after.starts_with("//\""))
        || (before.ends_with('\'') && after.starts_with("//'"));
    quoted.then_some(start + 2)
}

fn follows_http_scheme(before: &str) -> bool {
    let bytes = before.as_bytes();
    [b"http:".as_slice(), b"https:".as_slice()]
        .iter()
        .any(|scheme| {
            bytes.len() >= scheme.len()
                && bytes[bytes.len() - scheme.len()..].eq_ignore_ascii_case(scheme)
        })
}

fn is_likely_url(candidate: &str) -> bool {
    candidate.contains("http://")
        || candidate.contains("https://")
        || candidate.contains("\"//\"")
        || candidate.contains("'//'")
}

fn is_bare_markup(candidate: &str) -> bool {
    MARKUP_TAGS.iter().any(|tag| candidate.contains(tag))
        && !NOTE_MARKERS.iter().any(|marker| candidate.contains(marker))
}

/// Find the first 1-based line containing the trimmed candidate
///
/// Falls back to line 1 when no single line contains it, which is the case
/// for block comments that span several lines.
pub fn line_number_of(content: &str, candidate: &str) -> usize {
    let needle = candidate.trim();
    content
        .split('\n')
        .position(|line| line.contains(needle))
        .map(|index| index + 1)
        .unwrap_or(1)
}

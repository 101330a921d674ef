//! File reference parsing and linkification
//!
//! Recognizes three surface syntaxes for a file mention in free text:
//! - `` `src/app.ts` `` (back-tick quoted, no line)
//! - `utils/helpers.go:42`
//! - `module.py (line 7)`

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Link target prefix understood by the `open` command
pub const OPEN_FILE_COMMAND: &str = "command:navbuddy.openFile";

// First alternative wins per occurrence; groups: 1 = back-tick path,
// 2 = bare path, 3 = `:N` line, 4 = `(line N)` line
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"`([^`\s]+\.[A-Za-z0-9]+)`|([^`\s]+\.[A-Za-z0-9]+)(?::(\d+)|\s*\(line\s*(\d+)\))",
    )
    .expect("valid reference regex")
});

static SINGLE_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^`\s]+\.[A-Za-z0-9]+):(\d+)").expect("valid single reference regex")
});

/// Characters left unescaped by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A file mention parsed out of free text, not yet resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    /// Path as written in the text
    pub path: String,
    /// 1-based line number, 1 when the text gave none
    pub line_number: usize,
    /// Exact substring that was matched
    pub source_span: String,
}

impl FileReference {
    /// Create a reference with no recorded source span
    pub fn new(path: &str, line_number: usize) -> Self {
        Self {
            path: path.to_string(),
            line_number: line_number.max(1),
            source_span: format!("{}:{}", path, line_number.max(1)),
        }
    }

    /// Build a reference from one match of [`REFERENCE_RE`]
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let path = clean_path(caps.get(1).or_else(|| caps.get(2))?.as_str());
        if path.is_empty() {
            return None;
        }

        let line_number = caps
            .get(3)
            .or_else(|| caps.get(4))
            .map(|m| parse_line(m.as_str()))
            .unwrap_or(1);

        Some(Self {
            path: path.to_string(),
            line_number,
            source_span: caps.get(0)?.as_str()[leading_punctuation(caps).len()..]
                .to_string(),
        })
    }

    /// Display form used for link text
    pub fn display(&self) -> String {
        format!("{}:{}", self.path, self.line_number)
    }

    /// Structured payload carried by a link marker
    pub fn payload(&self) -> LinkPayload {
        LinkPayload {
            file_path: self.path.clone(),
            line_number: self.line_number,
        }
    }
}

impl std::fmt::Display for FileReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.path, self.line_number)
    }
}

/// Payload embedded in a link marker's target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPayload {
    /// Path as written in the original text
    pub file_path: String,
    /// 1-based line number
    pub line_number: usize,
}

impl LinkPayload {
    /// Encode as a `command:navbuddy.openFile?<payload>` link target
    pub fn to_target(&self) -> String {
        let json = serde_json::json!({
            "filePath": self.file_path,
            "lineNumber": self.line_number,
        });
        format!(
            "{}?{}",
            OPEN_FILE_COMMAND,
            utf8_percent_encode(&json.to_string(), URI_COMPONENT)
        )
    }

    /// Decode a link target produced by [`LinkPayload::to_target`]
    pub fn from_target(target: &str) -> Option<Self> {
        let encoded = target.strip_prefix(OPEN_FILE_COMMAND)?.strip_prefix('?')?;
        let json = percent_decode_str(encoded).decode_utf8().ok()?;
        let payload: LinkPayload = serde_json::from_str(&json).ok()?;
        Some(Self {
            line_number: payload.line_number.max(1),
            ..payload
        })
    }

    /// Convert back into a reference for resolution
    pub fn into_reference(self) -> FileReference {
        FileReference::new(&self.file_path, self.line_number)
    }
}

/// Extract every file reference from text, left to right
pub fn extract_references(text: &str) -> Vec<FileReference> {
    REFERENCE_RE
        .captures_iter(text)
        .filter_map(|caps| FileReference::from_captures(&caps))
        .collect()
}

/// Replace every file reference in text with a markdown link marker
///
/// The link text is `path:line`; the target carries a [`LinkPayload`].
/// Replacement is a single pass, so a marker is never re-linked. Brackets
/// or quotes in front of a bare path stay outside the marker.
pub fn linkify(text: &str) -> String {
    REFERENCE_RE
        .replace_all(text, |caps: &Captures<'_>| {
            match FileReference::from_captures(caps) {
                Some(reference) => format!(
                    "{}[{}]({})",
                    leading_punctuation(caps),
                    reference.display(),
                    reference.payload().to_target()
                ),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Parse the first `path:line` pair anywhere in a model reply
///
/// Tolerates explanatory text and quoting around the pair.
pub fn parse_single_reference(text: &str) -> Option<FileReference> {
    let caps = SINGLE_REFERENCE_RE.captures(text)?;
    let raw = caps.get(1)?.as_str();
    let path = clean_path(raw);
    if path.is_empty() {
        return None;
    }

    Some(FileReference {
        path: path.to_string(),
        line_number: parse_line(caps.get(2)?.as_str()),
        source_span: caps.get(0)?.as_str()[raw.len() - path.len()..].to_string(),
    })
}

const OPENERS: [char; 6] = ['(', '[', '{', '<', '"', '\''];

/// Drop quoting and bracket characters that precede a bare path
fn clean_path(path: &str) -> &str {
    path.trim_start_matches(OPENERS)
}

/// Openers matched in front of a bare path (group 2), empty otherwise
fn leading_punctuation<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(2)
        .map(|m| {
            let raw = m.as_str();
            &raw[..raw.len() - clean_path(raw).len()]
        })
        .unwrap_or("")
}

/// Parse a line number, coercing 0 and unrepresentable values to 1
fn parse_line(digits: &str) -> usize {
    digits.parse::<usize>().ok().filter(|n| *n > 0).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtick_path_defaults_to_line_one() {
        let refs = extract_references("look at `a/b/c.ts` first");

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].path, "a/b/c.ts");
        assert_eq!(refs[0].line_number, 1);
        assert_eq!(refs[0].source_span, "`a/b/c.ts`");
    }

    #[test]
    fn test_colon_line_reference() {
        let refs = extract_references("see utils/helpers.go:42 for details");

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].path, "utils/helpers.go");
        assert_eq!(refs[0].line_number, 42);
        assert_eq!(refs[0].source_span, "utils/helpers.go:42");
    }

    #[test]
    fn test_paren_line_reference() {
        let refs = extract_references("check module.py (line 7)");

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].path, "module.py");
        assert_eq!(refs[0].line_number, 7);
    }

    #[test]
    fn test_bare_path_without_line_is_ignored() {
        assert!(extract_references("edit config.toml then rebuild").is_empty());
    }

    #[test]
    fn test_multiple_references_in_order() {
        let refs = extract_references("`src/app.ts` calls lib/db.rs:10 and lib/net.rs (line 3)");
        let pairs: Vec<(&str, usize)> = refs
            .iter()
            .map(|r| (r.path.as_str(), r.line_number))
            .collect();

        assert_eq!(
            pairs,
            vec![("src/app.ts", 1), ("lib/db.rs", 10), ("lib/net.rs", 3)]
        );
    }

    #[test]
    fn test_zero_line_is_coerced_to_one() {
        let refs = extract_references("main.c:0");
        assert_eq!(refs[0].line_number, 1);
    }

    #[test]
    fn test_linkify_builds_marker() {
        let linked = linkify("see utils/helpers.go:42 for details");

        assert!(linked.starts_with("see [utils/helpers.go:42](command:navbuddy.openFile?"));
        assert!(linked.ends_with(") for details"));

        let target = linked
            .split("](")
            .nth(1)
            .and_then(|rest| rest.split(')').next())
            .unwrap();
        let payload = LinkPayload::from_target(target).unwrap();
        assert_eq!(payload.file_path, "utils/helpers.go");
        assert_eq!(payload.line_number, 42);
    }

    #[test]
    fn test_linkify_repeated_span_is_linked_once_each() {
        let linked = linkify("a.ts:1 and a.ts:1");
        assert_eq!(linked.matches("[a.ts:1](").count(), 2);
        assert!(!linked.contains("[[a.ts:1]"));
    }

    #[test]
    fn test_linkify_keeps_brackets_and_quotes_before_path() {
        let linked = linkify("(src/a.ts:3) and \"b.ts:4\"");

        assert!(linked.starts_with("([src/a.ts:3](command:navbuddy.openFile?"));
        assert!(linked.contains(")) and \"[b.ts:4](command:navbuddy.openFile?"));
        assert!(linked.ends_with(")\""));
    }

    #[test]
    fn test_source_span_excludes_leading_bracket() {
        let refs = extract_references("(src/a.ts:3)");
        assert_eq!(refs[0].path, "src/a.ts");
        assert_eq!(refs[0].source_span, "src/a.ts:3");

        let single = parse_single_reference("'lib/x.rs:9'").unwrap();
        assert_eq!(single.source_span, "lib/x.rs:9");
    }

    #[test]
    fn test_linkify_leaves_plain_text_alone() {
        let text = "nothing to see here";
        assert_eq!(linkify(text), text);
    }

    #[test]
    fn test_payload_target_is_uri_component_encoded() {
        let payload = LinkPayload {
            file_path: "src/my file.ts".to_string(),
            line_number: 5,
        };
        let target = payload.to_target();

        assert!(target.starts_with("command:navbuddy.openFile?%7B%22filePath%22"));
        assert!(!target.contains(' '));
        assert_eq!(LinkPayload::from_target(&target), Some(payload));
    }

    #[test]
    fn test_parse_single_reference_with_surrounding_text() {
        let reference =
            parse_single_reference("The best match is 'src/App.js:25' because it handles auth.")
                .unwrap();

        assert_eq!(reference.path, "src/App.js");
        assert_eq!(reference.line_number, 25);
    }

    #[test]
    fn test_parse_single_reference_none() {
        assert!(parse_single_reference("I could not find anything relevant.").is_none());
        assert!(parse_single_reference("`src/app.ts`").is_none());
    }
}

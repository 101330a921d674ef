//! Prompt templates for LLM interactions

use crate::extract::CommentRecord;

/// System instruction constraining the reply to one `path:line` line
pub const LOCATE_SYSTEM_PROMPT: &str = "You are NavBuddy, a code navigation assistant. \
Analyze code comments to find the SINGLE most relevant file for the query. \
Reply with ONLY ONE line in this exact format: 'filepath:linenumber' (e.g., 'src/App.js:25'). \
No explanation, no markdown, no additional text. Just one line with the file path and line number.";

/// Prompt for locating the code that best matches a query
pub struct LocatePrompt;

impl LocatePrompt {
    /// The system instruction
    pub fn system() -> &'static str {
        LOCATE_SYSTEM_PROMPT
    }

    /// Build the user content from the query and the head of the comment pool
    pub fn user(
        query: &str,
        comments: &[CommentRecord],
        max_comments: usize,
        preview_chars: usize,
    ) -> String {
        let mut prompt = format!("Find code for: \"{}\". Code comments:\n", query);

        let lines: Vec<String> = comments
            .iter()
            .take(max_comments)
            .map(|c| {
                format!(
                    "{}:{}: {}",
                    c.file,
                    c.line_number,
                    preview(&c.text, preview_chars)
                )
            })
            .collect();
        prompt.push_str(&lines.join("\n"));

        prompt
    }
}

/// Cut text to `limit` characters, marking the cut with `...`
fn preview(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let cut: String = text.chars().take(limit).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

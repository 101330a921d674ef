//! Terminal-side collaborators: candidate prompts and result display

use super::OutputFormat;
use crate::query::NavigationSink;
use crate::repo::{Candidate, Disambiguator, ResolvedLocation};
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::process::Command;

/// Asks the user to pick a candidate by number
pub struct PromptDisambiguator<R, W> {
    input: R,
    output: W,
}

impl PromptDisambiguator<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr, read the answer from stdin
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> PromptDisambiguator<R, W> {
    /// Create a prompt over arbitrary streams
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Disambiguator for PromptDisambiguator<R, W> {
    fn choose(&mut self, file_name: &str, candidates: &[Candidate]) -> Result<Option<usize>> {
        writeln!(self.output, "Several files are named {}:", file_name)?;
        for (i, candidate) in candidates.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, candidate.relative_path)?;
        }
        write!(self.output, "Open which one? [1-{}] ", candidates.len())?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;

        Ok(line
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=candidates.len()).contains(n))
            .map(|n| n - 1))
    }
}

/// Alias for the prompt used by the binary
pub type StdinDisambiguator = PromptDisambiguator<io::StdinLock<'static>, io::Stderr>;

/// Read a list of 1-based numbers, returning 0-based indices below `count`
///
/// Numbers may be separated by commas or whitespace; out-of-range entries
/// are an error so a typo never saves a partial selection.
pub fn read_numbers<R: BufRead>(input: &mut R, count: usize) -> Result<Vec<usize>> {
    let mut line = String::new();
    input.read_line(&mut line)?;

    let mut picked = Vec::new();
    for token in line.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        let n: usize = token
            .parse()
            .with_context(|| format!("Not a number: {}", token))?;
        if n == 0 || n > count {
            anyhow::bail!("No folder numbered {}", n);
        }
        if !picked.contains(&(n - 1)) {
            picked.push(n - 1);
        }
    }

    Ok(picked)
}

/// Prints the target and optionally opens it in an editor
pub struct TerminalSink {
    format: OutputFormat,
    open_editor: bool,
}

impl TerminalSink {
    /// Create a sink for the given output format
    pub fn new(format: OutputFormat, open_editor: bool) -> Self {
        Self {
            format,
            open_editor,
        }
    }
}

impl NavigationSink for TerminalSink {
    fn reveal(&mut self, location: &ResolvedLocation) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(location)?);
            }
            OutputFormat::Text => {
                println!("{}", location);
                let content = std::fs::read_to_string(&location.path)
                    .with_context(|| format!("Failed to read {:?}", location.path))?;
                if let Some(text) = content.lines().nth(location.line_number - 1) {
                    println!("{:>5} | {}", location.line_number, text.trim_end());
                }
            }
        }

        if self.open_editor {
            launch_editor(location)?;
        }

        Ok(())
    }
}

/// Open `$VISUAL` or `$EDITOR` at the location (`editor +LINE FILE`)
fn launch_editor(location: &ResolvedLocation) -> Result<()> {
    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .context("Neither $VISUAL nor $EDITOR is set")?;

    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("$EDITOR is empty"))?;

    tracing::debug!("Launching {} for {}", editor, location);
    let status = Command::new(program)
        .args(parts)
        .arg(format!("+{}", location.line_number))
        .arg(&location.path)
        .status()
        .with_context(|| format!("Failed to launch editor {}", program))?;

    if !status.success() {
        anyhow::bail!("Editor exited with {}", status);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn candidates() -> Vec<Candidate> {
        ["a/x.ts", "b/x.ts"]
            .iter()
            .map(|p| Candidate {
                path: PathBuf::from(p),
                relative_path: p.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_prompt_picks_numbered_candidate() {
        let mut output = Vec::new();
        let mut prompt = PromptDisambiguator::new(Cursor::new("2\n"), &mut output);

        let choice = prompt.choose("x.ts", &candidates()).unwrap();
        assert_eq!(choice, Some(1));

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("  1. a/x.ts"));
        assert!(shown.contains("  2. b/x.ts"));
    }

    #[test]
    fn test_prompt_cancels_on_bad_input() {
        for answer in ["\n", "9\n", "zero\n"] {
            let mut prompt = PromptDisambiguator::new(Cursor::new(answer), Vec::new());
            assert_eq!(prompt.choose("x.ts", &candidates()).unwrap(), None);
        }
    }

    #[test]
    fn test_read_numbers() {
        let picked = read_numbers(&mut Cursor::new("3, 1 3\n"), 4).unwrap();
        assert_eq!(picked, vec![2, 0]);

        assert!(read_numbers(&mut Cursor::new("5\n"), 4).is_err());
        assert!(read_numbers(&mut Cursor::new("x\n"), 4).is_err());
        assert!(read_numbers(&mut Cursor::new("\n"), 4).unwrap().is_empty());
    }
}

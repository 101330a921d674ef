//! CLI interface using clap
//!
//! Provides the command-line interface for NavBuddy

mod commands;
mod interact;

pub use commands::*;
pub use interact::{read_numbers, PromptDisambiguator, StdinDisambiguator, TerminalSink};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// NavBuddy - natural-language code navigation
#[derive(Parser, Debug)]
#[command(name = "navbuddy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the project (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    pub path: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Settings database (defaults to the user data directory)
    #[arg(long, global = true, env = "NAVBUDDY_STATE")]
    pub state: Option<PathBuf>,

    /// API key for the model endpoint
    #[arg(long, global = true, env = "NAVBUDDY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask where something lives in the code
    Find(FindArgs),

    /// Jump to a file reference such as `src/app.ts:12`
    Open(OpenArgs),

    /// Turn file references in text into clickable links
    Link(LinkArgs),

    /// Show or change the directories scanned for comments
    Folders(FoldersArgs),

    /// List the comments a query would see
    Comments(CommentsArgs),

    /// Store the model API key
    SetKey(SetKeyArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for find command
#[derive(Parser, Debug)]
pub struct FindArgs {
    /// What to look for, in plain words
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Open the result in $EDITOR
    #[arg(short, long)]
    pub editor: bool,
}

impl FindArgs {
    /// The query words joined into one string
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}

/// Arguments for open command
#[derive(Parser, Debug)]
pub struct OpenArgs {
    /// Reference: `path:line`, `path (line N)`, `` `path` `` or a link target
    pub reference: String,

    /// Take the first match instead of asking when several files share the name
    #[arg(short, long)]
    pub first: bool,

    /// Open the result in $EDITOR
    #[arg(short, long)]
    pub editor: bool,
}

/// Arguments for link command
#[derive(Parser, Debug)]
pub struct LinkArgs {
    /// File to read (defaults to stdin)
    pub file: Option<PathBuf>,
}

/// Arguments for folders command
#[derive(Parser, Debug)]
pub struct FoldersArgs {
    /// Choose folders by number from the listing
    #[arg(long, conflicts_with_all = ["set", "clear"])]
    pub pick: bool,

    /// Select these folders (`/` for the project root)
    #[arg(long, num_args = 1.., conflicts_with = "clear")]
    pub set: Option<Vec<String>>,

    /// Scan the whole project again
    #[arg(long)]
    pub clear: bool,
}

/// Arguments for comments command
#[derive(Parser, Debug)]
pub struct CommentsArgs {
    /// Show at most this many comments
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for set-key command
#[derive(Parser, Debug)]
pub struct SetKeyArgs {
    /// The key (read from stdin when omitted)
    pub key: Option<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Reset to defaults
    #[arg(long)]
    pub reset: bool,
}

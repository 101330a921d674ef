//! NavBuddy - natural-language code navigation
//!
//! This library provides the core of NavBuddy: harvesting code comments,
//! asking a language model which one matches a query, parsing file
//! references out of free text, and resolving them to concrete lines.

pub mod cli;
pub mod error;
pub mod extract;
pub mod llm;
pub mod query;
pub mod repo;
pub mod storage;

/// Re-export commonly used types
pub use error::{NavError, NavResult};
pub use extract::{CommentExtractor, CommentRecord, FileReference};
pub use query::{QueryOrchestrator, QueryOutcome, Session};
pub use repo::{PathResolver, ResolveMode, Workspace};
pub use storage::{Database, SettingsStore};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "navbuddy";

//! Natural-language code lookup
//!
//! A query runs in four steps:
//! 1. Harvest comments from the selected directories ([`CommentScanner`])
//! 2. Ask the model for one `path:line` answer ([`LocatePrompt`](crate::llm::LocatePrompt))
//! 3. Parse the reply and resolve it best-effort
//! 4. Hand the location to a [`NavigationSink`]

mod orchestrator;
mod scanner;

pub use orchestrator::{open_reference, QueryOrchestrator, QueryOutcome};
pub use scanner::{CommentScanner, ScanReport};

use crate::repo::{ResolvedLocation, Workspace};
use crate::storage::SettingsStore;
use anyhow::Result;
use std::path::PathBuf;

/// Per-operation view of the persisted state a query depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Canonical project root
    pub root: PathBuf,
    /// Selected directories (`""` is the root, empty means everything)
    pub selected_directories: Vec<String>,
}

impl Session {
    /// Create a session with an explicit directory selection
    pub fn new(root: PathBuf, selected_directories: Vec<String>) -> Self {
        Self {
            root,
            selected_directories,
        }
    }

    /// Read the saved selection for a workspace once
    pub fn load(workspace: &Workspace, store: &dyn SettingsStore) -> Result<Self> {
        let selected = store.selected_directories(workspace.root())?;
        Ok(Self::new(workspace.root().to_path_buf(), selected))
    }
}

/// Receives the final navigation target
pub trait NavigationSink {
    /// Show the location to the user
    fn reveal(&mut self, location: &ResolvedLocation) -> Result<()>;
}

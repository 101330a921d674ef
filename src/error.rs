//! Error taxonomy for user-visible failures
//!
//! Every variant names the step that failed so the CLI can print a short,
//! specific message. Internal plumbing uses `anyhow` and is wrapped by
//! [`NavError::Other`] at the boundary.

use std::path::PathBuf;

/// Failures surfaced to the user by a navigation operation
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// No credential configured for a remote model endpoint
    #[error("API key is not set (run `navbuddy set-key` or export NAVBUDDY_API_KEY)")]
    MissingApiKey,

    /// The project root does not exist or is not a directory
    #[error("no workspace folder is open at {}", path.display())]
    NoWorkspace {
        /// Path that was expected to be the project root
        path: PathBuf,
    },

    /// The language-model round-trip failed
    #[error("error contacting language model: {reason}")]
    Model {
        /// Underlying failure, flattened to text
        reason: String,
    },

    /// The model replied, but no `path:line` pair could be found in the reply
    #[error("could not find a valid file path in the model response: {reply:?}")]
    UnparseableReply {
        /// The raw reply text
        reply: String,
    },

    /// No file in the project matched the requested path
    #[error("file not found: {path}")]
    FileNotFound {
        /// The path as it was requested
        path: String,
    },

    /// Interactive disambiguation ended without a choice
    #[error("no file selected among candidates named {file_name:?}")]
    SelectionCancelled {
        /// File name shared by all candidates
        file_name: String,
    },

    /// A session was read for a different project than the one being queried
    #[error("session for {} used with workspace {}", session.display(), workspace.display())]
    SessionMismatch {
        /// Root recorded in the session
        session: PathBuf,
        /// Root of the workspace being scanned
        workspace: PathBuf,
    },

    /// Filesystem error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Any other failure from internal plumbing
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NavError {
    /// Wrap a model-call failure, keeping its full context chain as the reason
    pub fn model(err: anyhow::Error) -> Self {
        NavError::Model {
            reason: format!("{:#}", err),
        }
    }
}

/// Result alias for operations that surface [`NavError`]
pub type NavResult<T> = std::result::Result<T, NavError>;

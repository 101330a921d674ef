//! Glue between harvesting, the model, and path resolution

use super::{CommentScanner, NavigationSink, ScanReport, Session};
use crate::error::{NavError, NavResult};
use crate::extract::{parse_single_reference, FileReference};
use crate::llm::{LanguageModel, LocatePrompt, SamplingConfig};
use crate::repo::{
    Disambiguator, PathResolver, Resolution, ResolveMode, ResolvedLocation, Workspace,
};
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// How a query ended
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// The model's answer resolved to a file and line
    Located {
        /// Reference parsed from the reply
        reference: FileReference,
        /// Where it resolved
        location: ResolvedLocation,
    },
    /// The selected directories contain no source files
    NoFiles,
    /// Source files were found but none had comments
    NoComments,
    /// The scan was stopped before any comment was harvested
    Cancelled,
}

/// Runs natural-language queries against one workspace
pub struct QueryOrchestrator<'a, M: LanguageModel> {
    workspace: &'a Workspace,
    model: M,
    sampling: SamplingConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, M: LanguageModel> QueryOrchestrator<'a, M> {
    /// Create an orchestrator using the workspace's sampling settings
    pub fn new(workspace: &'a Workspace, model: M) -> Self {
        Self {
            sampling: SamplingConfig::from(&workspace.config().llm),
            workspace,
            model,
            cancel: None,
        }
    }

    /// Let scans stop early once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The model in use
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Harvest comments from the session's selected directories
    pub async fn harvest(&self, session: &Session) -> NavResult<ScanReport> {
        if session.root != self.workspace.root() {
            return Err(NavError::SessionMismatch {
                session: session.root.clone(),
                workspace: self.workspace.root().to_path_buf(),
            });
        }

        let files = self.workspace.source_files(&session.selected_directories)?;
        tracing::info!("Scanning {} file(s) for comments", files.len());

        let mut scanner = CommentScanner::new(self.workspace)?;
        if let Some(flag) = &self.cancel {
            scanner = scanner.with_cancel_flag(Arc::clone(flag));
        }

        Ok(scanner.scan(&files).await)
    }

    /// Answer a query with a location, without revealing it
    pub async fn locate(&self, session: &Session, query: &str) -> NavResult<QueryOutcome> {
        let report = self.harvest(session).await?;

        // A partial harvest still goes to the model
        if report.cancelled && report.comments.is_empty() {
            return Ok(QueryOutcome::Cancelled);
        }
        if report.files_scanned == 0 && report.files_failed == 0 {
            tracing::info!("No source files found in the selected directories");
            return Ok(QueryOutcome::NoFiles);
        }
        if report.comments.is_empty() {
            tracing::info!("No comments found in {} file(s)", report.files_scanned);
            return Ok(QueryOutcome::NoComments);
        }

        let config = self.workspace.config();
        let user = LocatePrompt::user(
            query,
            &report.comments,
            config.max_prompt_comments,
            config.comment_preview_chars,
        );

        tracing::info!(
            "Asking the model about {} comment(s)",
            report.comments.len().min(config.max_prompt_comments)
        );
        let reply = self
            .model
            .complete(LocatePrompt::system(), &user, &self.sampling)
            .await
            .map_err(NavError::model)?;
        tracing::debug!("Model reply: {:?}", reply);

        let reference =
            parse_single_reference(&reply).ok_or(NavError::UnparseableReply { reply })?;

        let location = match PathResolver::new(self.workspace)
            .resolve(&reference, ResolveMode::BestEffort)?
        {
            Resolution::Resolved(location) => location,
            Resolution::Ambiguous(ambiguity) => ambiguity.choose(0)?,
        };

        Ok(QueryOutcome::Located {
            reference,
            location,
        })
    }

    /// Answer a query and reveal the location through `sink`
    pub async fn find(
        &self,
        session: &Session,
        query: &str,
        sink: &mut dyn NavigationSink,
    ) -> NavResult<QueryOutcome> {
        let outcome = self.locate(session, query).await?;
        if let QueryOutcome::Located { location, .. } = &outcome {
            sink.reveal(location)?;
        }
        Ok(outcome)
    }
}

/// Resolve a reference under `mode` and reveal it through `sink`
///
/// Interactive ambiguity is settled by `chooser`.
pub fn open_reference(
    workspace: &Workspace,
    reference: &FileReference,
    mode: ResolveMode,
    chooser: &mut dyn Disambiguator,
    sink: &mut dyn NavigationSink,
) -> NavResult<ResolvedLocation> {
    let location = PathResolver::new(workspace).resolve_with(reference, mode, chooser)?;
    sink.reveal(&location)?;
    Ok(location)
}

//! Resolution of partial file paths to concrete project files
//!
//! Lookup runs in two steps:
//! 1. Exact project-relative match
//! 2. Filename-only search over the whole tree (bounded)
//!
//! When the second step finds several files, the [`ResolveMode`] decides
//! whether the caller must choose or the first match is taken.

use super::{line_count, Workspace};
use crate::error::{NavError, NavResult};
use crate::extract::FileReference;
use anyhow::Result;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// Policy for multiple filename matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// The caller must pick among candidates
    Interactive,
    /// Take the first discovered candidate without asking
    BestEffort,
}

/// A concrete file that may satisfy a reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Project-relative path with forward slashes
    pub relative_path: String,
}

/// A guaranteed-valid navigation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLocation {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Project-relative path with forward slashes
    pub relative_path: String,
    /// 1-based line, clamped to the file
    pub line_number: usize,
    /// Number of lines in the file
    pub line_count: usize,
}

impl ResolvedLocation {
    /// Read the file and clamp the requested line against its length
    pub fn locate(candidate: Candidate, requested_line: usize) -> Result<Self> {
        let bytes = std::fs::read(&candidate.path)?;
        let line_count = line_count(&String::from_utf8_lossy(&bytes));
        let requested = i64::try_from(requested_line).unwrap_or(i64::MAX);

        Ok(Self {
            path: candidate.path,
            relative_path: candidate.relative_path,
            line_number: clamp_line(requested, line_count),
            line_count,
        })
    }
}

impl std::fmt::Display for ResolvedLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.relative_path, self.line_number)
    }
}

/// Several files share the requested name
#[derive(Debug, Clone)]
pub struct Ambiguity {
    /// The shared file name
    pub file_name: String,
    /// Matching files in discovery order
    pub candidates: Vec<Candidate>,
    /// Line requested by the reference
    pub requested_line: usize,
}

impl Ambiguity {
    /// Resolve by picking the candidate at `index`
    pub fn choose(self, index: usize) -> NavResult<ResolvedLocation> {
        let file_name = self.file_name;
        let candidate = self
            .candidates
            .into_iter()
            .nth(index)
            .ok_or(NavError::SelectionCancelled { file_name })?;
        Ok(ResolvedLocation::locate(candidate, self.requested_line)?)
    }
}

/// Outcome of resolving one reference
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Exactly one target
    Resolved(ResolvedLocation),
    /// Interactive mode found several files with the same name
    Ambiguous(Ambiguity),
}

/// Chooses among ambiguous candidates on behalf of the user
pub trait Disambiguator {
    /// Return the index of the chosen candidate, or `None` to cancel
    fn choose(&mut self, file_name: &str, candidates: &[Candidate]) -> Result<Option<usize>>;
}

/// Clamp a requested line into `[1, line_count]`
pub fn clamp_line(requested: i64, line_count: usize) -> usize {
    let max = i64::try_from(line_count.max(1)).unwrap_or(i64::MAX);
    let clamped = requested.clamp(1, max);
    usize::try_from(clamped).unwrap_or(1)
}

/// Maps reference paths onto files of a workspace
pub struct PathResolver<'a> {
    workspace: &'a Workspace,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver over a workspace
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Find files matching a requested path
    ///
    /// An exact relative match wins outright; otherwise every file with the
    /// same name is returned, up to the configured candidate cap.
    pub fn find_candidates(&self, requested: &str) -> Vec<Candidate> {
        if let Some(exact) = self.exact_match(requested) {
            return vec![exact];
        }

        let file_name = file_name_of(requested);
        if file_name.is_empty() {
            return Vec::new();
        }

        self.workspace
            .walk_files(self.workspace.root(), None)
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n == file_name)
                    .unwrap_or(false)
            })
            .take(self.workspace.config().max_candidates)
            .map(|path| Candidate {
                relative_path: self.workspace.relative_path(&path),
                path,
            })
            .collect()
    }

    fn exact_match(&self, requested: &str) -> Option<Candidate> {
        let normalized = requested.replace('\\', "/");
        let mut relative = Path::new(&normalized);

        if relative.is_absolute() {
            relative = relative.strip_prefix(self.workspace.root()).ok()?;
        }

        let relative: PathBuf = relative
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();

        if relative.as_os_str().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
            || self.workspace.is_excluded_path(&relative)
        {
            return None;
        }

        let path = self.workspace.root().join(&relative);
        if !path.is_file() {
            return None;
        }

        Some(Candidate {
            relative_path: self.workspace.relative_path(&path),
            path,
        })
    }

    /// Resolve a reference under the given policy
    pub fn resolve(&self, reference: &FileReference, mode: ResolveMode) -> NavResult<Resolution> {
        let mut candidates = self.find_candidates(&reference.path);
        tracing::debug!(
            "Resolving {} -> {} candidate(s)",
            reference.path,
            candidates.len()
        );

        if candidates.is_empty() {
            return Err(NavError::FileNotFound {
                path: reference.path.clone(),
            });
        }

        if candidates.len() > 1 && mode == ResolveMode::Interactive {
            return Ok(Resolution::Ambiguous(Ambiguity {
                file_name: file_name_of(&reference.path).to_string(),
                candidates,
                requested_line: reference.line_number,
            }));
        }

        let first = candidates.swap_remove(0);
        Ok(Resolution::Resolved(ResolvedLocation::locate(
            first,
            reference.line_number,
        )?))
    }

    /// Resolve a reference, asking `chooser` when interactive resolution is ambiguous
    pub fn resolve_with(
        &self,
        reference: &FileReference,
        mode: ResolveMode,
        chooser: &mut dyn Disambiguator,
    ) -> NavResult<ResolvedLocation> {
        match self.resolve(reference, mode)? {
            Resolution::Resolved(location) => Ok(location),
            Resolution::Ambiguous(ambiguity) => {
                match chooser.choose(&ambiguity.file_name, &ambiguity.candidates)? {
                    Some(index) => ambiguity.choose(index),
                    None => Err(NavError::SelectionCancelled {
                        file_name: ambiguity.file_name,
                    }),
                }
            }
        }
    }
}

/// Final path segment, splitting on either separator
fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or("")
}

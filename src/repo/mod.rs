//! Workspace access and file resolution module
//!
//! This module handles the project tree on disk:
//! - Opening a project root and loading its configuration
//! - Enumerating source files under the selected directories
//! - Listing candidate directories for selection
//! - Resolving partial file paths to concrete files

mod config;
mod resolver;

pub use config::{LlmSettings, WorkspaceConfig, CONFIG_DIR};
pub use resolver::{
    clamp_line, Ambiguity, Candidate, Disambiguator, PathResolver, Resolution, ResolveMode,
    ResolvedLocation,
};

use crate::error::{NavError, NavResult};
use anyhow::Result;
use std::collections::{BTreeSet, HashSet};
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Label shown for the project root in directory listings
pub const ROOT_LABEL: &str = "/ (root)";

/// Upper bound on files inspected when listing directories
pub const DIRECTORY_LISTING_LIMIT: usize = 1000;

/// Snapshot of one source file taken at scan time
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Project-relative path with forward slashes
    pub path: String,
    /// Raw text content
    pub content: String,
}

impl SourceFile {
    /// Create a snapshot from already-read content
    pub fn new(path: &str, content: String) -> Self {
        Self {
            path: path.to_string(),
            content,
        }
    }
}

/// Number of lines in a text, never less than 1
pub fn line_count(content: &str) -> usize {
    content.lines().count().max(1)
}

/// A project tree being navigated
pub struct Workspace {
    /// Canonical path to the project root
    root: PathBuf,
    /// Project configuration
    config: WorkspaceConfig,
}

impl Workspace {
    /// Open a project root and load its configuration
    pub fn open<P: AsRef<Path>>(path: P) -> NavResult<Self> {
        let root = Self::canonical_root(path.as_ref())?;
        let config = WorkspaceConfig::load_or_default(&root)?;
        Ok(Self { root, config })
    }

    /// Open a project root with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(path: P, config: WorkspaceConfig) -> NavResult<Self> {
        let root = Self::canonical_root(path.as_ref())?;
        Ok(Self { root, config })
    }

    fn canonical_root(path: &Path) -> NavResult<PathBuf> {
        if !path.is_dir() {
            return Err(NavError::NoWorkspace {
                path: path.to_path_buf(),
            });
        }
        Ok(path.canonicalize()?)
    }

    /// Get the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the project configuration
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Project-relative path with forward slashes
    pub fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Walk a directory in name-sorted depth-first order, skipping excluded directories
    pub(crate) fn walk_files(&self, dir: &Path, max_depth: Option<usize>) -> Vec<PathBuf> {
        let mut walker = WalkDir::new(dir).sort_by_file_name();
        if let Some(depth) = max_depth {
            walker = walker.max_depth(depth);
        }

        walker
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded_entry(e))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }

    fn is_excluded_entry(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .map(|name| self.config.is_excluded_dir(name))
                .unwrap_or(false)
    }

    /// Whether a project-relative path passes through an excluded directory
    pub(crate) fn is_excluded_path(&self, relative: &Path) -> bool {
        relative.components().any(|c| match c {
            Component::Normal(name) => name
                .to_str()
                .map(|name| self.config.is_excluded_dir(name))
                .unwrap_or(false),
            _ => false,
        })
    }

    /// List source files under the selected directories
    ///
    /// - No selection scans the whole tree
    /// - The root entry (`""`) scans only files directly in the root
    /// - Any other entry scans that directory recursively
    pub fn source_files(&self, selected: &[String]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        if selected.is_empty() {
            files.extend(self.walk_files(&self.root, None));
        } else {
            for folder in selected {
                let folder = folder.trim_matches('/');
                if folder.is_empty() {
                    files.extend(self.walk_files(&self.root, Some(1)));
                    continue;
                }

                let relative = Path::new(folder);
                if relative
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_)))
                {
                    tracing::warn!("Ignoring folder outside the project: {}", folder);
                    continue;
                }

                let dir = self.root.join(relative);
                if !dir.is_dir() {
                    tracing::warn!("Selected folder does not exist: {}", folder);
                    continue;
                }
                files.extend(self.walk_files(&dir, None));
            }
        }

        let mut seen = HashSet::new();
        Ok(files
            .into_iter()
            .filter(|path| self.config.is_source_file(path))
            .filter(|path| seen.insert(path.clone()))
            .collect())
    }

    /// List directories that contain files, sorted, root first as `""`
    pub fn list_directories(&self) -> Vec<String> {
        let mut dirs = BTreeSet::new();
        dirs.insert(String::new());

        for path in self
            .walk_files(&self.root, None)
            .into_iter()
            .take(DIRECTORY_LISTING_LIMIT)
        {
            let relative = self.relative_path(&path);
            if let Some((dir, _)) = relative.rsplit_once('/') {
                dirs.insert(dir.to_string());
            }
        }

        dirs.into_iter().collect()
    }

    /// Read a file into a snapshot
    pub async fn read_source(&self, path: &Path) -> Result<SourceFile> {
        let bytes = tokio::fs::read(path).await?;
        let content = String::from_utf8(bytes)
            .map_err(|_| anyhow::anyhow!("File content is not valid UTF-8: {:?}", path))?;
        Ok(SourceFile::new(&self.relative_path(path), content))
    }
}

/// Display label for a directory entry
pub fn directory_label(dir: &str) -> &str {
    if dir.is_empty() {
        ROOT_LABEL
    } else {
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.ts", "// root\n");
        write(dir.path(), "README.md", "# docs\n");
        write(dir.path(), "src/app.tsx", "// app\n");
        write(dir.path(), "src/lib/db.ts", "// db\n");
        write(dir.path(), "web/page.js", "// page\n");
        write(dir.path(), "node_modules/pkg/index.js", "// vendored\n");
        let ws = Workspace::open(dir.path()).unwrap();
        (dir, ws)
    }

    fn relative(ws: &Workspace, files: &[PathBuf]) -> Vec<String> {
        files.iter().map(|p| ws.relative_path(p)).collect()
    }

    #[test]
    fn test_open_missing_root() {
        let err = Workspace::open("/definitely/not/a/project").err().unwrap();
        assert!(matches!(err, NavError::NoWorkspace { .. }));
    }

    #[test]
    fn test_source_files_whole_tree() {
        let (_dir, ws) = fixture();
        let files = ws.source_files(&[]).unwrap();

        assert_eq!(
            relative(&ws, &files),
            vec!["index.ts", "src/app.tsx", "src/lib/db.ts", "web/page.js"]
        );
    }

    #[test]
    fn test_source_files_selected_folders() {
        let (_dir, ws) = fixture();

        let files = ws.source_files(&["src".to_string()]).unwrap();
        assert_eq!(relative(&ws, &files), vec!["src/app.tsx", "src/lib/db.ts"]);

        let files = ws.source_files(&["".to_string()]).unwrap();
        assert_eq!(relative(&ws, &files), vec!["index.ts"]);
    }

    #[test]
    fn test_overlapping_selection_is_deduplicated() {
        let (_dir, ws) = fixture();
        let files = ws
            .source_files(&["src".to_string(), "src/lib".to_string()])
            .unwrap();

        assert_eq!(relative(&ws, &files), vec!["src/app.tsx", "src/lib/db.ts"]);
    }

    #[test]
    fn test_list_directories() {
        let (_dir, ws) = fixture();
        let dirs = ws.list_directories();

        assert_eq!(dirs, vec!["", "src", "src/lib", "web"]);
        assert_eq!(directory_label(&dirs[0]), ROOT_LABEL);
    }

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(""), 1);
        assert_eq!(line_count("a\nb\nc"), 3);
        assert_eq!(line_count("a\nb\nc\n"), 3);
    }
}

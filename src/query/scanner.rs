//! Batched comment harvesting over a set of source files

use crate::extract::{CommentExtractor, CommentRecord};
use crate::repo::Workspace;
use anyhow::Result;
use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Batches between progress lines at `info` level
const PROGRESS_EVERY: usize = 5;

/// Result of one harvesting pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Harvested comments, in file order then source order
    pub comments: Vec<CommentRecord>,
    /// Files read and extracted successfully
    pub files_scanned: usize,
    /// Files skipped because they could not be read
    pub files_failed: usize,
    /// Whether the scan stopped early on request
    pub cancelled: bool,
}

/// Reads files in fixed-size concurrent batches and extracts their comments
pub struct CommentScanner<'a> {
    workspace: &'a Workspace,
    extractor: CommentExtractor,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> CommentScanner<'a> {
    /// Create a scanner over a workspace
    pub fn new(workspace: &'a Workspace) -> Result<Self> {
        Ok(Self {
            workspace,
            extractor: CommentExtractor::new()?,
            cancel: None,
        })
    }

    /// Stop between batches once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Harvest comments from `files`
    ///
    /// Each batch is joined before the next starts; per-file failures are
    /// logged and skipped.
    pub async fn scan(&self, files: &[PathBuf]) -> ScanReport {
        let batch_size = self.workspace.config().batch_size.max(1);
        let total_batches = files.len().div_ceil(batch_size);
        let mut report = ScanReport::default();

        for (index, batch) in files.chunks(batch_size).enumerate() {
            if self.is_cancelled() {
                tracing::info!("Scan cancelled after {} file(s)", report.files_scanned);
                report.cancelled = true;
                break;
            }

            let results = join_all(batch.iter().map(|path| self.scan_file(path))).await;

            for (path, result) in batch.iter().zip(results) {
                match result {
                    Ok(mut comments) => {
                        report.files_scanned += 1;
                        report.comments.append(&mut comments);
                    }
                    Err(e) => {
                        report.files_failed += 1;
                        tracing::warn!("Skipping {:?}: {:#}", path, e);
                    }
                }
            }

            let done = index + 1;
            if done % PROGRESS_EVERY == 0 || done == total_batches {
                tracing::info!(
                    "Scanned batch {}/{} ({} comments so far)",
                    done,
                    total_batches,
                    report.comments.len()
                );
            } else {
                tracing::debug!("Scanned batch {}/{}", done, total_batches);
            }
        }

        report
    }

    async fn scan_file(&self, path: &Path) -> Result<Vec<CommentRecord>> {
        let source = self.workspace.read_source(path).await?;
        Ok(self.extractor.extract_file(&source.path, &source.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::WorkspaceConfig;
    use std::fs;

    fn workspace_with<N: AsRef<str>, C: AsRef<[u8]>>(
        files: &[(N, C)],
        batch_size: usize,
    ) -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name.as_ref());
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content.as_ref()).unwrap();
        }
        let config = WorkspaceConfig {
            batch_size,
            ..Default::default()
        };
        let ws = Workspace::with_config(dir.path(), config).unwrap();
        (dir, ws)
    }

    #[tokio::test]
    async fn test_scan_keeps_file_order_across_batches() {
        let files: Vec<(String, String)> = (0..7)
            .map(|i| (format!("f{}.ts", i), format!("// note {}\n", i)))
            .collect();
        let (_dir, ws) = workspace_with(&files, 3);

        let paths = ws.source_files(&[]).unwrap();
        let report = CommentScanner::new(&ws).unwrap().scan(&paths).await;

        assert_eq!(report.files_scanned, 7);
        assert_eq!(report.files_failed, 0);
        let texts: Vec<&str> = report.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["note 0", "note 1", "note 2", "note 3", "note 4", "note 5", "note 6"]
        );
    }

    #[tokio::test]
    async fn test_unreadable_file_is_skipped() {
        let (_dir, ws) = workspace_with(
            &[
                ("bad.ts", vec![0xff, 0xfe, 0x00]),
                ("good.ts", b"// fine\n".to_vec()),
            ],
            20,
        );

        let paths = ws.source_files(&[]).unwrap();
        let report = CommentScanner::new(&ws).unwrap().scan(&paths).await;

        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.comments.len(), 1);
        assert_eq!(report.comments[0].file, "good.ts");
    }

    #[tokio::test]
    async fn test_cancel_flag_stops_before_next_batch() {
        let (_dir, ws) = workspace_with(&[("a.ts", "// a\n"), ("b.ts", "// b\n")], 1);
        let flag = Arc::new(AtomicBool::new(true));

        let paths = ws.source_files(&[]).unwrap();
        let report = CommentScanner::new(&ws)
            .unwrap()
            .with_cancel_flag(flag)
            .scan(&paths)
            .await;

        assert!(report.cancelled);
        assert!(report.comments.is_empty());
    }
}

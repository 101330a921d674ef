//! Command implementations

use super::{read_numbers, FoldersArgs, OutputFormat};
use crate::error::{NavError, NavResult};
use crate::extract::{extract_references, linkify, CommentRecord, FileReference, LinkPayload};
use crate::llm::LanguageModel;
use crate::query::{
    self, CommentScanner, NavigationSink, QueryOrchestrator, QueryOutcome, ScanReport, Session,
};
use crate::repo::{
    directory_label, Disambiguator, ResolveMode, ResolvedLocation, Workspace, WorkspaceConfig,
    ROOT_LABEL,
};
use crate::storage::{default_database_path, Database, SettingsStore};
use anyhow::{Context, Result};
use std::io::{BufRead, Read, Write};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Open the settings database, creating it when missing
pub fn open_store(state: Option<&Path>) -> Result<Database> {
    let path = state
        .map(Path::to_path_buf)
        .unwrap_or_else(default_database_path);
    tracing::debug!("Settings database: {:?}", path);
    Database::open(&path)
}

/// Store the model API key, reading it from `input` when not given
pub fn set_key<R: BufRead>(
    store: &dyn SettingsStore,
    key: Option<&str>,
    input: &mut R,
) -> Result<()> {
    let key = match key {
        Some(key) => key.to_string(),
        None => {
            eprint!("Enter API key: ");
            std::io::stderr().flush()?;
            let mut line = String::new();
            input.read_line(&mut line)?;
            line
        }
    };

    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    store.set_api_key(key)?;
    println!("✓ API key saved");

    Ok(())
}

/// Normalize a folder as typed by the user into a project-relative entry
///
/// `/`, `.` and the root label all mean the project root (`""`).
pub fn normalize_folder(raw: &str) -> String {
    let raw = raw.trim();
    if raw == ROOT_LABEL {
        return String::new();
    }

    let mut folder = raw.replace('\\', "/");
    while let Some(rest) = folder.strip_prefix("./") {
        folder = rest.to_string();
    }
    let folder = folder.trim_matches('/');

    if folder == "." {
        String::new()
    } else {
        folder.to_string()
    }
}

/// Show or change the folders scanned for comments
pub fn folders<R: BufRead>(
    workspace: &Workspace,
    store: &dyn SettingsStore,
    args: &FoldersArgs,
    format: OutputFormat,
    input: &mut R,
) -> Result<()> {
    let root = workspace.root();

    if args.clear {
        store.set_selected_directories(root, &[])?;
        println!("✓ Folder selection cleared, the whole project will be scanned");
        return Ok(());
    }

    if let Some(ref raw) = args.set {
        let mut selected: Vec<String> = Vec::new();
        for folder in raw.iter().map(|f| normalize_folder(f)) {
            if !folder.is_empty() && !root.join(&folder).is_dir() {
                tracing::warn!("Folder does not exist: {}", folder);
            }
            if !selected.contains(&folder) {
                selected.push(folder);
            }
        }

        store.set_selected_directories(root, &selected)?;
        println!("✓ Selected {} folder(s)", selected.len());
        for folder in &selected {
            println!("  - {}", directory_label(folder));
        }
        return Ok(());
    }

    let directories = workspace.list_directories();
    let selected = store.selected_directories(root)?;

    if args.pick {
        for (i, dir) in directories.iter().enumerate() {
            println!("{:>4}. {}", i + 1, directory_label(dir));
        }
        eprint!("Folders to scan (numbers, comma separated): ");
        std::io::stderr().flush()?;

        let picked = read_numbers(input, directories.len())?;
        if picked.is_empty() {
            println!("No folders chosen, selection unchanged");
            return Ok(());
        }

        let chosen: Vec<String> = picked.iter().map(|&i| directories[i].clone()).collect();
        store.set_selected_directories(root, &chosen)?;
        println!("✓ Selected {} folder(s)", chosen.len());
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directories": directories,
                "selected": selected,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Folders in {:?}", root);
            println!("===========\n");
            for dir in &directories {
                let mark = if selected.contains(dir) { "x" } else { " " };
                println!("[{}] {}", mark, directory_label(dir));
            }
            if selected.is_empty() {
                println!("\nNo folders selected: the whole project is scanned.");
            }
        }
    }

    Ok(())
}

/// Run a natural-language query and reveal the answer
pub async fn find<M: LanguageModel>(
    workspace: &Workspace,
    session: &Session,
    model: M,
    query: &str,
    sink: &mut dyn NavigationSink,
    format: OutputFormat,
    cancel: Arc<AtomicBool>,
) -> NavResult<QueryOutcome> {
    let orchestrator = QueryOrchestrator::new(workspace, model).with_cancel_flag(cancel);
    let outcome = orchestrator.find(session, query, sink).await?;

    // Located outcomes were already printed by the sink
    match (&outcome, format) {
        (QueryOutcome::Located { .. }, _) => {}
        (_, OutputFormat::Json) => {
            let json = serde_json::to_string_pretty(&outcome).map_err(anyhow::Error::from)?;
            println!("{}", json);
        }
        (QueryOutcome::NoFiles, OutputFormat::Text) => {
            println!("No source files found in the selected folders.")
        }
        (QueryOutcome::NoComments, OutputFormat::Text) => {
            println!("No comments found in the selected folders.")
        }
        (QueryOutcome::Cancelled, OutputFormat::Text) => println!("Scan cancelled."),
    }

    Ok(outcome)
}

/// Parse what the user typed after `open`
///
/// Accepts a link target, any reference form understood by the extractor,
/// or a bare path (line 1).
pub fn parse_open_target(raw: &str) -> Option<FileReference> {
    let raw = raw.trim();

    if let Some(payload) = LinkPayload::from_target(raw) {
        return Some(payload.into_reference());
    }

    if let Some(reference) = extract_references(raw).into_iter().next() {
        return Some(reference);
    }

    if !raw.is_empty() && !raw.contains(char::is_whitespace) {
        return Some(FileReference::new(raw, 1));
    }

    None
}

/// Resolve a typed reference and reveal it
pub fn open(
    workspace: &Workspace,
    raw: &str,
    mode: ResolveMode,
    chooser: &mut dyn Disambiguator,
    sink: &mut dyn NavigationSink,
) -> NavResult<ResolvedLocation> {
    let reference = parse_open_target(raw).ok_or_else(|| NavError::FileNotFound {
        path: raw.to_string(),
    })?;
    tracing::debug!("Opening {}", reference);

    query::open_reference(workspace, &reference, mode, chooser, sink)
}

/// Rewrite every file reference in a file (or stdin) as a link marker
pub fn link(file: Option<&Path>) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };

    print!("{}", linkify(&text));
    std::io::stdout().flush()?;

    Ok(())
}

/// Harvest and print the comment pool a query would see
pub async fn comments(
    workspace: &Workspace,
    session: &Session,
    limit: Option<usize>,
    format: OutputFormat,
    cancel: Arc<AtomicBool>,
) -> NavResult<ScanReport> {
    let files = workspace.source_files(&session.selected_directories)?;
    let mut report = CommentScanner::new(workspace)?
        .with_cancel_flag(cancel)
        .scan(&files)
        .await;
    if let Some(limit) = limit {
        report.comments.truncate(limit);
    }

    match format {
        OutputFormat::Json => print_comments_json(&report.comments)?,
        OutputFormat::Text => print_comments_text(&report),
    }

    Ok(report)
}

/// Print comments as JSON
pub fn print_comments_json(comments: &[CommentRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(comments)?;
    println!("{}", json);
    Ok(())
}

/// Print comments as text
pub fn print_comments_text(report: &ScanReport) {
    for comment in &report.comments {
        let first_line = comment.text.lines().next().unwrap_or("");
        println!("{}:{}: {}", comment.file, comment.line_number, first_line);
    }

    eprintln!(
        "\n{} comment(s) from {} file(s){}",
        report.comments.len(),
        report.files_scanned,
        if report.files_failed > 0 {
            format!(", {} skipped", report.files_failed)
        } else {
            String::new()
        }
    );
}

/// Show or reset the project configuration
pub fn config(workspace: &Workspace, reset: bool, format: OutputFormat) -> Result<()> {
    if reset {
        WorkspaceConfig::default().save(workspace.root())?;
        println!("✓ Configuration reset to defaults");
        return Ok(());
    }

    let mut shown = workspace.config().clone();
    if shown.llm.api_key.is_some() {
        shown.llm.api_key = Some("********".to_string());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
        OutputFormat::Text => {
            println!("NavBuddy Configuration");
            println!("======================\n");
            println!("File: {:?}\n", WorkspaceConfig::path_for(workspace.root()));
            print!(
                "{}",
                toml::to_string_pretty(&shown).context("Failed to serialize configuration")?
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::Candidate;
    use crate::storage::MemorySettings;
    use std::fs;
    use std::io::Cursor;

    struct NeverAsked;

    impl Disambiguator for NeverAsked {
        fn choose(&mut self, _file_name: &str, _candidates: &[Candidate]) -> Result<Option<usize>> {
            panic!("unexpected prompt");
        }
    }

    #[derive(Default)]
    struct Collect(Vec<ResolvedLocation>);

    impl NavigationSink for Collect {
        fn reveal(&mut self, location: &ResolvedLocation) -> Result<()> {
            self.0.push(location.clone());
            Ok(())
        }
    }

    fn project() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/app.ts"), "a\nb\nc\n").unwrap();
        let ws = Workspace::open(dir.path()).unwrap();
        (dir, ws)
    }

    #[test]
    fn test_set_key_rejects_empty_input() {
        let store = MemorySettings::new();

        assert!(set_key(&store, None, &mut Cursor::new("  \n")).is_err());
        assert!(store.api_key().unwrap().is_none());

        set_key(&store, None, &mut Cursor::new("gsk_abc\n")).unwrap();
        assert_eq!(store.api_key().unwrap().as_deref(), Some("gsk_abc"));
    }

    #[test]
    fn test_normalize_folder() {
        assert_eq!(normalize_folder("/"), "");
        assert_eq!(normalize_folder("."), "");
        assert_eq!(normalize_folder(ROOT_LABEL), "");
        assert_eq!(normalize_folder("./src/"), "src");
        assert_eq!(normalize_folder("web\\pages"), "web/pages");
    }

    #[test]
    fn test_folders_set_and_pick() {
        let (_dir, ws) = project();
        let store = MemorySettings::new();

        let args = FoldersArgs {
            pick: false,
            set: Some(vec!["src/".to_string(), "/".to_string(), "src".to_string()]),
            clear: false,
        };
        folders(&ws, &store, &args, OutputFormat::Text, &mut Cursor::new("")).unwrap();
        assert_eq!(
            store.selected_directories(ws.root()).unwrap(),
            vec!["src".to_string(), String::new()]
        );

        let args = FoldersArgs {
            pick: true,
            set: None,
            clear: false,
        };
        folders(&ws, &store, &args, OutputFormat::Text, &mut Cursor::new("2\n")).unwrap();
        assert_eq!(
            store.selected_directories(ws.root()).unwrap(),
            vec!["src".to_string()]
        );
    }

    #[test]
    fn test_parse_open_target() {
        let reference = parse_open_target("src/app.ts:2").unwrap();
        assert_eq!((reference.path.as_str(), reference.line_number), ("src/app.ts", 2));

        let reference = parse_open_target("`src/app.ts`").unwrap();
        assert_eq!(reference.line_number, 1);

        let reference = parse_open_target("src/app.ts").unwrap();
        assert_eq!(reference.path, "src/app.ts");

        let target = FileReference::new("app.ts", 3).payload().to_target();
        let reference = parse_open_target(&target).unwrap();
        assert_eq!((reference.path.as_str(), reference.line_number), ("app.ts", 3));

        assert!(parse_open_target("   ").is_none());
    }

    #[test]
    fn test_open_clamps_line() {
        let (_dir, ws) = project();
        let mut sink = Collect::default();

        let location = open(
            &ws,
            "app.ts:99",
            ResolveMode::Interactive,
            &mut NeverAsked,
            &mut sink,
        )
        .unwrap();

        assert_eq!(location.relative_path, "src/app.ts");
        assert_eq!(location.line_number, 3);
        assert_eq!(sink.0.len(), 1);
    }

    #[tokio::test]
    async fn test_comments_respects_limit() {
        let (dir, ws) = project();
        fs::write(dir.path().join("src/notes.ts"), "// one\n// two\n// three\n").unwrap();
        let session = Session::new(ws.root().to_path_buf(), Vec::new());

        let report = comments(
            &ws,
            &session,
            Some(2),
            OutputFormat::Json,
            Arc::new(AtomicBool::new(false)),
        )
        .await
        .unwrap();

        let texts: Vec<&str> = report.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }
}

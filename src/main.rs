//! NavBuddy - natural-language code navigation
//!
//! Finds code by asking a language model about the comments in a project,
//! and turns file references in text into links that open the right line.

use anyhow::Result;
use clap::Parser;
use navbuddy::cli::{
    comments, config, find, folders, link, open, open_store, set_key, Cli, Commands,
    StdinDisambiguator, TerminalSink,
};
use navbuddy::llm::client_from_settings;
use navbuddy::query::Session;
use navbuddy::repo::{ResolveMode, Workspace};
use navbuddy::storage::SettingsStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let state = cli.state.as_deref();

    // Execute command
    match cli.command {
        Commands::Find(ref args) => {
            let workspace = Workspace::open(&cli.path)?;
            let store = open_store(state)?;

            // Credentials are checked before any file is read
            let client = client_from_settings(
                &workspace.config().llm,
                cli.api_key.as_deref(),
                store.api_key()?,
            )?;
            let session = Session::load(&workspace, &store)?;
            let mut sink = TerminalSink::new(cli.format, args.editor);

            find(
                &workspace,
                &session,
                client,
                &args.query_text(),
                &mut sink,
                cli.format,
                cancel_on_ctrl_c(),
            )
            .await?;
        }

        Commands::Open(ref args) => {
            let workspace = Workspace::open(&cli.path)?;
            let mode = if args.first {
                ResolveMode::BestEffort
            } else {
                ResolveMode::Interactive
            };
            let mut sink = TerminalSink::new(cli.format, args.editor);

            open(
                &workspace,
                &args.reference,
                mode,
                &mut StdinDisambiguator::stdin(),
                &mut sink,
            )?;
        }

        Commands::Link(ref args) => {
            link(args.file.as_deref())?;
        }

        Commands::Folders(ref args) => {
            let workspace = Workspace::open(&cli.path)?;
            let store = open_store(state)?;
            folders(
                &workspace,
                &store,
                args,
                cli.format,
                &mut std::io::stdin().lock(),
            )?;
        }

        Commands::Comments(ref args) => {
            let workspace = Workspace::open(&cli.path)?;
            let store = open_store(state)?;
            let session = Session::load(&workspace, &store)?;
            comments(
                &workspace,
                &session,
                args.limit,
                cli.format,
                cancel_on_ctrl_c(),
            )
            .await?;
        }

        Commands::SetKey(ref args) => {
            let store = open_store(state)?;
            set_key(&store, args.key.as_deref(), &mut std::io::stdin().lock())?;
        }

        Commands::Config(ref args) => {
            let workspace = Workspace::open(&cli.path)?;
            config(&workspace, args.reset, cli.format)?;
        }
    }

    Ok(())
}

/// Flag set by the first Ctrl-C; a second one exits immediately
fn cancel_on_ctrl_c() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handle = Arc::clone(&flag);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.store(true, Ordering::Relaxed);
            tracing::warn!("Cancelling scan, press Ctrl-C again to quit");
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    flag
}

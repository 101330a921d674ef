//! Persistent settings storage for NavBuddy
//!
//! This module handles the small amount of state that outlives a query:
//! - The directories selected for scanning, per project
//! - The model API key
//!
//! Callers depend on the [`SettingsStore`] trait; [`Database`] backs it with
//! SQLite and [`MemorySettings`] keeps everything in memory.

mod schema;

pub use schema::SCHEMA;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SELECTED_DIRECTORIES_KEY: &str = "selected_directories";
const API_KEY_KEY: &str = "api_key";
const GLOBAL_SCOPE: &str = "";

/// Read/write access to persisted settings
pub trait SettingsStore {
    /// Directories selected for scanning in a project (empty means everything)
    fn selected_directories(&self, root: &Path) -> Result<Vec<String>>;

    /// Replace the selected directories of a project
    fn set_selected_directories(&self, root: &Path, dirs: &[String]) -> Result<()>;

    /// Stored model API key
    fn api_key(&self) -> Result<Option<String>>;

    /// Store the model API key
    fn set_api_key(&self, key: &str) -> Result<()>;
}

/// Default location of the settings database
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("navbuddy")
        .join("navbuddy.db")
}

fn scope_for(root: &Path) -> String {
    root.to_string_lossy().into_owned()
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    fn get(&self, scope: &str, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE scope = ?1 AND key = ?2",
                params![scope, key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read setting {}", key))?;

        Ok(value)
    }

    fn set(&self, scope: &str, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO settings (scope, key, value, updated_at)
                VALUES (?1, ?2, ?3, datetime('now'))
                ON CONFLICT(scope, key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = datetime('now')
                "#,
                params![scope, key, value],
            )
            .with_context(|| format!("Failed to write setting {}", key))?;
        Ok(())
    }
}

impl SettingsStore for Database {
    fn selected_directories(&self, root: &Path) -> Result<Vec<String>> {
        match self.get(&scope_for(root), SELECTED_DIRECTORIES_KEY)? {
            Some(json) => {
                serde_json::from_str(&json).context("Stored directory selection is corrupt")
            }
            None => Ok(Vec::new()),
        }
    }

    fn set_selected_directories(&self, root: &Path, dirs: &[String]) -> Result<()> {
        let json = serde_json::to_string(dirs)?;
        self.set(&scope_for(root), SELECTED_DIRECTORIES_KEY, &json)
    }

    fn api_key(&self) -> Result<Option<String>> {
        self.get(GLOBAL_SCOPE, API_KEY_KEY)
    }

    fn set_api_key(&self, key: &str) -> Result<()> {
        self.set(GLOBAL_SCOPE, API_KEY_KEY, key)
    }
}

/// In-memory settings store
#[derive(Default)]
pub struct MemorySettings {
    directories: Mutex<HashMap<PathBuf, Vec<String>>>,
    api_key: Mutex<Option<String>>,
}

impl MemorySettings {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn selected_directories(&self, root: &Path) -> Result<Vec<String>> {
        let directories = self
            .directories
            .lock()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        Ok(directories.get(root).cloned().unwrap_or_default())
    }

    fn set_selected_directories(&self, root: &Path, dirs: &[String]) -> Result<()> {
        self.directories
            .lock()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?
            .insert(root.to_path_buf(), dirs.to_vec());
        Ok(())
    }

    fn api_key(&self) -> Result<Option<String>> {
        Ok(self
            .api_key
            .lock()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?
            .clone())
    }

    fn set_api_key(&self, key: &str) -> Result<()> {
        *self
            .api_key
            .lock()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))? = Some(key.to_string());
        Ok(())
    }
}

//! tc-store: registry document format, validation and CSV exchange.

pub mod csv;
pub mod migrate;
pub mod schema;
pub mod validate;

pub use csv::{CSV_HEADER, export_csv, import_csv, parse_csv, render_csv};
pub use migrate::{MigrationReport, migrate_to_latest};
pub use schema::*;
pub use validate::{DocumentError, validate_document};

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Document validation error: {0}")]
    Validation(#[from] DocumentError),

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read, migrate and validate a registry document.
pub fn load_json(path: &Path) -> StoreResult<(RegistryDoc, MigrationReport)> {
    if !path.exists() {
        return Err(StoreError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    let doc: RegistryDoc = serde_json::from_str(&content)?;
    validate_document(&doc)?;
    Ok(migrate_to_latest(doc))
}

/// Validate and write a registry document, replacing `path` atomically.
pub fn save_json(path: &Path, doc: &RegistryDoc) -> StoreResult<()> {
    validate_document(doc)?;
    let content = serde_json::to_string_pretty(doc)?;
    write_atomic(path, content.as_bytes())?;
    debug!(path = %path.display(), tanks = doc.tanks.len(), "wrote registry document");
    Ok(())
}

/// Write to a sibling temporary file, then rename it over `path`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, contents)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

/// Move an unreadable document to `<path>.bak` so later writes cannot replace it.
pub fn backup_file(path: &Path) -> StoreResult<PathBuf> {
    let backup = sibling_path(path, ".bak");
    fs::rename(path, &backup)?;
    Ok(backup)
}

fn temp_path(path: &Path) -> PathBuf {
    sibling_path(path, ".tmp")
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "registry".into());
    name.push(suffix);
    path.with_file_name(name)
}

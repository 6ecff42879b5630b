use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::date::Clock;
use crate::manager::ModelManager;

/// Failures while reading or writing the model file.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed model file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("inconsistent model in {path}: {problems}")]
    Inconsistent { path: PathBuf, problems: String },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Returns the path to the model file (`projust.json`).
///
/// The path is determined in the following order:
/// 1. `PROJUST_DB` environment variable.
/// 2. `~/.local/share/projust/projust.json` (on Linux).
/// 3. `./projust.json` (fallback).
pub fn db_path() -> PathBuf {
    std::env::var("PROJUST_DB").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("projust");
        p.push("projust.json");
        p
    })
}

/// Loads the model stored at `path`, driven by `clock`.
///
/// A missing file yields an empty model. A file whose links do not mirror
/// each other is rejected rather than repaired.
pub fn load_model(path: &Path, clock: Box<dyn Clock>) -> Result<ModelManager, StorageError> {
    if !path.exists() {
        debug!(path = %path.display(), "no model file, starting empty");
        return Ok(ModelManager::with_clock(clock));
    }
    let mut f = OpenOptions::new().read(true).open(path).map_err(io_err(path))?;
    let mut s = String::new();
    f.read_to_string(&mut s).map_err(io_err(path))?;
    let mut model: ModelManager = serde_json::from_str(&s).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let problems = model.integrity_problems();
    if !problems.is_empty() {
        warn!(path = %path.display(), count = problems.len(), "rejecting inconsistent model");
        return Err(StorageError::Inconsistent {
            path: path.to_path_buf(),
            problems: problems.join("; "),
        });
    }
    model.set_clock(clock);
    Ok(model)
}

/// Saves the whole model to `path`, overwriting the existing file.
pub fn save_model(path: &Path, model: &ModelManager) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(path))?;
    }
    let s = serde_json::to_string_pretty(model).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(io_err(path))?;
    f.write_all(s.as_bytes()).map_err(io_err(path))?;
    debug!(path = %path.display(), "model saved");
    Ok(())
}

/// Deletes the model file.
pub fn delete_database(path: &Path) -> Result<(), StorageError> {
    if path.exists() {
        fs::remove_file(path).map_err(io_err(path))?;
    }
    Ok(())
}

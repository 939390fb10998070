//! On-disk snapshot document and the persistence sink
//!
//! The whole store is serialized on every write and replaces the previous file.
//! Writes go to a sibling temporary file first and are renamed over the snapshot,
//! so a crash mid-write leaves the previous snapshot intact.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::TEMP_FILE_SUFFIX;
use crate::error::{DbError, Result};
use crate::models::{TokenData, Tunnel};

/// Complete store state, and the document written to the snapshot file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Token string -> identity
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tokens: HashMap<String, TokenData>,

    /// Domain -> tunnel route
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tunnels: HashMap<String, Tunnel>,
}

impl Snapshot {
    /// Parse a snapshot document
    ///
    /// A `null` document or `null` mapping is treated as empty.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let parsed: Option<Snapshot> = serde_json::from_slice(bytes)?;
        Ok(parsed.unwrap_or_default())
    }

    /// Serialize to the pretty-printed document stored on disk
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.tunnels.is_empty()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read the snapshot file
///
/// Returns `Ok(None)` when the file does not exist. Read and parse failures are
/// returned as errors so the caller decides how to recover.
pub fn load(path: &Path) -> Result<Option<Snapshot>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DbError::io(path, e)),
    };

    Snapshot::from_slice(&bytes).map(Some)
}

/// Replace the snapshot file with the full serialized state
pub fn persist(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let json = snapshot.to_vec()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DbError::io(parent, e))?;
    }

    let tmp_path = temp_path(path);
    if let Err(e) = write_synced(&tmp_path, &json) {
        let _ = fs::remove_file(&tmp_path);
        return Err(DbError::io(&tmp_path, e));
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(DbError::io(path, e));
    }
    sync_parent_dir(path)?;

    debug!(
        "Persisted snapshot to {} ({} tokens, {} tunnels, {} bytes)",
        path.display(),
        snapshot.tokens.len(),
        snapshot.tunnels.len(),
        json.len()
    );
    Ok(())
}

/// Sibling path the snapshot is staged at before the rename
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".");
    name.push(TEMP_FILE_SUFFIX);
    path.with_file_name(name)
}

fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = open_for_write(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Flush the directory entry so the rename survives a crash
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| DbError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn open_for_write(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(crate::constants::SNAPSHOT_FILE_MODE)
        .open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

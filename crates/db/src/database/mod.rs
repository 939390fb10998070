//! The token and tunnel store
//!
//! One mutex guards both mappings and the snapshot write. Every operation holds it
//! for its full duration, including the file write for mutations, so operations are
//! strictly serialized: reads never observe a half-applied change, and a slow write
//! delays every other caller until it completes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::error::{DbError, Result};
use crate::models::{TokenData, Tunnel};
use crate::snapshot::{self, Snapshot};


/// Snapshot-persisted store of tokens and tunnel routes
///
/// Construct it once with [`Database::open`] and share it (e.g. in an `Arc`) with
/// every component that needs it. All methods are synchronous; async callers should
/// use `spawn_blocking` for mutations since they perform file I/O.
#[derive(Debug)]
pub struct Database {
    path: PathBuf,
    state: Mutex<Snapshot>,
}

impl Database {
    /// Open the store, recovering whatever the snapshot file holds
    ///
    /// Never fails. A missing, unreadable or malformed snapshot starts the store
    /// empty; a malformed one is discarded entirely. The recovered state is written
    /// back immediately so the file on disk is always a valid snapshot.
    pub fn open(config: DatabaseConfig) -> Self {
        let path = config.path;
        let state = recover(&path);

        info!(
            "Opened tunnel database at {} ({} tokens, {} tunnels)",
            path.display(),
            state.tokens.len(),
            state.tunnels.len()
        );

        let db = Self {
            path,
            state: Mutex::new(state),
        };

        {
            let state = db.lock();
            if let Err(e) = snapshot::persist(&db.path, &state) {
                error!("Failed to write initial snapshot: {}", e);
            }
        }

        db
    }

    /// Snapshot file this store writes
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the identity behind a token
    pub fn get_token_data(&self, token: &str) -> Option<TokenData> {
        self.lock().tokens.get(token).cloned()
    }

    /// Insert or replace a token, then persist
    ///
    /// If persisting fails the token is still set in memory, but the error is
    /// returned because the change is not durable.
    pub fn set_token_data(&self, token: impl Into<String>, data: TokenData) -> Result<()> {
        let mut state = self.lock();
        state.tokens.insert(token.into(), data);
        self.persist(&state)
    }

    /// Copy of every tunnel route, keyed by domain
    pub fn get_tunnels(&self) -> HashMap<String, Tunnel> {
        self.lock().tunnels.clone()
    }

    /// Look up the tunnel route for a domain
    pub fn get_tunnel(&self, domain: &str) -> Option<Tunnel> {
        self.lock().tunnels.get(domain).cloned()
    }

    /// Insert or replace the route for a domain, then persist
    pub fn set_tunnel(&self, domain: impl Into<String>, tunnel: Tunnel) -> Result<()> {
        let mut state = self.lock();
        state.tunnels.insert(domain.into(), tunnel);
        self.persist(&state)
    }

    /// Remove the route for a domain, then persist
    ///
    /// Returns whether a route existed. Removing an unknown domain is not an error
    /// and still rewrites the snapshot.
    pub fn delete_tunnel(&self, domain: &str) -> Result<bool> {
        let mut state = self.lock();
        let existed = state.tunnels.remove(domain).is_some();
        self.persist(&state)?;
        Ok(existed)
    }

    pub fn token_count(&self) -> usize {
        self.lock().tokens.len()
    }

    pub fn tunnel_count(&self) -> usize {
        self.lock().tunnels.len()
    }

    /// Copy of the complete state
    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    // Caller must hold the lock for the state being written
    fn persist(&self, state: &Snapshot) -> Result<()> {
        snapshot::persist(&self.path, state).inspect_err(|e| {
            error!("Failed to persist tunnel database: {}", e);
        })
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        // Each mutation is a single insert or remove, so poisoned state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn recover(path: &Path) -> Snapshot {
    match snapshot::load(path) {
        Ok(Some(state)) => state,
        Ok(None) => {
            info!("No snapshot at {}, starting empty", path.display());
            Snapshot::default()
        }
        Err(e @ DbError::Io { .. }) => {
            warn!("Failed reading snapshot, starting empty: {}", e);
            Snapshot::default()
        }
        Err(e) => {
            error!(
                "Discarding unparsable snapshot at {}, starting empty: {}",
                path.display(),
                e
            );
            Snapshot::default()
        }
    }
}

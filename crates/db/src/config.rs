use std::path::PathBuf;

use crate::constants::DEFAULT_DB_FILE;

/// Configuration for opening the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Snapshot file the store loads from and rewrites on every mutation
    pub path: PathBuf,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_path() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path, Path::new("boringproxy_db.json"));
    }

    #[test]
    fn test_explicit_path() {
        let config = DatabaseConfig::new("/var/lib/tunnel/db.json");
        assert_eq!(config.path, Path::new("/var/lib/tunnel/db.json"));
    }
}

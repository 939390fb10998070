/// Snapshot file used when no path is configured (relative to the working directory)
pub const DEFAULT_DB_FILE: &str = "boringproxy_db.json";

/// Extension appended to the snapshot path for the in-flight write before rename
pub const TEMP_FILE_SUFFIX: &str = "tmp";

/// Permissions for the snapshot file on Unix (owner read/write only, it holds private keys)
pub const SNAPSHOT_FILE_MODE: u32 = 0o600;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_values() {
        const _: () = assert!(SNAPSHOT_FILE_MODE & 0o077 == 0, "Must not be group/world readable");

        assert!(DEFAULT_DB_FILE.ends_with(".json"));
        assert_ne!(TEMP_FILE_SUFFIX, "json");
    }
}

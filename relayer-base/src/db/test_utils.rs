use tempfile::TempDir;

use super::{RelayerRocksDB, DB};

/// A database in a fresh temporary directory. Keep the `TempDir` alive for
/// as long as the database is used.
pub fn tmp_db() -> (TempDir, RelayerRocksDB) {
    let dir = tempfile::tempdir().unwrap();
    let db = DB::from_path(dir.path()).unwrap();
    (dir, RelayerRocksDB::new(db))
}

// ABOUTME: Data layer shared by the Slips domain packages
// ABOUTME: Storage error type, SQLite pool setup, migrations, and row decoding helpers

pub mod db;
mod error;
pub mod rows;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use db::{connect, run_migrations, DatabaseOptions};
pub use error::{StorageError, StorageResult};
pub use rows::{parse_uuid, parse_uuids};

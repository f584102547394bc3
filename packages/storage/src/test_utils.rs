// ABOUTME: Database fixtures for tests in Slips packages
// ABOUTME: In-memory and temp-file SQLite pools with the schema applied

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::db::{connect, run_migrations, DatabaseOptions};

/// Single-connection in-memory pool; the connection never expires so the data survives
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to create in-memory database");

    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Multi-connection pool backed by a file, for tests that need real concurrency
pub async fn file_pool(dir: &Path, max_connections: u32) -> SqlitePool {
    let url = format!("sqlite://{}", dir.join("slips-test.db").display());
    connect(&DatabaseOptions::new(url).max_connections(max_connections))
        .await
        .expect("Failed to create file database")
}

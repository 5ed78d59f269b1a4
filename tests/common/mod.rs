use gorev::db::{create_pool, run_migrations};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Fresh migrated database in a temp dir. Keep the `TempDir` alive for the
/// duration of the test; dropping it removes the database file.
pub async fn setup_local_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let pool = create_pool(&temp_dir.path().join("gorev.db")).await.unwrap();
    run_migrations(&pool).await.unwrap();
    (temp_dir, pool)
}

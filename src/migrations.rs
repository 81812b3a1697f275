//! Schema migration framework.
//!
//! Numbered SQL migrations are embedded at compile time via `include_str!`.
//! Each migration runs exactly once, tracked by the `schema_version` table.

use rusqlite::Connection;

struct Migration {
    version: i32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("migrations/001_baseline.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("migrations/002_notification_ledger_guards.sql"),
    },
];

/// Create the `schema_version` table if it doesn't exist.
fn ensure_schema_version_table(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| format!("Failed to create schema_version table: {}", e))
}

/// Return the highest applied migration version, or 0 if none.
fn current_version(conn: &Connection) -> Result<i32, String> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| format!("Failed to read schema version: {}", e))
}

/// Back up the database before applying migrations.
///
/// Uses SQLite's online backup API to create a hot copy at
/// `<db_path>.pre-migration.bak`. Skipped for fresh databases (version 0)
/// since there is nothing to lose.
fn backup_before_migration(conn: &Connection, current: i32) -> Result<(), String> {
    if current == 0 {
        return Ok(());
    }

    let db_path: String = conn
        .query_row("PRAGMA database_list", [], |row| row.get(2))
        .map_err(|e| format!("Failed to get database path: {}", e))?;

    if db_path.is_empty() || db_path == ":memory:" {
        return Ok(());
    }

    let backup_path = format!("{}.pre-migration.bak", db_path);
    let mut backup_conn = Connection::open(&backup_path)
        .map_err(|e| format!("Failed to open backup file: {}", e))?;

    let backup = rusqlite::backup::Backup::new(conn, &mut backup_conn)
        .map_err(|e| format!("Failed to initialize pre-migration backup: {}", e))?;

    backup
        .step(-1)
        .map_err(|e| format!("Pre-migration backup failed: {}", e))?;

    log::info!("Pre-migration backup created at {}", backup_path);
    Ok(())
}

/// Run all pending migrations.
///
/// Returns the number of migrations applied (0 if already up-to-date).
///
/// Forward-compat guard: if the database has a higher version than the highest
/// known migration, returns an error instead of touching it.
pub fn run_migrations(conn: &Connection) -> Result<usize, String> {
    ensure_schema_version_table(conn)?;

    let current = current_version(conn)?;
    let max_known = MIGRATIONS.last().map(|m| m.version).unwrap_or(0);

    if current > max_known {
        return Err(format!(
            "Database schema version ({}) is newer than this build supports ({}). \
             Upgrade the backoffice binary before opening this database.",
            current, max_known
        ));
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();

    if pending.is_empty() {
        return Ok(0);
    }

    backup_before_migration(conn, current)?;

    for migration in &pending {
        conn.execute_batch(migration.sql)
            .map_err(|e| format!("Migration v{} failed: {}", migration.version, e))?;

        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [migration.version],
        )
        .map_err(|e| format!("Failed to record migration v{}: {}", migration.version, e))?;

        log::info!("Applied migration v{}", migration.version);
    }

    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_db() -> Connection {
        Connection::open_in_memory().expect("in-memory db")
    }

    #[test]
    fn test_fresh_db_applies_all() {
        let conn = mem_db();
        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, MIGRATIONS.len());
        assert_eq!(current_version(&conn).expect("version"), 2);

        conn.execute(
            "INSERT INTO accounts (full_name, email, role, created_at, updated_at)
             VALUES ('Ada', 'ada@example.com', 'DEVELOPER', '2025-01-01', '2025-01-01')",
            [],
        )
        .expect("accounts should accept a developer");
    }

    #[test]
    fn test_email_unique_case_insensitive() {
        let conn = mem_db();
        run_migrations(&conn).expect("migrate");
        conn.execute(
            "INSERT INTO accounts (full_name, email, role, created_at, updated_at)
             VALUES ('Ada', 'ada@example.com', 'DEVELOPER', '2025-01-01', '2025-01-01')",
            [],
        )
        .expect("first insert");
        let dup = conn.execute(
            "INSERT INTO accounts (full_name, email, role, created_at, updated_at)
             VALUES ('Ada Again', 'ADA@example.com', 'CUSTOMER', '2025-01-01', '2025-01-01')",
            [],
        );
        assert!(dup.is_err(), "email uniqueness must ignore case");
    }

    #[test]
    fn test_read_flag_cannot_revert() {
        let conn = mem_db();
        run_migrations(&conn).expect("migrate");
        conn.execute_batch(
            "INSERT INTO accounts (id, full_name, email, role, created_at, updated_at)
             VALUES (1, 'Ada', 'ada@example.com', 'DEVELOPER', '2025-01-01', '2025-01-01');
             INSERT INTO user_notifications (id, recipient_id, type, title, read_flag, created_at)
             VALUES (1, 1, 'CUSTOM', 'Hello', 1, '2025-01-01');",
        )
        .expect("seed");

        let revert = conn.execute("UPDATE user_notifications SET read_flag = 0 WHERE id = 1", []);
        assert!(revert.is_err());

        let retitle = conn.execute("UPDATE user_notifications SET title = 'Edited' WHERE id = 1", []);
        assert!(retitle.is_err());
    }

    #[test]
    fn test_forward_compat_guard() {
        let conn = mem_db();
        ensure_schema_version_table(&conn).unwrap();
        conn.execute("INSERT INTO schema_version (version) VALUES (999)", [])
            .unwrap();

        let err = run_migrations(&conn).unwrap_err();
        assert!(
            err.contains("newer than this build"),
            "error should mention version mismatch: {}",
            err
        );
    }

    #[test]
    fn test_idempotency() {
        let conn = mem_db();
        let first = run_migrations(&conn).expect("first run");
        assert_eq!(first, 2);
        let second = run_migrations(&conn).expect("second run");
        assert_eq!(second, 0, "second run should apply no migrations");
    }

    #[test]
    fn test_pre_migration_backup_created_for_existing_db() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("test_backup.db");

        let conn = Connection::open(&db_path).expect("open db");
        ensure_schema_version_table(&conn).expect("schema_version");
        conn.execute_batch(MIGRATIONS[0].sql).expect("baseline");
        conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])
            .expect("record v1");

        let applied = run_migrations(&conn).expect("migrations should succeed");
        assert_eq!(applied, 1);

        let backup_path = dir.path().join("test_backup.db.pre-migration.bak");
        assert!(
            backup_path.exists(),
            "pre-migration backup should be created at {}",
            backup_path.display()
        );
    }
}

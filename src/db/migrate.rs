use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, params};

/// Ensure that the `log` table exists; it also records applied migrations.
fn ensure_log_table(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> AppResult<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> AppResult<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, 'migration_applied', ?2, ?3)",
        params![chrono::Local::now().to_rfc3339(), version, message],
    )?;
    Ok(())
}

/// Businesses, users, members, events and records.
const CORE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS businesses (
        id                    INTEGER PRIMARY KEY AUTOINCREMENT,
        name                  TEXT NOT NULL,
        join_code             TEXT UNIQUE,
        require_join_approval INTEGER NOT NULL DEFAULT 0,
        subscription_id       TEXT
    );

    CREATE TABLE IF NOT EXISTS users (
        id    TEXT PRIMARY KEY,
        email TEXT NOT NULL DEFAULT '',
        name  TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS members (
        business_id INTEGER NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
        user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role        TEXT NOT NULL DEFAULT 'user'
                    CHECK(role IN ('owner','admin','moderator','scanner','user')),
        custom_data TEXT NOT NULL DEFAULT '{}',
        PRIMARY KEY (business_id, user_id)
    );

    CREATE TABLE IF NOT EXISTS events (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        business_id INTEGER NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
        name        TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        start_ts    INTEGER NOT NULL,
        end_ts      INTEGER NOT NULL,
        repeat_id   INTEGER,
        tag         TEXT NOT NULL DEFAULT '',
        CHECK (start_ts <= end_ts)
    );

    CREATE INDEX IF NOT EXISTS idx_events_business_start ON events(business_id, start_ts);
    CREATE INDEX IF NOT EXISTS idx_events_repeat ON events(repeat_id);

    CREATE TABLE IF NOT EXISTS records (
        event_id    INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
        business_id INTEGER NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
        user_id     TEXT NOT NULL,
        timestamp   INTEGER NOT NULL,
        status      TEXT NOT NULL
                    CHECK(status IN ('PRESENT','ABSENT','LATE','EXCUSED','ABSENT(self-marked)')),
        PRIMARY KEY (event_id, user_id),
        FOREIGN KEY (business_id, user_id)
            REFERENCES members(business_id, user_id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_records_business_user ON records(business_id, user_id);
"#;

/// Pending enrollments for businesses that require approval.
const JOIN_REQUESTS: &str = r#"
    CREATE TABLE IF NOT EXISTS join_requests (
        business_id  INTEGER NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
        user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        requested_at INTEGER NOT NULL,
        PRIMARY KEY (business_id, user_id)
    );
"#;

const MIGRATIONS: &[(&str, &str, &str)] = &[
    (
        "20251001_0001_core_schema",
        CORE_SCHEMA,
        "Created businesses, users, members, events and records tables.",
    ),
    (
        "20251014_0002_join_requests",
        JOIN_REQUESTS,
        "Created join_requests table.",
    ),
];

/// Apply every migration not yet recorded in `log`. Idempotent.
/// Returns the versions applied by this call.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<Vec<&'static str>> {
    ensure_log_table(conn)?;

    let mut applied = Vec::new();
    for (version, sql, message) in MIGRATIONS {
        if is_applied(conn, version)? {
            continue;
        }

        conn.execute_batch(sql)
            .map_err(|e| AppError::Migration(format!("{version}: {e}")))?;
        mark_applied(conn, version, message)?;
        applied.push(*version);
    }

    Ok(applied)
}

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (snippets, users, sessions)");
        conn.execute_batch(
            "
            CREATE TABLE snippets (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                content     TEXT NOT NULL,
                created     TEXT NOT NULL,
                expires     TEXT NOT NULL
            );

            CREATE INDEX idx_snippets_expires ON snippets(expires);

            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                email           TEXT NOT NULL COLLATE NOCASE,
                hashed_password TEXT NOT NULL,
                created         TEXT NOT NULL,
                CONSTRAINT users_uc_email UNIQUE (email)
            );

            CREATE TABLE sessions (
                token       TEXT PRIMARY KEY,
                data        TEXT NOT NULL,
                expiry      TEXT NOT NULL
            );

            CREATE INDEX idx_sessions_expiry ON sessions(expiry);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

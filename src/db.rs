use anyhow::Result;
use rusqlite::Connection;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS profiles (
    id                   INTEGER PRIMARY KEY,
    user_id              TEXT NOT NULL UNIQUE CHECK(user_id GLOB '[a-zA-Z0-9_-]*' AND length(user_id) > 0),
    email                TEXT NOT NULL,
    subscription_tier    TEXT,
    subscription_state   TEXT,
    strategic_trial_used INTEGER NOT NULL DEFAULT 0 CHECK(strategic_trial_used IN (0, 1)),
    trial_used_at        TEXT,
    email_domain_type    TEXT CHECK(email_domain_type IS NULL OR email_domain_type IN ('standard', 'disposable', 'enterprise')),
    created_at           TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at           TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);
";

fn set_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

pub fn open(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    set_pragmas(&conn)?;
    Ok(conn)
}

pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    set_pragmas(&conn)?;
    init(&conn)?;
    Ok(conn)
}

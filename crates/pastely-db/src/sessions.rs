use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::{Database, ModelError};

impl Database {
    // -- Sessions --

    /// Serialized data for `token`, if it exists and has not expired.
    pub fn find_session(&self, token: &str) -> Result<Option<String>, ModelError> {
        self.with_conn(|conn| {
            let data = conn
                .query_row(
                    "SELECT data FROM sessions WHERE token = ?1 AND expiry > ?2",
                    params![token, Utc::now()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(data)
        })
    }

    pub fn commit_session(
        &self,
        token: &str,
        data: &str,
        expiry: DateTime<Utc>,
    ) -> Result<(), ModelError> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, data, expiry) VALUES (?1, ?2, ?3)
                 ON CONFLICT(token) DO UPDATE SET data = excluded.data, expiry = excluded.expiry",
                params![token, data, expiry],
            )?;
            Ok(())
        })
    }

    pub fn delete_session(&self, token: &str) -> Result<(), ModelError> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
            Ok(())
        })
    }

    /// Removes every expired session and returns how many were pruned.
    pub fn delete_expired_sessions(&self) -> Result<usize, ModelError> {
        self.with_conn_mut(|conn| {
            let pruned = conn.execute("DELETE FROM sessions WHERE expiry <= ?1", [Utc::now()])?;
            Ok(pruned)
        })
    }
}

use chrono::{TimeDelta, Utc};
use pastely_types::models::{LATEST_SNIPPETS, Snippet};
use rusqlite::{Row, params};

use crate::{Database, ModelError};

impl Database {
    // -- Snippets --

    /// Stores a snippet that stays visible for `expiry_days` and returns the
    /// id assigned by the store.
    pub fn insert_snippet(
        &self,
        title: &str,
        content: &str,
        expiry_days: i64,
    ) -> Result<i64, ModelError> {
        let created = Utc::now();
        let expires = TimeDelta::try_days(expiry_days)
            .and_then(|lifetime| created.checked_add_signed(lifetime))
            .ok_or(ModelError::ExpiryOutOfRange(expiry_days))?;

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO snippets (title, content, created, expires) VALUES (?1, ?2, ?3, ?4)",
                params![title, content, created, expires],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Expired and missing snippets both come back as `NoRecord`.
    pub fn get_snippet(&self, id: i64) -> Result<Snippet, ModelError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, title, content, created, expires
                 FROM snippets
                 WHERE expires > ?1 AND id = ?2",
                params![Utc::now(), id],
                snippet_from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => ModelError::NoRecord,
                other => other.into(),
            })
        })
    }

    /// Most recently created live snippets, newest first.
    pub fn latest_snippets(&self) -> Result<Vec<Snippet>, ModelError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, created, expires
                 FROM snippets
                 WHERE expires > ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(params![Utc::now(), LATEST_SNIPPETS], snippet_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn snippet_from_row(row: &Row<'_>) -> rusqlite::Result<Snippet> {
    Ok(Snippet {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created: row.get(3)?,
        expires: row.get(4)?,
    })
}

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use rusqlite::{ffi, params};

use crate::{Database, ModelError};

// Fixed Argon2id work factor; stored hashes carry their own parameters, so
// changing these only affects new signups.
const HASH_MEMORY_KIB: u32 = 19_456;
const HASH_ITERATIONS: u32 = 2;
const HASH_LANES: u32 = 1;

/// Argon2id stands in for bcrypt here; the parameters are fixed so every
/// signup pays the same cost.
fn hasher() -> Result<Argon2<'static>, ModelError> {
    let params = Params::new(HASH_MEMORY_KIB, HASH_ITERATIONS, HASH_LANES, None)
        .map_err(|e| ModelError::PasswordHash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

impl Database {
    // -- Users --

    pub fn insert_user(&self, name: &str, email: &str, password: &str) -> Result<(), ModelError> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ModelError::PasswordHash(e.to_string()))?
            .to_string();

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, hashed_password, created) VALUES (?1, ?2, ?3, ?4)",
                params![name, email, hashed_password, Utc::now()],
            )
            .map_err(classify_insert_error)?;
            Ok(())
        })
    }

    /// Returns the user's id when `password` matches. An unknown email and a
    /// wrong password are reported identically.
    pub fn authenticate_user(&self, email: &str, password: &str) -> Result<i64, ModelError> {
        let (id, hashed_password): (i64, String) = self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, hashed_password FROM users WHERE email = ?1",
                [email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => ModelError::InvalidCredentials,
                other => other.into(),
            })
        })?;

        let parsed_hash = PasswordHash::new(&hashed_password)
            .map_err(|e| ModelError::PasswordHash(e.to_string()))?;

        match hasher()?.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(id),
            Err(password_hash::Error::Password) => Err(ModelError::InvalidCredentials),
            Err(e) => Err(ModelError::PasswordHash(e.to_string())),
        }
    }

    pub fn user_exists(&self, id: i64) -> Result<bool, ModelError> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }
}

/// Maps a unique violation on `users.email` to `DuplicateEmail`; anything else
/// stays a storage error.
fn classify_insert_error(err: rusqlite::Error) -> ModelError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE && message.contains("users.email") {
            return ModelError::DuplicateEmail;
        }
    }
    ModelError::Storage(err)
}

//! Server-side sessions.
//!
//! The browser only holds an opaque random token in a cookie; the data lives
//! in the `sessions` table. [`load_and_save`] loads the session before the
//! handler runs and writes it back (and sets the cookie) only when the handler
//! changed something.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{TimeDelta, Utc};
use pastely_db::Database;
use rand_core::{OsRng, RngCore};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::AppError;
use crate::state::{AppState, run_blocking};

/// One-shot message shown on the next rendered page.
pub const FLASH_KEY: &str = "flash";

/// Id of the logged-in user.
pub const AUTH_USER_KEY: &str = "authenticatedUserID";

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub lifetime: TimeDelta,
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            lifetime: TimeDelta::hours(12),
            secure: false,
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    // Token to delete on commit after `renew_token`.
    stale_token: Option<String>,
    values: Map<String, Value>,
    modified: bool,
}

/// Handle to the current request's session. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    fn loaded(token: String, values: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                token: Some(token),
                values,
                ..SessionState::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put(&self, key: &str, value: impl Into<Value>) {
        let mut state = self.lock();
        state.values.insert(key.to_string(), value.into());
        state.modified = true;
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).and_then(Value::as_str).map(str::to_string)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.lock().values.get(key).and_then(Value::as_i64)
    }

    /// Removes and returns a string value.
    pub fn pop_string(&self, key: &str) -> Option<String> {
        let mut state = self.lock();
        let value = state.values.remove(key)?;
        state.modified = true;
        value.as_str().map(str::to_string)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.lock().values.contains_key(key)
    }

    pub fn remove(&self, key: &str) {
        let mut state = self.lock();
        if state.values.remove(key).is_some() {
            state.modified = true;
        }
    }

    /// Issues a fresh token on commit and discards the old one. Call whenever
    /// the privilege level changes (login, logout).
    pub fn renew_token(&self) {
        let mut state = self.lock();
        if let Some(old) = state.token.take() {
            state.stale_token = Some(old);
        }
        state.modified = true;
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer is not installed on this route".into()))
    }
}

#[derive(Clone)]
pub struct SessionManager {
    db: Arc<Database>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(db: Arc<Database>, config: SessionConfig) -> Self {
        Self { db, config }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Unknown, expired or unreadable tokens yield an empty session.
    pub async fn load(&self, token: Option<String>) -> Result<Session, AppError> {
        let Some(token) = token else {
            return Ok(Session::default());
        };

        let db = self.db.clone();
        let lookup = token.clone();
        let Some(raw) = run_blocking(move || db.find_session(&lookup)).await? else {
            return Ok(Session::default());
        };

        match serde_json::from_str::<Map<String, Value>>(&raw) {
            Ok(values) => Ok(Session::loaded(token, values)),
            Err(e) => {
                warn!("Discarding unreadable session data: {}", e);
                Ok(Session::default())
            }
        }
    }

    /// Persists a modified session and adds its cookie to `jar`. Unmodified
    /// sessions are left alone.
    pub async fn commit(&self, session: &Session, jar: CookieJar) -> Result<CookieJar, AppError> {
        let (token, data, stale_token) = {
            let mut state = session.lock();
            if !state.modified {
                return Ok(jar);
            }
            let token = state.token.get_or_insert_with(generate_token).clone();
            let data = serde_json::to_string(&state.values)
                .map_err(|e| AppError::Internal(format!("session encoding failed: {}", e)))?;
            state.modified = false;
            (token, data, state.stale_token.take())
        };

        let expiry = Utc::now() + self.config.lifetime;
        let db = self.db.clone();
        let stored = token.clone();
        run_blocking(move || {
            if let Some(stale) = stale_token {
                db.delete_session(&stale)?;
            }
            db.commit_session(&stored, &data, expiry)
        })
        .await?;

        let cookie = Cookie::build((self.config.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .secure(self.config.secure)
            .same_site(SameSite::Lax);
        Ok(jar.add(cookie))
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Loads the session for the request and saves it after the handler ran.
pub async fn load_and_save(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(state.sessions.cookie_name())
        .map(|cookie| cookie.value().to_string());
    let session = state.sessions.load(token).await?;

    req.extensions_mut().insert(session.clone());
    let mut response = next.run(req).await;

    let jar = state.sessions.commit(&session, jar).await?;
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Cookie"));

    Ok((jar, response).into_response())
}

use std::any::Any;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;

use crate::error::AppError;
use crate::session::{AUTH_USER_KEY, Session};
use crate::state::AppState;

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com";
const REFERRER_POLICY: &str = "origin-when-cross-origin";

/// The logged-in user, if the session names one that still exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentUser(pub Option<i64>);

impl CurrentUser {
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or_else(|| AppError::Internal("authenticate layer is not installed on this route".into()))
    }
}

pub async fn secure_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static(REFERRER_POLICY));
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("deny"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("0"));

    response
}

/// Panic handler for `CatchPanicLayer`: log the payload, answer 500 and
/// close the connection.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!(panic = %details, "Recovered from panic while handling request");

    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

/// Resolves the session's user id against the store and exposes the result
/// as a [`CurrentUser`] extension. Requires the session layer.
pub async fn authenticate(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let mut user_id = session.get_i64(AUTH_USER_KEY);
    if let Some(id) = user_id {
        if !state.run(move |db| db.user_exists(id)).await? {
            user_id = None;
        }
    }

    req.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(req).await)
}

pub async fn require_authentication(user: CurrentUser, req: Request, next: Next) -> Response {
    if !user.is_authenticated() {
        return Redirect::to("/user/login").into_response();
    }

    // Pages behind a login must not be served from a shared cache.
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}

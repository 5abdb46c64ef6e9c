use std::path::Path;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::{
    authenticate, handle_panic, not_found, require_authentication, secure_headers,
};
use crate::session::load_and_save;
use crate::snippets;
use crate::state::AppState;
use crate::users;

/// Builds the full application. Static assets are served from `static_dir`
/// under `/static/`.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    let protected = Router::new()
        .route("/user/logout", post(users::user_logout_post))
        .route_layer(middleware::from_fn(require_authentication));

    let dynamic = Router::new()
        .route("/", get(snippets::home))
        .route("/snippet/view/{id}", get(snippets::snippet_view))
        .route(
            "/snippet/create",
            get(snippets::snippet_create).post(snippets::snippet_create_post),
        )
        .route(
            "/user/signup",
            get(users::user_signup).post(users::user_signup_post),
        )
        .route(
            "/user/login",
            get(users::user_login).post(users::user_login_post),
        )
        .merge(protected)
        // Outer layer last: sessions load before authentication reads them.
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .route_layer(middleware::from_fn_with_state(state.clone(), load_and_save))
        .with_state(state);

    Router::new()
        .merge(dynamic)
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found)
        .layer(middleware::from_fn(secure_headers))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

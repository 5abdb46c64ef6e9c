use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use pastely_db::ModelError;

use crate::error::AppError;
use crate::forms::{PostForm, SnippetCreateForm};
use crate::middleware::CurrentUser;
use crate::session::{FLASH_KEY, Session};
use crate::state::AppState;
use crate::templates::{CreatePage, HomePage, TemplateData, ViewPage, render};

pub async fn home(
    State(state): State<AppState>,
    session: Session,
    user: CurrentUser,
) -> Result<Response, AppError> {
    let snippets = state.run(|db| db.latest_snippets()).await?;

    let page = HomePage {
        base: TemplateData::new(&session, &user),
        snippets: snippets.into_iter().map(Into::into).collect(),
    };
    render(StatusCode::OK, &page)
}

/// GET /snippet/view/{id}. Non-numeric and non-positive ids are simply not
/// found.
pub async fn snippet_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
    user: CurrentUser,
) -> Result<Response, AppError> {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return Err(AppError::NotFound),
    };

    let snippet = match state.run(move |db| db.get_snippet(id)).await {
        Ok(snippet) => snippet,
        Err(AppError::Model(ModelError::NoRecord)) => return Err(AppError::NotFound),
        Err(e) => return Err(e),
    };

    let page = ViewPage {
        base: TemplateData::new(&session, &user),
        snippet: snippet.into(),
    };
    render(StatusCode::OK, &page)
}

pub async fn snippet_create(session: Session, user: CurrentUser) -> Result<Response, AppError> {
    let page = CreatePage {
        base: TemplateData::new(&session, &user),
        form: SnippetCreateForm::blank(),
    };
    render(StatusCode::OK, &page)
}

pub async fn snippet_create_post(
    State(state): State<AppState>,
    session: Session,
    user: CurrentUser,
    PostForm(mut form): PostForm<SnippetCreateForm>,
) -> Result<Response, AppError> {
    if !form.validate() {
        let page = CreatePage {
            base: TemplateData::new(&session, &user),
            form,
        };
        return render(StatusCode::UNPROCESSABLE_ENTITY, &page);
    }

    let title = form.title.clone();
    let content = form.content.clone();
    let expires = form.expires;
    let id = state
        .run(move |db| db.insert_snippet(&title, &content, expires))
        .await?;

    session.put(FLASH_KEY, "Snippet successfully created!");
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}

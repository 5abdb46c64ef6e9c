//! Page types rendered with askama. Template sources live in `templates/`.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Datelike, Utc};
use pastely_types::models::Snippet;

use crate::error::AppError;
use crate::forms::{SnippetCreateForm, UserLoginForm, UserSignupForm};
use crate::middleware::CurrentUser;
use crate::session::{FLASH_KEY, Session};

/// Data every page needs. Building it consumes the pending flash message.
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
}

impl TemplateData {
    pub fn new(session: &Session, user: &CurrentUser) -> Self {
        Self {
            current_year: Utc::now().year(),
            flash: session.pop_string(FLASH_KEY),
            is_authenticated: user.is_authenticated(),
        }
    }
}

pub fn human_date(t: &DateTime<Utc>) -> String {
    t.format("%d %b %Y at %I:%M %p").to_string()
}

pub struct SnippetView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: String,
    pub expires: String,
}

impl From<Snippet> for SnippetView {
    fn from(snippet: Snippet) -> Self {
        Self {
            id: snippet.id,
            created: human_date(&snippet.created),
            expires: human_date(&snippet.expires),
            title: snippet.title,
            content: snippet.content,
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub base: TemplateData,
    pub snippets: Vec<SnippetView>,
}

#[derive(Template)]
#[template(path = "view.html")]
pub struct ViewPage {
    pub base: TemplateData,
    pub snippet: SnippetView,
}

#[derive(Template)]
#[template(path = "create.html")]
pub struct CreatePage {
    pub base: TemplateData,
    pub form: SnippetCreateForm,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupPage {
    pub base: TemplateData,
    pub form: UserSignupForm,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub base: TemplateData,
    pub form: UserLoginForm,
}

/// Renders the whole page before anything is written, so a template error
/// still produces a clean 500.
pub fn render<T: Template>(status: StatusCode, page: &T) -> Result<Response, AppError> {
    let html = page.render()?;
    Ok((status, Html(html)).into_response())
}

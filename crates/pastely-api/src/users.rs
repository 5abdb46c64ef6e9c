use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use pastely_db::ModelError;
use tracing::info;

use crate::error::AppError;
use crate::forms::{PostForm, UserLoginForm, UserSignupForm};
use crate::middleware::CurrentUser;
use crate::session::{AUTH_USER_KEY, FLASH_KEY, Session};
use crate::state::AppState;
use crate::templates::{LoginPage, SignupPage, TemplateData, render};

pub async fn user_signup(session: Session, user: CurrentUser) -> Result<Response, AppError> {
    let page = SignupPage {
        base: TemplateData::new(&session, &user),
        form: UserSignupForm::default(),
    };
    render(StatusCode::OK, &page)
}

pub async fn user_signup_post(
    State(state): State<AppState>,
    session: Session,
    user: CurrentUser,
    PostForm(mut form): PostForm<UserSignupForm>,
) -> Result<Response, AppError> {
    if !form.validate() {
        return signup_rejected(&session, &user, form);
    }

    let name = form.name.clone();
    let email = form.email.clone();
    let password = form.password.clone();
    match state
        .run(move |db| db.insert_user(&name, &email, &password))
        .await
    {
        Ok(()) => info!("New user signed up"),
        Err(AppError::Model(ModelError::DuplicateEmail)) => {
            form.validator
                .add_field_error("email", "This email address is already used");
            return signup_rejected(&session, &user, form);
        }
        Err(e) => return Err(e),
    }

    session.put(FLASH_KEY, "Your signup was successful. Please log in.");
    Ok(Redirect::to("/user/login").into_response())
}

fn signup_rejected(
    session: &Session,
    user: &CurrentUser,
    form: UserSignupForm,
) -> Result<Response, AppError> {
    let page = SignupPage {
        base: TemplateData::new(session, user),
        form,
    };
    render(StatusCode::UNPROCESSABLE_ENTITY, &page)
}

pub async fn user_login(session: Session, user: CurrentUser) -> Result<Response, AppError> {
    let page = LoginPage {
        base: TemplateData::new(&session, &user),
        form: UserLoginForm::default(),
    };
    render(StatusCode::OK, &page)
}

pub async fn user_login_post(
    State(state): State<AppState>,
    session: Session,
    user: CurrentUser,
    PostForm(mut form): PostForm<UserLoginForm>,
) -> Result<Response, AppError> {
    if !form.validate() {
        return login_rejected(&session, &user, form);
    }

    let email = form.email.clone();
    let password = form.password.clone();
    let id = match state
        .run(move |db| db.authenticate_user(&email, &password))
        .await
    {
        Ok(id) => id,
        Err(AppError::Model(ModelError::InvalidCredentials)) => {
            form.validator
                .add_non_field_error("Email or password is incorrect");
            return login_rejected(&session, &user, form);
        }
        Err(e) => return Err(e),
    };

    session.renew_token();
    session.put(AUTH_USER_KEY, id);
    info!(user_id = id, "User logged in");

    Ok(Redirect::to("/snippet/create").into_response())
}

fn login_rejected(
    session: &Session,
    user: &CurrentUser,
    form: UserLoginForm,
) -> Result<Response, AppError> {
    let page = LoginPage {
        base: TemplateData::new(session, user),
        form,
    };
    render(StatusCode::UNPROCESSABLE_ENTITY, &page)
}

pub async fn user_logout_post(session: Session) -> Response {
    session.renew_token();
    session.remove(AUTH_USER_KEY);
    session.put(FLASH_KEY, "You've been logged out successfully!");

    Redirect::to("/").into_response()
}

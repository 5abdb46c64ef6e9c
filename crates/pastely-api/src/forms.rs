use std::any::type_name;

use axum::{
    body::Body,
    extract::{FromRequest, Request, rejection::FormRejection},
    http::{HeaderValue, Method, header},
    Form,
};
use pastely_types::models::{DEFAULT_EXPIRY_DAYS, SNIPPET_EXPIRY_DAYS};
use serde::{Deserialize, Deserializer, de, de::DeserializeOwned};

use crate::error::AppError;
use crate::validator::{EMAIL_RX, Validator, matches, max_chars, min_chars, not_blank, permitted};

/// Binds a url-encoded POST body onto `T` by field name.
///
/// Anything wrong with the submission itself is a client error. A target type
/// that cannot be bound even from an empty submission is a bug in this crate,
/// so the extractor panics and the panic layer answers with a 500.
pub struct PostForm<T>(pub T);

impl<T, S> FromRequest<S> for PostForm<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let rejection = match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => return Ok(PostForm(value)),
            Err(rejection) => rejection,
        };

        let undecodable = matches!(
            rejection,
            FormRejection::FailedToDeserializeForm(_) | FormRejection::FailedToDeserializeFormBody(_)
        );
        let message = rejection.body_text();
        if undecodable {
            assert_bindable::<T, S>(state).await;
        }
        Err(AppError::ClientInput(message))
    }
}

async fn assert_bindable<T, S>(state: &S)
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    let mut empty = Request::new(Body::empty());
    *empty.method_mut() = Method::POST;
    empty.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );

    let failure = match Form::<T>::from_request(empty, state).await {
        Ok(_) => return,
        Err(rejection) => rejection.body_text(),
    };
    panic!("{} cannot be used as a form target: {}", type_name::<T>(), failure);
}

/// An empty `expires=` counts as no choice, so validation reports it rather
/// than the decoder.
fn empty_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(de::Error::custom)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    #[serde(deserialize_with = "empty_as_zero")]
    pub expires: i64,
    #[serde(skip)]
    pub validator: Validator,
}

impl SnippetCreateForm {
    pub fn blank() -> Self {
        Self {
            expires: DEFAULT_EXPIRY_DAYS,
            ..Self::default()
        }
    }

    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.title), "title", "This field cannot be blank");
        v.check_field(
            max_chars(&self.title, 100),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(not_blank(&self.content), "content", "This field cannot be blank");
        v.check_field(
            permitted(&self.expires, &SNIPPET_EXPIRY_DAYS),
            "expires",
            "This field must equal 1, 7 or 365",
        );
        v.valid()
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.validator.field_error(field)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserSignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserSignupForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.name), "name", "This field cannot be blank");
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(not_blank(&self.password), "password", "This field cannot be blank");
        v.check_field(
            min_chars(&self.password, 8),
            "password",
            "This field must be at least 8 characters long",
        );
        v.valid()
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.validator.field_error(field)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserLoginForm {
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserLoginForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        v.check_field(not_blank(&self.password), "password", "This field cannot be blank");
        v.valid()
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.validator.field_error(field)
    }

    pub fn non_field_errors(&self) -> &[String] {
        self.validator.non_field_errors()
    }
}

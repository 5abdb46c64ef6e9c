//! End-to-end tests driving the full router: sessions, flash messages,
//! validation, signup, login and logout.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use pastely_api::{AppStateInner, SessionConfig, router};
use pastely_db::Database;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _dir: TempDir,
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("test.db"), 2).unwrap();

        let static_dir = dir.path().join("static");
        std::fs::create_dir_all(static_dir.join("css")).unwrap();
        std::fs::write(static_dir.join("css/main.css"), "body { margin: 0; }").unwrap();

        let state = AppStateInner::new(Arc::new(db), SessionConfig::default());
        let router = router(state, &static_dir);
        Self {
            _dir: dir,
            router,
            cookie: None,
        }
    }

    async fn send(&mut self, mut req: Request<Body>) -> Response<Body> {
        if let Some(cookie) = &self.cookie {
            req.headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        let resp = self.router.clone().oneshot(req).await.unwrap();

        for value in resp.headers().get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap();
            if pair.starts_with("session=") {
                self.cookie = Some(pair.to_string());
            }
        }
        resp
    }

    async fn get(&mut self, uri: &str) -> Response<Body> {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(req).await
    }

    async fn post_form(&mut self, uri: &str, body: &str) -> Response<Body> {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    async fn signup_and_login(&mut self) {
        let resp = self
            .post_form(
                "/user/signup",
                "name=Alice&email=alice%40example.com&password=pa55word!",
            )
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let resp = self
            .post_form("/user/login", "email=alice%40example.com&password=pa55word!")
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }
}

async fn body_text(resp: Response<Body>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(resp: &Response<Body>) -> Option<&str> {
    resp.headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap())
}

#[tokio::test]
async fn home_page_starts_empty() {
    let mut app = TestApp::new();

    let resp = app.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("There's nothing to see here... yet!"));
    assert!(body.contains("/user/signup"));
}

#[tokio::test]
async fn pages_carry_security_headers() {
    let mut app = TestApp::new();

    for uri in ["/", "/no/such/page"] {
        let resp = app.get(uri).await;
        let headers = resp.headers();
        assert_eq!(
            headers.get(header::CONTENT_SECURITY_POLICY).unwrap(),
            "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com"
        );
        assert_eq!(headers.get(header::REFERRER_POLICY).unwrap(), "origin-when-cross-origin");
        assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "deny");
        assert_eq!(headers.get(header::X_XSS_PROTECTION).unwrap(), "0");
    }
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let mut app = TestApp::new();

    let resp = app.get("/no/such/page").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(resp).await, "Not Found");
}

#[tokio::test]
async fn static_files_are_served() {
    let mut app = TestApp::new();

    let resp = app.get("/static/css/main.css").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "body { margin: 0; }");

    let resp = app.get("/static/css/missing.css").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_snippet_ids_are_not_found() {
    let mut app = TestApp::new();

    for uri in ["/snippet/view/0", "/snippet/view/-1", "/snippet/view/abc", "/snippet/view/1.5", "/snippet/view/1"] {
        let resp = app.get(uri).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn create_form_renders_with_a_year_selected() {
    let mut app = TestApp::new();

    let resp = app.get("/snippet/create").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains(r#"value="365" checked"#));
}

#[tokio::test]
async fn created_snippet_redirects_and_flashes_once() {
    let mut app = TestApp::new();

    let resp = app
        .post_form("/snippet/create", "title=Hi&content=Hello+there&expires=7")
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/snippet/view/1"));
    assert!(app.cookie.is_some());

    let resp = app.get("/snippet/view/1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("Hi"));
    assert!(body.contains("Hello there"));
    assert!(body.contains("Snippet successfully created!"));

    let body = body_text(app.get("/snippet/view/1").await).await;
    assert!(!body.contains("Snippet successfully created!"));

    let body = body_text(app.get("/").await).await;
    assert!(body.contains("/snippet/view/1"));
}

#[tokio::test]
async fn invalid_snippet_is_redisplayed() {
    let mut app = TestApp::new();

    let resp = app
        .post_form("/snippet/create", "title=&content=body&expires=365")
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(location(&resp).is_none());
    let body = body_text(resp).await;
    assert!(body.contains("This field cannot be blank"));
    assert!(body.contains("body"));

    let resp = app
        .post_form("/snippet/create", "title=Hi&content=body&expires=3")
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(resp).await.contains("This field must equal 1, 7 or 365"));

    assert_eq!(app.get("/snippet/view/1").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_expiry_is_a_validation_error() {
    let mut app = TestApp::new();

    let resp = app
        .post_form("/snippet/create", "title=Hi&content=body&expires=")
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(resp).await.contains("This field must equal 1, 7 or 365"));
}

#[tokio::test]
async fn malformed_submissions_are_bad_requests() {
    let mut app = TestApp::new();

    let resp = app
        .post_form("/snippet/create", "title=Hi&content=body&expires=soon")
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("POST")
        .uri("/snippet/create")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("title=Hi"))
        .unwrap();
    let resp = app.send(req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signup_then_duplicate_email() {
    let mut app = TestApp::new();

    let resp = app
        .post_form(
            "/user/signup",
            "name=Bob&email=bob%40example.com&password=correct-horse",
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/user/login"));

    let body = body_text(app.get("/user/login").await).await;
    assert!(body.contains("Your signup was successful. Please log in."));

    let resp = app
        .post_form(
            "/user/signup",
            "name=Bobby&email=bob%40example.com&password=another-pass",
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(resp).await.contains("This email address is already used"));
}

#[tokio::test]
async fn email_case_does_not_matter() {
    let mut app = TestApp::new();

    let resp = app
        .post_form(
            "/user/signup",
            "name=Bob&email=bob%40example.com&password=correct-horse",
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = app
        .post_form(
            "/user/signup",
            "name=Bob&email=BOB%40Example.com&password=correct-horse",
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(resp).await.contains("This email address is already used"));

    let resp = app
        .post_form("/user/login", "email=Bob%40EXAMPLE.com&password=correct-horse")
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/snippet/create"));
}

#[tokio::test]
async fn signup_validation_errors() {
    let mut app = TestApp::new();

    let resp = app
        .post_form("/user/signup", "name=&email=not-an-email&password=short")
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_text(resp).await;
    assert!(body.contains("This field cannot be blank"));
    assert!(body.contains("This field must be a valid email address"));
    assert!(body.contains("This field must be at least 8 characters long"));
    assert!(body.contains("not-an-email"));
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let mut app = TestApp::new();
    app.post_form(
        "/user/signup",
        "name=Alice&email=alice%40example.com&password=pa55word!",
    )
    .await;

    for form in [
        "email=alice%40example.com&password=wrong-password",
        "email=nobody%40example.com&password=pa55word!",
    ] {
        let resp = app.post_form("/user/login", form).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(resp).await.contains("Email or password is incorrect"));
    }
}

#[tokio::test]
async fn login_renews_session_and_logout_clears_it() {
    let mut app = TestApp::new();
    app.post_form(
        "/user/signup",
        "name=Alice&email=alice%40example.com&password=pa55word!",
    )
    .await;
    let before = app.cookie.clone();

    let resp = app
        .post_form("/user/login", "email=alice%40example.com&password=pa55word!")
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/snippet/create"));
    assert_ne!(app.cookie, before);

    let body = body_text(app.get("/").await).await;
    assert!(body.contains(r#"action="/user/logout""#));

    let resp = app.post_form("/user/logout", "").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/"));

    let body = body_text(app.get("/").await).await;
    assert!(body.contains("logged out successfully"));
    assert!(!body.contains(r#"action="/user/logout""#));
}

#[tokio::test]
async fn logout_requires_login() {
    let mut app = TestApp::new();

    let resp = app.post_form("/user/logout", "").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/user/login"));
}

#[tokio::test]
async fn protected_responses_are_not_cached() {
    let mut app = TestApp::new();
    app.signup_and_login().await;

    let resp = app.post_form("/user/logout", "").await;
    assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
}

#[tokio::test]
async fn unknown_session_cookie_is_ignored() {
    let mut app = TestApp::new();
    app.cookie = Some("session=not-a-real-token".into());

    let resp = app.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use chirpy_api::routes::router;
use chirpy_api::{AppState, AppStateInner, SessionIssuer};
use chirpy_db::Database;

const SECRET: &str = "integration-test-secret";

struct TestApp {
    _dir: TempDir,
    state: AppState,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("database.json")).unwrap();
        let assets = dir.path().join("html");
        std::fs::create_dir(&assets).unwrap();
        std::fs::write(assets.join("index.html"), "<h1>Welcome to Chirpy</h1>").unwrap();
        let sessions = SessionIssuer::new(SECRET).unwrap();
        let state = AppStateInner::new(db, sessions, assets);
        let router = router(state.clone());
        Self {
            _dir: dir,
            state,
            router,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send_raw(method, uri, bearer, body.map(|json| json.to_string()))
            .await
    }

    async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(text) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(text)),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    async fn signup(&self, email: &str, password: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/users",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Sign up and log in, returning (user id, access token, refresh token).
    async fn account(&self, email: &str) -> (u64, String, String) {
        self.signup(email, "pw").await;
        let (status, body) = self.login(email, "pw").await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (
            body["id"].as_u64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }
}

#[tokio::test]
async fn login_with_correct_password_returns_token_pair() {
    let app = TestApp::new();
    let created = app.signup("a@x.com", "pw").await;
    assert_eq!(created, json!({ "id": 1, "email": "a@x.com" }));

    let (status, body) = app.login("a@x.com", "pw").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["refresh_token"].as_str().unwrap().len(), 64);

    let token = body["token"].as_str().unwrap();
    assert_eq!(app.state.sessions.validate_access_token(token).unwrap(), 1);
}

#[tokio::test]
async fn login_with_wrong_password_issues_nothing() {
    let app = TestApp::new();
    app.signup("a@x.com", "pw").await;

    let (status, body) = app.login("a@x.com", "nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());
    assert!(body["error"].is_string());
    assert!(app.state.db.get_user(1).unwrap().session().is_none());

    let (status, _) = app.login("nobody@x.com", "pw").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let app = TestApp::new();
    app.signup("a@x.com", "pw").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/users",
            None,
            Some(json!({ "email": "a@x.com", "password": "other" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn user_listing_never_exposes_password() {
    let app = TestApp::new();
    app.signup("a@x.com", "pw").await;
    app.signup("b@x.com", "pw").await;

    let (status, body) = app.send(Method::GET, "/api/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{ "id": 1, "email": "a@x.com" }, { "id": 2, "email": "b@x.com" }])
    );

    let (status, body) = app.send(Method::GET, "/api/users/2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 2, "email": "b@x.com" }));

    let (status, _) = app.send(Method::GET, "/api/users/9", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send(Method::GET, "/api/users/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = TestApp::new();
    let (_, token, _) = app.account("a@x.com").await;

    let (status, body) = app
        .send_raw(Method::POST, "/api/users", None, Some("{ not json".into()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = app
        .send(Method::POST, "/api/chirps", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = app.send(Method::GET, "/api/chirps/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    assert!(app.state.db.list_chirps().unwrap().is_empty());
}

#[tokio::test]
async fn only_the_author_can_delete_a_chirp() {
    let app = TestApp::new();
    let (a_id, a_token, _) = app.account("a@x.com").await;
    let (_, b_token, _) = app.account("b@x.com").await;

    let (status, chirp) = app
        .send(
            Method::POST,
            "/api/chirps",
            Some(&a_token),
            Some(json!({ "body": "hello world" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(chirp["author_id"], a_id);
    let uri = format!("/api/chirps/{}", chirp["id"]);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&b_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&a_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&a_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn posting_requires_a_valid_access_token() {
    let app = TestApp::new();
    let (_, _, refresh_token) = app.account("a@x.com").await;
    let body = Some(json!({ "body": "hi" }));

    let (status, _) = app.send(Method::POST, "/api/chirps", None, body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::POST, "/api/chirps", Some(&refresh_token), body)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(app.state.db.list_chirps().unwrap().is_empty());
}

#[tokio::test]
async fn overlong_chirp_is_rejected() {
    let app = TestApp::new();
    let (_, token, _) = app.account("a@x.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/chirps",
            Some(&token),
            Some(json!({ "body": "a".repeat(141) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("too long"));

    let (_, chirps) = app.send(Method::GET, "/api/chirps", None, None).await;
    assert_eq!(chirps, json!([]));
}

#[tokio::test]
async fn chirps_are_masked_and_listed_in_order() {
    let app = TestApp::new();
    let (a_id, token, _) = app.account("a@x.com").await;

    for body in ["first kerfuffle", "second"] {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/chirps",
                Some(&token),
                Some(json!({ "body": body })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, chirps) = app.send(Method::GET, "/api/chirps", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        chirps,
        json!([
            { "id": 1, "body": "first ****", "author_id": a_id },
            { "id": 2, "body": "second", "author_id": a_id },
        ])
    );
}

#[tokio::test]
async fn refresh_then_revoke() {
    let app = TestApp::new();
    let (id, _, refresh_token) = app.account("a@x.com").await;

    let (status, body) = app
        .send(Method::POST, "/api/refresh", Some(&refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refresh_token"], refresh_token.as_str());
    let token = body["token"].as_str().unwrap();
    assert_eq!(app.state.sessions.validate_access_token(token).unwrap(), id);

    let (status, _) = app
        .send(Method::POST, "/api/revoke", Some(&refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(Method::POST, "/api/refresh", Some(&refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::POST, "/api/refresh", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_changes_credentials_and_keeps_session() {
    let app = TestApp::new();
    let (id, token, refresh_token) = app.account("a@x.com").await;

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/users",
            Some(&token),
            Some(json!({ "email": "new@x.com", "password": "new-pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": id, "email": "new@x.com" }));

    let (status, _) = app.login("a@x.com", "pw").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("new@x.com", "pw").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::POST, "/api/refresh", Some(&refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "new@x.com");

    let (status, _) = app.login("new@x.com", "new-pw").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_requires_authentication() {
    let app = TestApp::new();
    app.signup("a@x.com", "pw").await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/users",
            Some("garbage"),
            Some(json!({ "email": "b@x.com", "password": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.state.db.get_user(1).unwrap().email, "a@x.com");
}

#[tokio::test]
async fn admin_metrics_and_reset() {
    let app = TestApp::new();
    app.state.hits.record();
    app.state.hits.record();

    let (status, page) = app.send(Method::GET, "/admin/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.as_str().unwrap().contains("visited 2 times"));

    let (status, body) = app.send(Method::GET, "/api/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hits: 2");

    let (status, _) = app.send(Method::POST, "/admin/reset", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.state.hits.hits(), 0);

    let (_, body) = app.send(Method::GET, "/api/metrics", None, None).await;
    assert_eq!(body, "Hits: 0");
}

#[tokio::test]
async fn static_site_requests_are_counted() {
    let app = TestApp::new();

    for _ in 0..2 {
        let (status, page) = app.send(Method::GET, "/app/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(page.as_str().unwrap().contains("Welcome to Chirpy"));
    }

    let (_, page) = app.send(Method::GET, "/admin/metrics", None, None).await;
    assert!(page.as_str().unwrap().contains("visited 2 times"));

    app.send(Method::GET, "/api/healthz", None, None).await;
    assert_eq!(app.state.hits.hits(), 2);
}

#[tokio::test]
async fn healthz() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

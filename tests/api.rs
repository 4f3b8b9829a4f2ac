use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use defi_exchange_backend::{
    api::{
        extract::AppJson,
        router::{build_app, App, RouteTable, IEO_PREFIX, P2P_PREFIX, SUBSCRIBERS_PREFIX, USERS_PREFIX, WALLETS_PREFIX},
        server,
    },
    config::Config,
    error::AppError,
    middleware::{Session, SessionStore},
    users::routes::user_routes,
};

fn test_config(extra: &[(&str, &str)]) -> Config {
    let mut pairs = vec![
        ("MONGODB_URI", "mongodb://localhost:27017"),
        ("MONGODB_NAME", "exchange_test"),
        ("APP_ENV", "test"),
        ("SESSION_SECRET", "integration-test-secret"),
    ];
    pairs.extend_from_slice(extra);
    Config::from_lookup(|key| {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap()
}

/// Router answering `GET /ping` with `name`, counting hits.
fn stub_group(name: &'static str, hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/ping",
        get(move || {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                name
            }
        }),
    )
}

fn stub_table(hits: &Arc<AtomicUsize>) -> RouteTable {
    RouteTable::new()
        .mount("/api/users/", stub_group("users", hits.clone()))
        .unwrap()
        .mount("/api/wallets/", stub_group("wallets", hits.clone()))
        .unwrap()
        .mount(SUBSCRIBERS_PREFIX, stub_group("subscribers", hits.clone()))
        .unwrap()
        .mount(IEO_PREFIX, stub_group("ieo", hits.clone()))
        .unwrap()
        .mount(P2P_PREFIX, stub_group("p2p", hits.clone()))
        .unwrap()
}

async fn sign_in(session: Session) -> Result<&'static str, AppError> {
    session.insert("user_id", "64f1c0ffee")?;
    Ok("signed in")
}

async fn echo(AppJson(body): AppJson<Value>) -> Json<Value> {
    Json(body)
}

/// Real users routes plus test-only helpers under `/api/test`.
fn session_app(store: SessionStore, config: &Config) -> App {
    let helpers = Router::new()
        .route("/sign-in", post(sign_in))
        .route("/echo", post(echo));
    let table = RouteTable::new()
        .mount(USERS_PREFIX, user_routes())
        .unwrap()
        .mount("/api/test", helpers)
        .unwrap();
    build_app(config, table, store).unwrap()
}

async fn send(app: &App, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn body_text(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// `name=value` part of the first Set-Cookie header.
fn session_cookie(resp: &Response) -> Option<String> {
    resp.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

#[tokio::test]
async fn unknown_paths_return_endpoint_not_found() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = build_app(&test_config(&[]), stub_table(&hits), SessionStore::new()).unwrap();

    for uri in ["/", "/api", "/api/unknown", "/api/usersx/ping", "/health"] {
        let resp = send(&app, get_req(uri)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Endpoint Not Found");
    }

    let resp = send(
        &app,
        Request::builder()
            .method(Method::DELETE)
            .uri("/nowhere")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn each_prefix_reaches_its_group() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = build_app(&test_config(&[]), stub_table(&hits), SessionStore::new()).unwrap();

    let groups = [
        (USERS_PREFIX, "users"),
        (WALLETS_PREFIX, "wallets"),
        (SUBSCRIBERS_PREFIX, "subscribers"),
        (IEO_PREFIX, "ieo"),
        (P2P_PREFIX, "p2p"),
    ];
    for (i, (prefix, name)) in groups.iter().enumerate() {
        let resp = send(&app, get_req(&format!("{}/ping", prefix))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, *name);
        assert_eq!(hits.load(Ordering::SeqCst), i + 1);
    }
}

#[tokio::test]
async fn trailing_slashes_reach_the_group_root() {
    let hits = Arc::new(AtomicUsize::new(0));
    let ieo_hits = hits.clone();
    let subscriber_hits = hits.clone();
    let table = RouteTable::new()
        .mount(
            IEO_PREFIX,
            Router::new().route(
                "/",
                get(move || {
                    ieo_hits.fetch_add(1, Ordering::SeqCst);
                    async { "offerings" }
                }),
            ),
        )
        .unwrap()
        .mount(
            SUBSCRIBERS_PREFIX,
            Router::new().route(
                "/",
                post(move || {
                    subscriber_hits.fetch_add(1, Ordering::SeqCst);
                    async { "subscribed" }
                }),
            ),
        )
        .unwrap();
    let app = build_app(&test_config(&[]), table, SessionStore::new()).unwrap();

    for uri in ["/api/ieo", "/api/ieo/"] {
        let resp = send(&app, get_req(uri)).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        assert_eq!(body_text(resp).await, "offerings");
    }
    for uri in ["/api/subscribers", "/api/subscribers/"] {
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        assert_eq!(body_text(resp).await, "subscribed");
    }
    assert_eq!(hits.load(Ordering::SeqCst), 4);

    let resp = send(&app, get_req("/api/unknown/")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_check_is_served() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = build_app(&test_config(&[]), stub_table(&hits), SessionStore::new()).unwrap();

    let resp = send(&app, get_req("/api/health")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "success");
}

#[tokio::test]
async fn shadowing_the_health_check_is_rejected() {
    let table = RouteTable::new().mount("/api", Router::new()).unwrap();
    assert!(matches!(
        build_app(&test_config(&[]), table, SessionStore::new()),
        Err(AppError::ConfigError(_))
    ));
}

#[tokio::test]
async fn preflight_is_answered_for_any_path() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = build_app(&test_config(&[]), stub_table(&hits), SessionStore::new()).unwrap();

    for uri in ["/api/users/ping", "/api/does-not-exist"] {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);

        let headers = resp.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
            assert!(methods.contains(method), "{} missing from {}", method, methods);
        }
        let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_lowercase();
        for name in ["origin", "content-type", "accept", "authorization"] {
            assert!(allowed.contains(name), "{} missing from {}", name, allowed);
        }
    }
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disallowed_origin_gets_no_cors_grant() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = build_app(&test_config(&[]), stub_table(&hits), SessionStore::new()).unwrap();

    let req = Request::builder()
        .uri("/api/users/ping")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn configured_origins_are_honoured() {
    let config = test_config(&[("CORS_ALLOWED_ORIGINS", "https://exchange.example")]);
    let hits = Arc::new(AtomicUsize::new(0));
    let app = build_app(&config, stub_table(&hits), SessionStore::new()).unwrap();

    let req = Request::builder()
        .uri("/api/p2p/ping")
        .header(header::ORIGIN, "https://exchange.example")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://exchange.example"
    );
}

#[tokio::test]
async fn untouched_sessions_are_not_saved() {
    let config = test_config(&[]);
    let store = SessionStore::new();
    let app = session_app(store.clone(), &config);

    let resp = send(&app, get_req("/api/users/session")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    let body = body_json(resp).await;
    assert_eq!(body["active"], false);
    assert!(body["user_id"].is_null());
    assert!(store.is_empty());
}

#[tokio::test]
async fn session_cookie_round_trip_and_logout() {
    let config = test_config(&[]);
    let store = SessionStore::new();
    let app = session_app(store.clone(), &config);

    let sign_in = Request::builder()
        .method(Method::POST)
        .uri("/api/test/sign-in")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, sign_in).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("user_sid="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=86400"));
    let cookie = session_cookie(&resp).unwrap();
    assert_eq!(store.len(), 1);

    let req = Request::builder()
        .uri("/api/users/session")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    let body = body_json(resp).await;
    assert_eq!(body["active"], true);
    assert_eq!(body["user_id"], "64f1c0ffee");

    let logout = Request::builder()
        .method(Method::DELETE)
        .uri("/api/users/session")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, logout).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let cleared = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.starts_with("user_sid="));
    assert!(store.is_empty());

    // The old cookie no longer resolves to a session
    let req = Request::builder()
        .uri("/api/users/session")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    assert_eq!(body_json(send(&app, req).await).await["active"], false);
}

#[tokio::test]
async fn tampered_cookies_are_ignored() {
    let config = test_config(&[]);
    let store = SessionStore::new();
    let app = session_app(store.clone(), &config);

    let resp = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/test/sign-in")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    let cookie = session_cookie(&resp).unwrap();
    let forged = format!("{}x", cookie);

    let req = Request::builder()
        .uri("/api/users/session")
        .header(header::COOKIE, forged)
        .body(Body::empty())
        .unwrap();
    assert_eq!(body_json(send(&app, req).await).await["active"], false);

    // A cookie signed with another secret is rejected too
    let other = session_app(store, &test_config(&[("SESSION_SECRET", "another-secret")]));
    let req = Request::builder()
        .uri("/api/users/session")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    assert_eq!(body_json(send(&other, req).await).await["active"], false);
}

#[tokio::test]
async fn logout_without_session_is_unauthorized() {
    let config = test_config(&[]);
    let app = session_app(SessionStore::new(), &config);

    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/api/users/session")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["status"], "error");
}

#[tokio::test]
async fn malformed_and_oversized_json_use_the_error_shape() {
    let config = test_config(&[("JSON_BODY_LIMIT", "64")]);
    let app = session_app(SessionStore::new(), &config);

    let post_json = |body: String| {
        Request::builder()
            .method(Method::POST)
            .uri("/api/test/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    };

    let resp = send(&app, post_json(r#"{"ok":true}"#.into())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["ok"], true);

    let resp = send(&app, post_json("{not json".into())).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["status"], "error");

    let big = format!(r#"{{"data":"{}"}}"#, "x".repeat(200));
    let resp = send(&app, post_json(big)).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(resp).await["status"], "error");
}

#[tokio::test]
async fn server_binds_and_serves_until_shutdown() {
    let config = test_config(&[("PORT", "0"), ("HOST", "127.0.0.1")]);
    let hits = Arc::new(AtomicUsize::new(0));
    let app = build_app(&config, stub_table(&hits), SessionStore::new()).unwrap();

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(server::serve(listener, app, async move {
        let _ = stop_rx.await;
    }));

    let resp = reqwest::get(format!("http://{}/api/wallets/ping", addr)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "wallets");

    let resp = reqwest::get(format!("http://{}/missing", addr)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Endpoint Not Found");

    stop_tx.send(()).unwrap();
    tokio_test::assert_ok!(running.await.unwrap());
}

use super::*;
use crate::users::InMemoryUserRepository;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;

fn app() -> Router {
    let users = UserService::new(Arc::new(InMemoryUserRepository::default()), "test-salt");
    build_app(AppState {
        users: Arc::new(users),
    })
}

fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(req).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn register_body() -> serde_json::Value {
    serde_json::json!({
        "email": "kim@example.com",
        "username": "kim",
        "password": "pw1"
    })
}

#[test]
fn api_error_codes_map_to_statuses() {
    for (code, wire, status) in [
        (ErrorCode::NotFound, "not_found", StatusCode::NOT_FOUND),
        (ErrorCode::Conflict, "conflict", StatusCode::CONFLICT),
        (ErrorCode::Unauthorized, "unauthorized", StatusCode::UNAUTHORIZED),
        (ErrorCode::ValidationError, "validation_error", StatusCode::BAD_REQUEST),
        (ErrorCode::InternalError, "internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ] {
        assert_eq!(serde_json::to_value(code).unwrap(), wire);
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), status, "code {wire}");
    }
}

#[test]
fn user_errors_map_to_codes() {
    assert_eq!(ErrorCode::from(&UserError::NotFound), ErrorCode::NotFound);
    assert_eq!(ErrorCode::from(&UserError::AlreadyExists), ErrorCode::Conflict);
    assert_eq!(
        ErrorCode::from(&UserError::InvalidCredentials),
        ErrorCode::Unauthorized
    );
    assert_eq!(
        ErrorCode::from(&UserError::Validation("bad".to_string())),
        ErrorCode::ValidationError
    );
}

#[tokio::test]
async fn health_returns_envelope_with_request_id() {
    let app = app();
    let req = Request::builder()
        .uri("/api/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .expect("request");

    let response = app.clone().oneshot(req).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-42")
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"], "req-42");
    assert_eq!(json["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unusable_request_id_is_replaced() {
    let app = app();
    let req = Request::builder()
        .uri("/api/health")
        .header("x-request-id", "has space")
        .body(Body::empty())
        .expect("request");

    let response = app.clone().oneshot(req).await.expect("response");
    let echoed = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("request id header");
    assert_ne!(echoed, "has space");
    assert!(uuid::Uuid::parse_str(&echoed).is_ok());
}

#[tokio::test]
async fn register_returns_201_and_hides_password() {
    let app = app();
    let (status, json) = send(
        &app,
        json_request(Method::POST, "/api/user/register", &register_body()),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["email"], "kim@example.com");
    assert!(json["data"].get("password").is_none());
    assert!(json["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_register_is_conflict() {
    let app = app();
    send(&app, json_request(Method::POST, "/api/user/register", &register_body())).await;
    let (status, json) =
        send(&app, json_request(Method::POST, "/api/user/register", &register_body())).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "conflict");
}

#[tokio::test]
async fn login_statuses() {
    let app = app();
    let login = |password: &str| {
        json_request(
            Method::POST,
            "/api/user/login",
            &serde_json::json!({"email": "kim@example.com", "password": password}),
        )
    };

    let (status, _) = send(&app, login("pw1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, json_request(Method::POST, "/api/user/register", &register_body())).await;

    let (status, json) = send(&app, login("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");

    let (status, json) = send(&app, login("pw1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["username"], "kim");
}

#[tokio::test]
async fn invalid_registration_is_bad_request() {
    let app = app();
    let (status, json) = send(
        &app,
        json_request(
            Method::POST,
            "/api/user/register",
            &serde_json::json!({"email": "nope", "username": "kim", "password": "pw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn update_password_then_delete() {
    let app = app();
    send(&app, json_request(Method::POST, "/api/user/register", &register_body())).await;

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/user/update-password",
            &serde_json::json!({"email": "kim@example.com", "new_password": "pw2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/user/login",
            &serde_json::json!({"email": "kim@example.com", "password": "pw2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let delete = || {
        json_request(
            Method::DELETE,
            "/api/user/delete",
            &serde_json::json!({"email": "kim@example.com"}),
        )
    };
    let (status, json) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["email"], "kim@example.com");

    let (status, _) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_password_for_unknown_user_is_not_found() {
    let app = app();
    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/user/update-password",
            &serde_json::json!({"email": "ghost@example.com", "new_password": "pw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

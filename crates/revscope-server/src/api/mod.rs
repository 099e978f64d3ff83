mod users;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};
use crate::users::{UserError, UserService};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
}

/// Success envelope: `{ "data": …, "meta": { "request_id", "timestamp" } }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Error envelope: `{ "error": { "code", "message" }, "meta": … }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Machine-readable error code, serialized in `snake_case`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Conflict,
    Unauthorized,
    ValidationError,
    InternalError,
}

impl ErrorCode {
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<&UserError> for ErrorCode {
    fn from(error: &UserError) -> Self {
        match error {
            UserError::NotFound => ErrorCode::NotFound,
            UserError::AlreadyExists => ErrorCode::Conflict,
            UserError::InvalidCredentials => ErrorCode::Unauthorized,
            UserError::Validation(_) => ErrorCode::ValidationError,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    version: &'static str,
}

fn meta(request_id: String) -> ResponseMeta {
    ResponseMeta {
        request_id,
        timestamp: Utc::now(),
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Self {
        Self {
            data,
            meta: meta(request_id),
        }
    }
}

impl ApiError {
    pub fn new(request_id: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
            },
            meta: meta(request_id.into()),
        }
    }

    /// Wraps a service error; the message is the error's display text.
    pub(super) fn from_user_error(request_id: String, error: &UserError) -> Self {
        let code = ErrorCode::from(error);
        if code == ErrorCode::Unauthorized {
            tracing::info!(request_id = %request_id, "rejected login");
        }
        Self::new(request_id, code, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.error.code.status(), Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(users::login))
        .route("/register", post(users::register))
        .route("/delete", delete(users::delete_user))
        .route("/update-password", put(users::update_password))
}

/// Builds the HTTP app: health plus the `/api/user` account routes.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .nest("/api/user", user_routes())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(build_cors()),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse::new(
        req_id.0,
        HealthData {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

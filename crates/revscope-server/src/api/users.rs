//! Account handlers under `/api/user`.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;

use crate::middleware::RequestId;
use crate::users::UserView;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct DeleteRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct UpdatePasswordRequest {
    pub email: String,
    pub new_password: String,
}

type UserResponse = Json<ApiResponse<UserView>>;

/// POST /api/user/login
pub(in crate::api) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<UserResponse, ApiError> {
    let user = state
        .users
        .login(&body.email, &body.password)
        .await
        .map_err(|e| ApiError::from_user_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, user)))
}

/// POST /api/user/register (201 on success)
pub(in crate::api) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, UserResponse), ApiError> {
    let user = state
        .users
        .register(&body.email, &body.username, &body.password)
        .await
        .map_err(|e| ApiError::from_user_error(req_id.0.clone(), &e))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(req_id.0, user))))
}

/// DELETE /api/user/delete
pub(in crate::api) async fn delete_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<DeleteRequest>,
) -> Result<UserResponse, ApiError> {
    let user = state
        .users
        .delete(&body.email)
        .await
        .map_err(|e| ApiError::from_user_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, user)))
}

/// PUT /api/user/update-password
pub(in crate::api) async fn update_password(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<UserResponse, ApiError> {
    let user = state
        .users
        .update_password(&body.email, &body.new_password)
        .await
        .map_err(|e| ApiError::from_user_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(req_id.0, user)))
}

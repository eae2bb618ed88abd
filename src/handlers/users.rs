use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::{LoginRequestDto, LoginResponseDto, RegistrationRequestDto, UserDto};
use crate::services::ServiceError;
use crate::state::AppState;

pub const LOGIN_FAILED: &str = "Username or password is incorrect";
pub const USERNAME_TAKEN: &str = "Username already exists";

/// POST /api/v1/UsersAuth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequestDto>, JsonRejection>,
) -> ApiResult<LoginResponseDto> {
    let Json(request) = payload?;

    match state.users.login(request).await? {
        Some(response) => Ok(ApiResponse::success(response)),
        None => Err(ApiError::bad_request(LOGIN_FAILED)),
    }
}

/// POST /api/v1/UsersAuth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationRequestDto>, JsonRejection>,
) -> ApiResult<UserDto> {
    let Json(request) = payload?;
    request.validate()?;

    if !state.users.is_unique_user(&request.user_name).await? {
        return Err(ApiError::bad_request(USERNAME_TAKEN));
    }

    // a concurrent registration can still win the race to the unique index
    match state.users.register(request).await {
        Ok(user) => Ok(ApiResponse::success(user)),
        Err(ServiceError::Database(DatabaseError::Conflict(_))) => Err(ApiError::bad_request(USERNAME_TAKEN)),
        Err(e) => Err(e.into()),
    }
}

/// GET /api/v1/UsersAuth/whoami
pub async fn whoami(user: AuthUser) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(user))
}

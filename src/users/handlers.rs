use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{handlers::is_valid_email, password::hash_password},
    error::ApiError,
    state::AppState,
    users::{
        dto::{CreateUserRequest, UpdateUserRequest, UserResponse},
        repo::NewUser,
    },
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/users/:id", get(get_user))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
        .layer(DefaultBodyLimit::max(64 * 1024))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(mut payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("invalid email".into()));
    }

    let password_hash = match payload.password.as_deref() {
        Some(plain) => hash_password(plain)?,
        None => String::new(), // no password: the account cannot log in
    };

    // The username column is unique and non-null; fall back to the email
    // when the payload has none.
    let username = payload.username.unwrap_or_else(|| payload.email.clone());

    let user = state
        .users
        .create(NewUser {
            username,
            name: payload.name,
            email: payload.email,
            password_hash,
            salary: payload.salary,
        })
        .await?;

    info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    match state.users.find_by_id(id).await? {
        Some(user) => Ok(Json(user.into())),
        None => Err(ApiError::NotFound("user not found")),
    }
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(mut payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("invalid email".into()));
    }

    let affected = state.users.update(id, &payload).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("user not found"));
    }

    info!(user_id = %id, "user updated");
    Ok(StatusCode::OK)
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let affected = state.users.delete(id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("user not found"));
    }

    info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

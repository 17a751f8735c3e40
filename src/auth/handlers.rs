use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest},
        extractors::{require_auth, AuthUser},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn profile_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/profile", get(profile))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(mut payload) = payload?;
    payload.validate().map_err(|msg| {
        warn!(reason = msg, "invalid register request");
        ApiError::validation(msg)
    })?;

    let user = state
        .auth
        .register(&payload.email, &payload.password, &payload.name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(mut payload) = payload?;
    payload.validate().map_err(|msg| {
        warn!(reason = msg, "invalid login request");
        ApiError::validation(msg)
    })?;

    let user = state.auth.login(&payload.email, &payload.password).await?;

    Ok(Json(AuthResponse {
        message: "Login successful",
        user,
    }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.auth.profile(user.user_id).await?;
    Ok(Json(ProfileResponse { user }))
}

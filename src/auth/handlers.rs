use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{error::ApiError, state::AppState};

use super::{
    dto::{
        AdminResetPasswordRequest, AdminResetPasswordResponse, AuthResponse,
        ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    },
    jwt::{AuthClaims, JwtKeys},
    services,
    user::PublicUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/admin/reset-password", post(admin_reset_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let (token, user) = services::register(
        state.users.as_ref(),
        &keys,
        &payload.name,
        &payload.email,
        &payload.password,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".into(),
            token,
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let (token, user) = services::login(
        state.users.as_ref(),
        &keys,
        &payload.email,
        &payload.password,
    )
    .await?;
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user,
    }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<PublicUser>, ApiError> {
    let user = services::current_user(state.users.as_ref(), &claims).await?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = services::request_password_reset(
        state.users.as_ref(),
        state.notifier.as_ref(),
        &state.config,
        &payload.email,
    )
    .await?;
    Ok(Json(MessageResponse { message }))
}

#[instrument(skip(state, payload))]
pub async fn admin_reset_password(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Json(payload): Json<AdminResetPasswordRequest>,
) -> Result<Json<AdminResetPasswordResponse>, ApiError> {
    let (message, new_password) = services::admin_complete_password_reset(
        state.users.as_ref(),
        state.notifier.as_ref(),
        &claims,
        &payload.token,
        &payload.email,
        &payload.new_password,
    )
    .await?;
    Ok(Json(AdminResetPasswordResponse {
        message,
        new_password,
    }))
}

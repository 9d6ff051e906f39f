use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        jwt::{AuthClaims, Claims},
        password::hash_password,
        services::is_valid_email,
        store::CredentialStore,
        user::{NewUser, PublicUser, Role},
    },
    error::ApiError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", delete(delete_user))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = list_accounts(state.users.as_ref(), &claims).await?;
    Ok(Json(users))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreatedUserResponse>), ApiError> {
    let user = create_account(state.users.as_ref(), &claims, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            message: "User created successfully".into(),
            user,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    delete_account(state.users.as_ref(), &claims, id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully".into(),
    }))
}

pub(crate) async fn list_accounts(
    store: &dyn CredentialStore,
    acting: &Claims,
) -> Result<Vec<PublicUser>, ApiError> {
    acting.authorize(&[Role::Admin])?;
    let users = store.list().await?;
    Ok(users.iter().map(PublicUser::from).collect())
}

/// Admin-created accounts carry an elevated role; Staff accounts only come
/// from self-registration.
pub(crate) async fn create_account(
    store: &dyn CredentialStore,
    acting: &Claims,
    req: CreateUserRequest,
) -> Result<PublicUser, ApiError> {
    acting.authorize(&[Role::Admin])?;

    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("all fields are required".into()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("invalid email".into()));
    }
    if !matches!(req.role, Role::Admin | Role::InventoryManager) {
        return Err(ApiError::Validation(
            "invalid role, only Admin and Inventory Manager accounts can be created".into(),
        ));
    }
    if store.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let user = store
        .create(NewUser {
            name: name.to_string(),
            email,
            password_hash: hash_password(&req.password)?,
            role: req.role,
        })
        .await?;

    info!(user_id = %user.id, role = user.role.as_str(), admin = %acting.sub, "account created");
    Ok(PublicUser::from(&user))
}

pub(crate) async fn delete_account(
    store: &dyn CredentialStore,
    acting: &Claims,
    id: Uuid,
) -> Result<(), ApiError> {
    acting.authorize(&[Role::Admin])?;

    // Refused before the store is touched.
    if id == acting.sub {
        return Err(ApiError::Forbidden("you cannot delete your own account"));
    }

    store.delete(id).await?;
    info!(user_id = %id, admin = %acting.sub, "account deleted");
    Ok(())
}

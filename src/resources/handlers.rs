use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    auth::{jwt::AuthClaims, user::Role},
    error::ApiError,
    state::AppState,
};

use super::{
    dto::{CreateResourceRequest, UpdateResourceRequest},
    repo::{self, Resource},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/resources", get(list_resources).post(create_resource))
        .route("/resources/low-stock", get(low_stock))
        .route(
            "/resources/:id",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[instrument(skip(state))]
pub async fn list_resources(
    State(state): State<AppState>,
    AuthClaims(_claims): AuthClaims,
) -> Result<Json<Vec<Resource>>, ApiError> {
    Ok(Json(repo::list(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn low_stock(
    State(state): State<AppState>,
    AuthClaims(_claims): AuthClaims,
) -> Result<Json<Vec<Resource>>, ApiError> {
    Ok(Json(repo::low_stock(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_resource(
    State(state): State<AppState>,
    AuthClaims(_claims): AuthClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<Resource>, ApiError> {
    let resource = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("resource"))?;
    Ok(Json(resource))
}

#[instrument(skip(state, payload))]
pub async fn create_resource(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Json(payload): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    claims.authorize(&[Role::Admin, Role::InventoryManager])?;
    validate_fields(&payload.name, &payload.category, &payload.location)?;
    validate_counts(payload.quantity, payload.minimum_threshold)?;

    let resource = repo::create(&state.db, &payload).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

#[instrument(skip(state, payload))]
pub async fn update_resource(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateResourceRequest>,
) -> Result<Json<Resource>, ApiError> {
    claims.authorize(&[Role::Admin, Role::InventoryManager])?;
    validate_counts(
        payload.quantity.unwrap_or(0),
        payload.minimum_threshold.unwrap_or(0),
    )?;

    let before = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("resource"))?;
    let after = repo::update(&state.db, id, &payload)
        .await?
        .ok_or(ApiError::NotFound("resource"))?;

    if crossed_below_threshold(&before, &after) {
        let delivered = state
            .notifier
            .notify(
                &state.config.admin_email,
                "Low stock alert",
                &format!(
                    "Resource: {}\nCurrent quantity: {}\nMinimum threshold: {}\nLocation: {}",
                    after.name, after.quantity, after.minimum_threshold, after.location
                ),
            )
            .await;
        debug!(resource_id = %after.id, delivered, "low stock alert emitted");
    }

    Ok(Json(after))
}

#[instrument(skip(state))]
pub async fn delete_resource(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    claims.authorize(&[Role::Admin])?;
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("resource"));
    }
    Ok(Json(MessageResponse {
        message: "Resource deleted successfully".into(),
    }))
}

fn validate_fields(name: &str, category: &str, location: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || category.trim().is_empty() || location.trim().is_empty() {
        return Err(ApiError::Validation("all fields are required".into()));
    }
    Ok(())
}

fn validate_counts(quantity: i32, minimum_threshold: i32) -> Result<(), ApiError> {
    if quantity < 0 || minimum_threshold < 0 {
        return Err(ApiError::Validation(
            "quantity and minimum threshold cannot be negative".into(),
        ));
    }
    Ok(())
}

/// The alert fires only on the transition into low stock, not on every
/// update while already below the threshold.
pub(crate) fn crossed_below_threshold(before: &Resource, after: &Resource) -> bool {
    before.quantity >= before.minimum_threshold && after.quantity < after.minimum_threshold
}

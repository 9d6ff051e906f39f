use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    auth::{jwt::AuthClaims, user::Role},
    error::ApiError,
    state::AppState,
};

use super::{
    dto::{CreateIssueRequest, IssueView, UpdateIssueRequest},
    repo::{self, IssueStatus},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/maintenance", get(list_issues).post(create_issue))
        .route("/maintenance/status/:status", get(list_issues_by_status))
        .route("/maintenance/:id", get(get_issue).put(update_issue))
}

#[instrument(skip(state))]
pub async fn list_issues(
    State(state): State<AppState>,
    AuthClaims(_claims): AuthClaims,
) -> Result<Json<Vec<IssueView>>, ApiError> {
    let issues = repo::list(&state.db).await?;
    Ok(Json(issues.into_iter().map(IssueView::from).collect()))
}

#[instrument(skip(state))]
pub async fn list_issues_by_status(
    State(state): State<AppState>,
    AuthClaims(_claims): AuthClaims,
    Path(status): Path<IssueStatus>,
) -> Result<Json<Vec<IssueView>>, ApiError> {
    let issues = repo::list_by_status(&state.db, status).await?;
    Ok(Json(issues.into_iter().map(IssueView::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_issue(
    State(state): State<AppState>,
    AuthClaims(_claims): AuthClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<IssueView>, ApiError> {
    let issue = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("issue"))?;
    Ok(Json(IssueView::from(issue)))
}

/// Any authenticated user can report; the reporter is taken from the claims,
/// never from the body.
#[instrument(skip(state, payload))]
pub async fn create_issue(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Json(payload): Json<CreateIssueRequest>,
) -> Result<(StatusCode, Json<IssueView>), ApiError> {
    if payload.title.trim().is_empty()
        || payload.description.trim().is_empty()
        || payload.location.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "title, description and location are required".into(),
        ));
    }

    let issue = repo::create(&state.db, claims.sub, &payload).await?;

    let delivered = state
        .notifier
        .notify(
            &state.config.admin_email,
            "New maintenance issue",
            &format!(
                "Title: {}\nLocation: {}\nPriority: {}\nStatus: {}\n\n{}",
                issue.title,
                issue.location,
                issue.priority.as_str(),
                issue.status.as_str(),
                issue.description
            ),
        )
        .await;
    debug!(issue_id = %issue.id, delivered, "new issue alert emitted");

    Ok((StatusCode::CREATED, Json(IssueView::from(issue))))
}

#[instrument(skip(state, payload))]
pub async fn update_issue(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIssueRequest>,
) -> Result<Json<IssueView>, ApiError> {
    claims.authorize(&[Role::Admin, Role::InventoryManager])?;

    let issue = repo::update(&state.db, id, &payload)
        .await?
        .ok_or(ApiError::NotFound("issue"))?;
    Ok(Json(IssueView::from(issue)))
}

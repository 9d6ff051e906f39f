use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sqlx::FromRow;
use tracing::instrument;

use crate::{
    auth::{jwt::AuthClaims, user::Role},
    error::ApiError,
    maintenance::{dto::IssueView, repo as issues},
    resources::repo::{self as resources, Resource},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/admin", get(admin_dashboard))
        .route("/dashboard/inventory", get(inventory_dashboard))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub low_stock_count: usize,
    pub low_stock: Vec<Resource>,
    pub open_issues_count: usize,
    pub open_issues: Vec<IssueView>,
    pub in_progress_issues_count: usize,
    pub total_resources: i64,
    pub total_issues: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CategoryStat {
    pub category: String,
    pub count: i64,
    pub total_quantity: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDashboard {
    pub total_resources: usize,
    pub low_stock_count: usize,
    pub resources: Vec<Resource>,
    pub category_stats: Vec<CategoryStat>,
}

#[instrument(skip(state))]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<AdminDashboard>, ApiError> {
    claims.authorize(&[Role::Admin])?;

    let low_stock = resources::low_stock(&state.db).await?;
    let open = issues::list_by_status(&state.db, issues::IssueStatus::Pending).await?;
    let in_progress = issues::list_by_status(&state.db, issues::IssueStatus::InProgress).await?;

    let total_resources: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resources")
        .fetch_one(&state.db)
        .await?;
    let total_issues: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM maintenance_issues")
        .fetch_one(&state.db)
        .await?;

    Ok(Json(AdminDashboard {
        low_stock_count: low_stock.len(),
        low_stock: low_stock.into_iter().take(5).collect(),
        open_issues_count: open.len(),
        open_issues: open.into_iter().take(5).map(IssueView::from).collect(),
        in_progress_issues_count: in_progress.len(),
        total_resources,
        total_issues,
    }))
}

#[instrument(skip(state))]
pub async fn inventory_dashboard(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
) -> Result<Json<InventoryDashboard>, ApiError> {
    claims.authorize(&[Role::Admin, Role::InventoryManager])?;

    let all = resources::list(&state.db).await?;
    let low_stock = resources::low_stock(&state.db).await?;

    let category_stats = sqlx::query_as::<_, CategoryStat>(
        r#"
        SELECT category, COUNT(*) AS count, SUM(quantity) AS total_quantity
        FROM resources
        GROUP BY category
        ORDER BY category
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(InventoryDashboard {
        total_resources: all.len(),
        low_stock_count: low_stock.len(),
        resources: all,
        category_stats,
    }))
}

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateIssueRequest, UpdateIssueRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_status")]
pub enum IssueStatus {
    #[sqlx(rename = "Pending")]
    Pending,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    #[sqlx(rename = "Fixed")]
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_priority")]
pub enum IssuePriority {
    #[sqlx(rename = "Low")]
    Low,
    #[sqlx(rename = "Medium")]
    Medium,
    #[sqlx(rename = "High")]
    High,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Pending => "Pending",
            IssueStatus::InProgress => "In Progress",
            IssueStatus::Fixed => "Fixed",
        }
    }
}

impl IssuePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssuePriority::Low => "Low",
            IssuePriority::Medium => "Medium",
            IssuePriority::High => "High",
        }
    }
}

/// Issue row with the reporter/assignee names joined in. Names are optional:
/// accounts can be deleted out from under their issues.
#[derive(Debug, Clone, FromRow)]
pub struct Issue {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub reporter_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub reporter_name: Option<String>,
    pub assignee_name: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const SELECT_ISSUE: &str = r#"
    SELECT m.id, m.title, m.description, m.location, m.status, m.priority,
           m.reporter_id, m.assignee_id, m.created_at, m.updated_at,
           r.name AS reporter_name, a.name AS assignee_name
    FROM maintenance_issues m
    LEFT JOIN users r ON r.id = m.reporter_id
    LEFT JOIN users a ON a.id = m.assignee_id
"#;

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Issue>> {
    let sql = format!("{SELECT_ISSUE} ORDER BY m.created_at DESC");
    let rows = sqlx::query_as::<_, Issue>(&sql).fetch_all(db).await?;
    Ok(rows)
}

pub async fn list_by_status(db: &PgPool, status: IssueStatus) -> anyhow::Result<Vec<Issue>> {
    let sql = format!("{SELECT_ISSUE} WHERE m.status = $1 ORDER BY m.created_at DESC");
    let rows = sqlx::query_as::<_, Issue>(&sql)
        .bind(status)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Issue>> {
    let sql = format!("{SELECT_ISSUE} WHERE m.id = $1");
    let row = sqlx::query_as::<_, Issue>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn create(
    db: &PgPool,
    reporter_id: Uuid,
    req: &CreateIssueRequest,
) -> anyhow::Result<Issue> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO maintenance_issues (id, title, description, location, priority, reporter_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.location)
    .bind(req.priority.unwrap_or(IssuePriority::Medium))
    .bind(reporter_id)
    .fetch_one(db)
    .await?;

    get(db, id).await?.context("issue vanished after insert")
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    req: &UpdateIssueRequest,
) -> anyhow::Result<Option<Issue>> {
    let updated: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE maintenance_issues
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            location = COALESCE($4, location),
            status = COALESCE($5, status),
            priority = COALESCE($6, priority),
            assignee_id = COALESCE($7, assignee_id),
            updated_at = now()
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(req.title.as_deref())
    .bind(req.description.as_deref())
    .bind(req.location.as_deref())
    .bind(req.status)
    .bind(req.priority)
    .bind(req.assignee_id)
    .fetch_optional(db)
    .await?;

    match updated {
        Some(id) => get(db, id).await,
        None => Ok(None),
    }
}

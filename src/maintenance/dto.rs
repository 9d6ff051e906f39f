use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{Issue, IssuePriority, IssueStatus};

#[derive(Debug, Deserialize)]
pub struct CreateIssueRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(default)]
    pub priority: Option<IssuePriority>,
}

/// Partial update. The reporter is fixed at creation and not updatable.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateIssueRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct IssueView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub reporter_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub reporter_name: String,
    pub assignee_name: Option<String>,
    #[serde(serialize_with = "time::serde::rfc3339::serialize")]
    pub created_at: OffsetDateTime,
    #[serde(serialize_with = "time::serde::rfc3339::serialize")]
    pub updated_at: OffsetDateTime,
}

impl From<Issue> for IssueView {
    fn from(issue: Issue) -> Self {
        Self {
            id: issue.id,
            title: issue.title,
            description: issue.description,
            location: issue.location,
            status: issue.status,
            priority: issue.priority,
            reporter_id: issue.reporter_id,
            assignee_id: issue.assignee_id,
            reporter_name: issue.reporter_name.unwrap_or_else(|| "Unknown".into()),
            assignee_name: issue.assignee_name,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_reporters_render_as_unknown() {
        let issue = Issue {
            id: Uuid::new_v4(),
            title: "Broken projector".into(),
            description: "No signal on input 2".into(),
            location: "Classroom".into(),
            status: IssueStatus::Pending,
            priority: IssuePriority::High,
            reporter_id: Uuid::new_v4(),
            assignee_id: None,
            reporter_name: None,
            assignee_name: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let view = IssueView::from(issue);
        assert_eq!(view.reporter_name, "Unknown");
        assert_eq!(view.assignee_name, None);
    }

    #[test]
    fn create_request_defaults_priority() {
        let req: CreateIssueRequest = serde_json::from_str(
            r#"{"title":"Leak","description":"Dripping pipe","location":"Lab"}"#,
        )
        .unwrap();
        assert!(req.priority.is_none());

        let req: CreateIssueRequest = serde_json::from_str(
            r#"{"title":"Leak","description":"Dripping pipe","location":"Lab","priority":"High"}"#,
        )
        .unwrap();
        assert_eq!(req.priority, Some(IssuePriority::High));
    }
}

//! Domain records shared by the storage layer, the builders and the services.
//!
//! Records are what storage hands back (joined where a foreign key is always
//! needed, e.g. an assignment carries its member summary). Request types are
//! what callers hand in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::Role;

labelled_enum! {
    /// Delivery stage of a project.
    ProjectStatus {
        Planning => "PLANNING",
        Discovery => "DISCOVERY",
        InDevelopment => "IN_DEVELOPMENT",
        Testing => "TESTING",
        Deployed => "DEPLOYED",
        OnHold => "ON_HOLD",
    }
}

labelled_enum! {
    /// Task status. The declaration order is the board's bucket order.
    TaskStatus {
        Todo => "TODO",
        InProgress => "IN_PROGRESS",
        Review => "REVIEW",
        Blocked => "BLOCKED",
        Done => "DONE",
    }
}

labelled_enum! {
    TaskPriority {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Critical => "CRITICAL",
    }
}

labelled_enum! {
    TimelineEventType {
        Discovery => "DISCOVERY",
        Planning => "PLANNING",
        Development => "DEVELOPMENT",
        Qa => "QA",
        Deployment => "DEPLOYMENT",
        Support => "SUPPORT",
        Note => "NOTE",
    }
}

labelled_enum! {
    InquiryStatus {
        New => "NEW",
        InDiscussion => "IN_DISCUSSION",
        Quoted => "QUOTED",
        Won => "WON",
        Lost => "LOST",
        Closed => "CLOSED",
    }
}

labelled_enum! {
    NotificationType {
        ProjectAssignment => "PROJECT_ASSIGNMENT",
        TaskAssigned => "TASK_ASSIGNED",
        TaskUpdated => "TASK_UPDATED",
        InquirySubmitted => "INQUIRY_SUBMITTED",
        ProjectNote => "PROJECT_NOTE",
        ProjectCompleted => "PROJECT_COMPLETED",
        Custom => "CUSTOM",
    }
}

// =============================================================================
// Identities
// =============================================================================

/// An authenticated caller: the account id plus the role claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: i64,
    pub role: Role,
}

impl Principal {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }
}

/// Compact account reference used inside every view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSummary {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

// =============================================================================
// Records
// =============================================================================

/// A row from the `accounts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.role)
    }

    pub fn summary(&self) -> StaffSummary {
        StaffSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// A row from the `projects` table, joined with its client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub status: ProjectStatus,
    pub progress_percentage: u8,
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub highlighted: bool,
    pub client: Option<StaffSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Deployed, or reported at full progress.
    pub fn is_complete(&self) -> bool {
        self.status == ProjectStatus::Deployed || self.progress_percentage >= 100
    }

    pub fn client_id(&self) -> Option<i64> {
        self.client.as_ref().map(|c| c.id)
    }
}

/// A row from `project_assignments`, joined with the member account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub project_id: i64,
    pub member: StaffSummary,
    pub assignment_role: Role,
    pub assigned_at: DateTime<Utc>,
}

/// A row from `project_tasks`, joined with its project name and assignee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub project_name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<StaffSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A row from `project_timeline_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: i64,
    pub project_id: i64,
    pub event_type: TimelineEventType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub actor: Option<StaffSummary>,
}

/// A row from `inquiries`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub message: String,
    pub status: InquiryStatus,
    pub assigned_to: Option<String>,
    pub source: Option<String>,
    pub project_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from `user_notifications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

/// Partial account update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectRequest {
    pub name: String,
    pub summary: String,
    pub details: Option<String>,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub status: ProjectStatus,
    pub progress_percentage: Option<i32>,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<i64>,
    #[serde(default)]
    pub clear_due_date: bool,
    #[serde(default)]
    pub clear_assignee: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInquiry {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub message: String,
    pub source: Option<String>,
    pub project_id: Option<i64>,
}

/// A notification to append. The ledger stamps id, read flag and timestamp.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: Option<String>,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
}

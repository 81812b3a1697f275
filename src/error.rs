//! Error types for back-office operations
//!
//! Errors are classified by who has to act on them:
//! - PermissionDenied: the caller's role does not allow the operation
//! - NotFound / InvalidOperation: the request itself is wrong
//! - Internal: storage returned something that violates an invariant

use serde::Serialize;
use thiserror::Error;

use crate::db::DbError;

/// Why a policy check said no. Each reason has a stable code for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    CreateRoleNotAllowed,
    CreateNotPrivileged,
    SuperAdminProtected,
    SubAdminManageScope,
    ManageNotPrivileged,
    DeleteSuperAdmin,
    DeleteNotPrivileged,
    SuperAdminRoleChange,
    SubAdminRoleScope,
    RoleChangeNotPrivileged,
    OrganizationTreeRestricted,
    CustomerTreeScope,
    SubAdminTreeScope,
    AdminOnly,
    AssignmentAdminOnly,
    NotAssignedToProject,
    NotProjectClient,
    SelfAssignmentOnly,
    TaskEditNotAllowed,
}

impl DenialReason {
    /// Machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::CreateRoleNotAllowed => "create_role_not_allowed",
            DenialReason::CreateNotPrivileged => "create_not_privileged",
            DenialReason::SuperAdminProtected => "super_admin_protected",
            DenialReason::SubAdminManageScope => "sub_admin_manage_scope",
            DenialReason::ManageNotPrivileged => "manage_not_privileged",
            DenialReason::DeleteSuperAdmin => "delete_super_admin",
            DenialReason::DeleteNotPrivileged => "delete_not_privileged",
            DenialReason::SuperAdminRoleChange => "super_admin_role_change",
            DenialReason::SubAdminRoleScope => "sub_admin_role_scope",
            DenialReason::RoleChangeNotPrivileged => "role_change_not_privileged",
            DenialReason::OrganizationTreeRestricted => "organization_tree_restricted",
            DenialReason::CustomerTreeScope => "customer_tree_scope",
            DenialReason::SubAdminTreeScope => "sub_admin_tree_scope",
            DenialReason::AdminOnly => "admin_only",
            DenialReason::AssignmentAdminOnly => "assignment_admin_only",
            DenialReason::NotAssignedToProject => "not_assigned_to_project",
            DenialReason::NotProjectClient => "not_project_client",
            DenialReason::SelfAssignmentOnly => "self_assignment_only",
            DenialReason::TaskEditNotAllowed => "task_edit_not_allowed",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            DenialReason::CreateRoleNotAllowed => {
                "Sub-admins can only create developers or customers."
            }
            DenialReason::CreateNotPrivileged => "Only privileged users can create accounts.",
            DenialReason::SuperAdminProtected => "You cannot update a super-admin account.",
            DenialReason::SubAdminManageScope => {
                "Sub-admins can only manage developers or customers."
            }
            DenialReason::ManageNotPrivileged => "Insufficient permissions to manage users.",
            DenialReason::DeleteSuperAdmin => "You cannot delete a super-admin account.",
            DenialReason::DeleteNotPrivileged => "Only super-admins can delete accounts.",
            DenialReason::SuperAdminRoleChange => {
                "Only super-admins can modify super-admin roles."
            }
            DenialReason::SubAdminRoleScope => {
                "Sub-admins can only change between developer and customer roles."
            }
            DenialReason::RoleChangeNotPrivileged => {
                "Only administrators can change account roles."
            }
            DenialReason::OrganizationTreeRestricted => {
                "Only super-admins can view the organization graph."
            }
            DenialReason::CustomerTreeScope => "Customers can only view their own project tree.",
            DenialReason::SubAdminTreeScope => {
                "Sub-admins can only view their own relationship tree."
            }
            DenialReason::AdminOnly => "Only administrators can perform this action.",
            DenialReason::AssignmentAdminOnly => {
                "Only super-admins can manage project assignments."
            }
            DenialReason::NotAssignedToProject => "You are not assigned to this project.",
            DenialReason::NotProjectClient => "You are not allowed to view this project.",
            DenialReason::SelfAssignmentOnly => "Developers can only assign tasks to themselves.",
            DenialReason::TaskEditNotAllowed => "You are not allowed to edit project tasks.",
        };
        f.write_str(message)
    }
}

/// Error type for every core operation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: DenialReason },

    #[error("{entity} not found with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    InvalidOperation(String),

    #[error("Invalid assignment: {0}")]
    InvalidAssignment(String),

    #[error("Referential integrity violated: {0}")]
    ReferentialIntegrity(String),

    #[error("Storage error: {0}")]
    Storage(DbError),
}

/// Client-facing classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    PermissionDenied,
    NotFound,
    InvalidOperation,
    Internal,
}

impl CoreError {
    pub fn denied(reason: DenialReason) -> Self {
        CoreError::PermissionDenied { reason }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CoreError::NotFound { entity, id }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        CoreError::InvalidOperation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InvalidOperation(_) | CoreError::InvalidAssignment(_) => {
                ErrorKind::InvalidOperation
            }
            CoreError::ReferentialIntegrity(_) | CoreError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Returns the denial reason for permission failures.
    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            CoreError::PermissionDenied { reason } => Some(*reason),
            _ => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation(message) => CoreError::InvalidOperation(message),
            DbError::UnknownValue { column, value } => {
                CoreError::InvalidOperation(format!("Unknown {column} value: {value}"))
            }
            DbError::Integrity(message) => CoreError::ReferentialIntegrity(message),
            other => CoreError::Storage(other),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::from(DbError::from(err))
    }
}

/// Serializable error representation for callers outside the crate
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl From<&CoreError> for ErrorResponse {
    fn from(err: &CoreError) -> Self {
        let kind = err.kind();
        let message = if kind == ErrorKind::Internal {
            log::error!("Internal error: {}", err);
            "Internal error".to_string()
        } else {
            err.to_string()
        };

        ErrorResponse {
            message,
            kind,
            reason: err.denial_reason().map(|r| r.code()),
        }
    }
}

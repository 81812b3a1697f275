//! Gated entry points.
//!
//! Every mutation evaluates its policy check and performs its writes inside
//! one `with_transaction` call, so a denied or failed request leaves nothing
//! behind. Multi-query reads run inside `with_snapshot`.

pub mod accounts;
pub mod assignments;
pub mod graph;
pub mod inquiries;
pub mod notifications;
pub mod projects;
pub mod tasks;
pub mod timeline;
pub mod workspace;

use crate::db::BackofficeDb;
use crate::error::CoreError;
use crate::types::{Account, Principal, Project, Task};

pub(crate) fn require_account(db: &BackofficeDb, id: i64) -> Result<Account, CoreError> {
    db.get_account(id)?
        .ok_or_else(|| CoreError::not_found("Account", id))
}

pub(crate) fn require_project(db: &BackofficeDb, id: i64) -> Result<Project, CoreError> {
    db.get_project(id)?
        .ok_or_else(|| CoreError::not_found("Project", id))
}

pub(crate) fn require_task(db: &BackofficeDb, id: i64) -> Result<Task, CoreError> {
    db.get_task(id)?.ok_or_else(|| CoreError::not_found("Task", id))
}

/// Resolve an authenticated account id to the principal used by policy
/// checks. Deactivated accounts cannot act.
pub fn principal_for(db: &BackofficeDb, account_id: i64) -> Result<Principal, CoreError> {
    let account = require_account(db, account_id)?;
    if !account.active {
        return Err(CoreError::invalid("Account is deactivated."));
    }
    Ok(account.principal())
}

pub(crate) fn non_blank(value: &str, field: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid(format!("{field} must not be blank.")));
    }
    Ok(trimmed.to_string())
}

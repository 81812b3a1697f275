//! Project staffing: linking sub-admins and developers to projects.

use crate::db::BackofficeDb;
use crate::error::CoreError;
use crate::graph;
use crate::policy;
use crate::roles::Role;
use crate::types::{Assignment, NewNotification, NotificationType, Principal, Project};

use super::{require_account, require_project};

/// Assign `member_id` to `project_id` as `assignment_role` and notify them.
///
/// The assignment and its notification commit together.
pub fn assign_member(
    db: &BackofficeDb,
    actor: &Principal,
    project_id: i64,
    member_id: i64,
    assignment_role: Role,
) -> Result<Assignment, CoreError> {
    if let Err(e) = policy::may_manage_assignments(actor) {
        log::warn!("Account {} denied assigning members", actor.id);
        return Err(e);
    }
    let assignment = db.with_transaction(|tx| -> Result<Assignment, CoreError> {
        let project = require_project(tx, project_id)?;
        let member = require_account(tx, member_id)?;
        policy::may_assign_to_project(assignment_role, member.role)?;

        let assignment = tx.insert_assignment(project.id, member.id, assignment_role)?;
        tx.insert_notification(&NewNotification {
            recipient_id: member.id,
            notification_type: NotificationType::ProjectAssignment,
            title: format!("Assigned to project: {}", project.name),
            message: Some(format!(
                "You have been added to {} as {}.",
                project.name, assignment_role
            )),
            project_id: Some(project.id),
            task_id: None,
        })?;
        Ok(assignment)
    })?;
    log::info!(
        "Assigned account {} to project {} as {}",
        member_id,
        project_id,
        assignment_role
    );
    Ok(assignment)
}

pub fn remove_assignment(
    db: &BackofficeDb,
    actor: &Principal,
    assignment_id: i64,
) -> Result<(), CoreError> {
    policy::may_manage_assignments(actor)?;
    db.with_transaction(|tx| -> Result<(), CoreError> {
        if !tx.delete_assignment(assignment_id)? {
            return Err(CoreError::not_found("Assignment", assignment_id));
        }
        Ok(())
    })?;
    log::info!("Account {} removed assignment {}", actor.id, assignment_id);
    Ok(())
}

pub fn assignments_for_project(
    db: &BackofficeDb,
    actor: &Principal,
    project_id: i64,
) -> Result<Vec<Assignment>, CoreError> {
    policy::may_administer_projects(actor)?;
    db.with_snapshot(|snap| -> Result<Vec<Assignment>, CoreError> {
        require_project(snap, project_id)?;
        Ok(snap.assignments_for_project(project_id)?)
    })
}

/// Projects `member_id` is assigned to, each once, in assignment order.
pub fn projects_for_member(db: &BackofficeDb, member_id: i64) -> Result<Vec<Project>, CoreError> {
    db.with_snapshot(|snap| -> Result<Vec<Project>, CoreError> {
        require_account(snap, member_id)?;
        let assignments = snap.assignments_for_member(member_id)?;
        let mut projects = Vec::new();
        for assignment in &assignments {
            if let Some(project) = snap.get_project(assignment.project_id)? {
                projects.push(project);
            }
        }
        graph::projects_for_member(member_id, &assignments, &projects)
    })
}

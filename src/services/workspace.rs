//! Developer workspace loader.

use crate::db::BackofficeDb;
use crate::error::CoreError;
use crate::graph;
use crate::roles::Role;
use crate::types::Project;
use crate::workspace::{compose_workspace, DeveloperWorkspace, WorkspaceLimits, WorkspaceSources};

use super::require_account;

/// Read every source for `developer_id` inside one snapshot and compose the
/// dashboard. Nothing is written.
pub fn developer_workspace(
    db: &BackofficeDb,
    developer_id: i64,
    limits: WorkspaceLimits,
) -> Result<DeveloperWorkspace, CoreError> {
    let sources = db.with_snapshot(|snap| -> Result<WorkspaceSources, CoreError> {
        let developer = require_account(snap, developer_id)?;
        if developer.role != Role::Developer {
            return Err(CoreError::invalid(format!(
                "Account {developer_id} is a {} and has no developer workspace.",
                developer.role
            )));
        }

        let assignments = snap.assignments_for_member(developer_id)?;
        let mut candidates: Vec<Project> = Vec::new();
        for assignment in &assignments {
            let project = snap.get_project(assignment.project_id)?.ok_or_else(|| {
                CoreError::ReferentialIntegrity(format!(
                    "assignment {} references missing project {}",
                    assignment.id, assignment.project_id
                ))
            })?;
            candidates.push(project);
        }
        let projects = graph::projects_for_member(developer_id, &assignments, &candidates)?;
        let project_ids: Vec<i64> = projects.iter().map(|p| p.id).collect();

        Ok(WorkspaceSources {
            tasks: snap.tasks_for_assignee(developer_id)?,
            events: snap.events_for_projects(&project_ids)?,
            inquiries: snap.inquiries_for_projects(&project_ids)?,
            notifications: snap.notifications_for_recipient(developer_id, Some(limits.feed))?,
            unread_notifications: snap.unread_count(developer_id)?,
            projects,
        })
    })?;

    log::debug!(
        "Loaded workspace for developer {}: {} tasks across {} projects",
        developer_id,
        sources.tasks.len(),
        sources.projects.len()
    );
    Ok(compose_workspace(sources, limits))
}

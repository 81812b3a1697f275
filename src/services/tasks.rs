//! Task creation and editing on project boards.

use serde::Serialize;

use crate::board::{self, ProjectSummary, TaskBoard, DEFAULT_UPCOMING_LIMIT};
use crate::db::BackofficeDb;
use crate::error::CoreError;
use crate::policy;
use crate::types::{NewNotification, NewTask, NotificationType, Principal, Project, Task, TaskUpdate};

use super::{require_account, require_project, require_task};

/// One project's tasks grouped by status, with its summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBoard {
    pub project: Project,
    pub board: TaskBoard,
    pub summary: ProjectSummary,
}

fn is_member(db: &BackofficeDb, actor: &Principal, project_id: i64) -> Result<bool, CoreError> {
    Ok(db.assignment_for_pair(project_id, actor.id)?.is_some())
}

fn actor_name(db: &BackofficeDb, actor: &Principal) -> Result<Option<String>, CoreError> {
    Ok(db.get_account(actor.id)?.map(|a| a.full_name))
}

pub fn create_task(db: &BackofficeDb, actor: &Principal, request: &NewTask) -> Result<Task, CoreError> {
    let title = super::non_blank(&request.title, "Task title")?;
    let task = db.with_transaction(|tx| -> Result<Task, CoreError> {
        require_project(tx, request.project_id)?;
        let member = is_member(tx, actor, request.project_id)?;
        if let Err(e) = policy::may_edit_task(actor, member, request.assignee_id) {
            log::warn!(
                "Account {} denied creating a task on project {}",
                actor.id,
                request.project_id
            );
            return Err(e);
        }
        if let Some(assignee_id) = request.assignee_id {
            require_account(tx, assignee_id)?;
        }

        let task = tx.insert_task(&NewTask {
            title,
            ..request.clone()
        })?;

        if let Some(assignee) = &task.assignee {
            let message = match actor_name(tx, actor)? {
                Some(name) => format!("{name} assigned a task to you."),
                None => "You have a new task.".to_string(),
            };
            tx.insert_notification(&NewNotification {
                recipient_id: assignee.id,
                notification_type: NotificationType::TaskAssigned,
                title: format!("New task assigned: {}", task.title),
                message: Some(message),
                project_id: Some(task.project_id),
                task_id: Some(task.id),
            })?;
        }
        Ok(task)
    })?;
    log::info!(
        "Account {} created task {} on project {}",
        actor.id,
        task.id,
        task.project_id
    );
    Ok(task)
}

/// Apply a partial update. The task's assignee after the update, if any, is
/// notified.
pub fn update_task(
    db: &BackofficeDb,
    actor: &Principal,
    task_id: i64,
    update: &TaskUpdate,
) -> Result<Task, CoreError> {
    let mut update = update.clone();
    if let Some(title) = &update.title {
        update.title = Some(super::non_blank(title, "Task title")?);
    }

    let task = db.with_transaction(|tx| -> Result<Task, CoreError> {
        let existing = require_task(tx, task_id)?;
        let member = is_member(tx, actor, existing.project_id)?;
        policy::may_edit_task(actor, member, update.assignee_id)?;
        if let Some(assignee_id) = update.assignee_id {
            require_account(tx, assignee_id)?;
        }

        tx.update_task(task_id, &update)?;
        let task = require_task(tx, task_id)?;

        if let Some(assignee) = &task.assignee {
            let message = match actor_name(tx, actor)? {
                Some(name) => format!("{name} updated the task."),
                None => "Task has been updated.".to_string(),
            };
            tx.insert_notification(&NewNotification {
                recipient_id: assignee.id,
                notification_type: NotificationType::TaskUpdated,
                title: format!("Task updated: {}", task.title),
                message: Some(message),
                project_id: Some(task.project_id),
                task_id: Some(task.id),
            })?;
        }
        Ok(task)
    })?;
    log::info!("Account {} updated task {} ({})", actor.id, task.id, task.status);
    Ok(task)
}

pub fn delete_task(db: &BackofficeDb, actor: &Principal, task_id: i64) -> Result<(), CoreError> {
    policy::may_administer_projects(actor)?;
    db.with_transaction(|tx| -> Result<(), CoreError> {
        if !tx.delete_task(task_id)? {
            return Err(CoreError::not_found("Task", task_id));
        }
        Ok(())
    })?;
    log::info!("Account {} deleted task {}", actor.id, task_id);
    Ok(())
}

/// The project's board as `actor` may see it: admins, assigned members and
/// the project's client.
pub fn project_board(
    db: &BackofficeDb,
    actor: &Principal,
    project_id: i64,
) -> Result<ProjectBoard, CoreError> {
    db.with_snapshot(|snap| -> Result<ProjectBoard, CoreError> {
        let project = require_project(snap, project_id)?;
        let member = is_member(snap, actor, project_id)?;
        let client = project.client_id() == Some(actor.id);
        policy::may_view_project(actor, member, client)?;

        let tasks = snap.tasks_for_project(project_id)?;
        let summary = board::project_summary(&project, &tasks, DEFAULT_UPCOMING_LIMIT);
        Ok(ProjectBoard {
            board: board::board_for(&tasks),
            summary,
            project,
        })
    })
}

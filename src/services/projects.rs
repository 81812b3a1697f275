//! Project requests and delivery-state updates.

use std::collections::HashSet;

use crate::db::BackofficeDb;
use crate::error::CoreError;
use crate::policy;
use crate::roles::Role;
use crate::types::{
    NewNotification, NewProjectRequest, NotificationType, Principal, Project, ProjectUpdate,
};

use super::{non_blank, require_account, require_project};

/// A customer asks for a new project. It starts in PLANNING at 5%.
pub fn submit_project_request(
    db: &BackofficeDb,
    customer: &Principal,
    request: &NewProjectRequest,
) -> Result<Project, CoreError> {
    if customer.role != Role::Customer {
        return Err(CoreError::invalid("Only customers can submit project requests."));
    }
    let request = NewProjectRequest {
        name: non_blank(&request.name, "Project name")?,
        summary: non_blank(&request.summary, "Project summary")?,
        details: request.details.clone(),
        target_date: request.target_date,
    };
    let project = db.with_transaction(|tx| -> Result<Project, CoreError> {
        require_account(tx, customer.id)?;
        Ok(tx.insert_project(&request, Some(customer.id))?)
    })?;
    log::info!("Customer {} requested project {}", customer.id, project.id);
    Ok(project)
}

/// Update status, progress and target date.
///
/// When the update completes the project, the client and every assigned
/// member get one PROJECT_COMPLETED notification each, in the same
/// transaction.
pub fn update_project(
    db: &BackofficeDb,
    actor: &Principal,
    project_id: i64,
    update: &ProjectUpdate,
) -> Result<Project, CoreError> {
    policy::may_administer_projects(actor)?;
    let progress = match update.progress_percentage {
        Some(p) if !(0..=100).contains(&p) => {
            return Err(CoreError::invalid(format!(
                "Progress must be between 0 and 100, got {p}."
            )))
        }
        Some(p) => Some(p as u8),
        None => None,
    };

    let (project, notified) = db.with_transaction(|tx| -> Result<(Project, usize), CoreError> {
        let before = require_project(tx, project_id)?;
        tx.update_project_state(project_id, update.status, progress, update.target_date)?;
        let after = require_project(tx, project_id)?;

        let notified = if !before.is_complete() && after.is_complete() {
            dispatch_completion(tx, &after)?
        } else {
            0
        };
        Ok((after, notified))
    })?;

    log::info!(
        "Account {} moved project {} to {} ({}%)",
        actor.id,
        project.id,
        project.status,
        project.progress_percentage
    );
    if notified > 0 {
        log::info!("Project {} completed, notified {} accounts", project.id, notified);
    }
    Ok(project)
}

fn dispatch_completion(db: &BackofficeDb, project: &Project) -> Result<usize, CoreError> {
    let mut notified = HashSet::new();

    if let Some(client) = &project.client {
        db.insert_notification(&NewNotification {
            recipient_id: client.id,
            notification_type: NotificationType::ProjectCompleted,
            title: format!("Launch complete: {}", project.name),
            message: Some("Your project is live and ready for review.".to_string()),
            project_id: Some(project.id),
            task_id: None,
        })?;
        notified.insert(client.id);
    }

    for assignment in db.assignments_for_project(project.id)? {
        if !notified.insert(assignment.member.id) {
            continue;
        }
        db.insert_notification(&NewNotification {
            recipient_id: assignment.member.id,
            notification_type: NotificationType::ProjectCompleted,
            title: format!("Project shipped: {}", project.name),
            message: Some("Celebrate the delivery! The customer has been notified.".to_string()),
            project_id: Some(project.id),
            task_id: None,
        })?;
    }

    Ok(notified.len())
}

/// Projects visible to `viewer`: every project for admins, the client's own
/// projects for customers, assigned projects for developers.
pub fn projects_for(db: &BackofficeDb, viewer: &Principal) -> Result<Vec<Project>, CoreError> {
    match viewer.role {
        Role::SuperAdmin | Role::SubAdmin => Ok(db.all_projects()?),
        Role::Customer => Ok(db.projects_for_client(viewer.id)?),
        Role::Developer => super::assignments::projects_for_member(db, viewer.id),
    }
}

pub fn highlighted_projects(db: &BackofficeDb) -> Result<Vec<Project>, CoreError> {
    Ok(db.highlighted_projects()?)
}

pub fn set_highlighted(
    db: &BackofficeDb,
    actor: &Principal,
    project_id: i64,
    highlighted: bool,
) -> Result<Project, CoreError> {
    policy::may_administer_projects(actor)?;
    db.with_transaction(|tx| -> Result<Project, CoreError> {
        require_project(tx, project_id)?;
        tx.set_project_highlighted(project_id, highlighted)?;
        require_project(tx, project_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{seed_account, seed_project, test_db};
    use crate::error::ErrorKind;
    use crate::services::assignments::assign_member;
    use crate::services::test_support::root;
    use crate::types::ProjectStatus;

    fn status_update(status: ProjectStatus, progress: Option<i32>) -> ProjectUpdate {
        ProjectUpdate {
            status,
            progress_percentage: progress,
            target_date: None,
        }
    }

    #[test]
    fn test_submit_request_defaults() {
        let db = test_db();
        let customer = seed_account(&db, "Cora", Role::Customer);
        let project = submit_project_request(
            &db,
            &customer.principal(),
            &NewProjectRequest {
                name: " Portal ".into(),
                summary: "Self-service portal".into(),
                details: None,
                target_date: None,
            },
        )
        .expect("submit");
        assert_eq!(project.name, "Portal");
        assert_eq!(project.status, ProjectStatus::Planning);
        assert_eq!(project.progress_percentage, 5);
        assert_eq!(project.client_id(), Some(customer.id));

        let dev = seed_account(&db, "Dev", Role::Developer);
        let err = submit_project_request(
            &db,
            &dev.principal(),
            &NewProjectRequest {
                name: "Side".into(),
                summary: "Side".into(),
                details: None,
                target_date: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_progress_out_of_range() {
        let db = test_db();
        let (_, admin) = root(&db);
        let project = seed_project(&db, "Portal", None);
        for bad in [-1, 101] {
            let err = update_project(
                &db,
                &admin,
                project.id,
                &status_update(ProjectStatus::Testing, Some(bad)),
            )
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        }
    }

    #[test]
    fn test_completion_notifies_each_account_once() {
        let db = test_db();
        let (_, admin) = root(&db);
        let customer = seed_account(&db, "Cora", Role::Customer);
        let lead = seed_account(&db, "Lead", Role::SubAdmin);
        let dev = seed_account(&db, "Dev", Role::Developer);
        let project = seed_project(&db, "Portal", Some(customer.id));
        assign_member(&db, &admin, project.id, lead.id, Role::SubAdmin).expect("assign");
        assign_member(&db, &admin, project.id, dev.id, Role::Developer).expect("assign");

        update_project(
            &db,
            &admin,
            project.id,
            &status_update(ProjectStatus::Testing, Some(90)),
        )
        .expect("progress");
        assert_eq!(db.unread_count(customer.id).expect("count"), 0);

        let done = update_project(
            &db,
            &admin,
            project.id,
            &status_update(ProjectStatus::Deployed, None),
        )
        .expect("deploy");
        assert!(done.is_complete());

        let completed = |id: i64| {
            db.notifications_for_recipient(id, None)
                .expect("feed")
                .into_iter()
                .filter(|n| n.notification_type == NotificationType::ProjectCompleted)
                .count()
        };
        assert_eq!(completed(customer.id), 1);
        assert_eq!(completed(lead.id), 1);
        assert_eq!(completed(dev.id), 1);

        // Already complete: no second round.
        update_project(
            &db,
            &admin,
            project.id,
            &status_update(ProjectStatus::Deployed, Some(100)),
        )
        .expect("again");
        assert_eq!(completed(customer.id), 1);
    }

    #[test]
    fn test_developers_cannot_update_projects() {
        let db = test_db();
        let dev = seed_account(&db, "Dev", Role::Developer);
        let project = seed_project(&db, "Portal", None);
        let err = update_project(
            &db,
            &dev.principal(),
            project.id,
            &status_update(ProjectStatus::Testing, None),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_projects_for_viewer() {
        let db = test_db();
        let (_, admin) = root(&db);
        let customer = seed_account(&db, "Cora", Role::Customer);
        let dev = seed_account(&db, "Dev", Role::Developer);
        let mine = seed_project(&db, "Mine", Some(customer.id));
        seed_project(&db, "Other", None);
        assign_member(&db, &admin, mine.id, dev.id, Role::Developer).expect("assign");

        assert_eq!(projects_for(&db, &admin).expect("all").len(), 2);
        assert_eq!(projects_for(&db, &customer.principal()).expect("own").len(), 1);
        assert_eq!(projects_for(&db, &dev.principal()).expect("assigned").len(), 1);

        set_highlighted(&db, &admin, mine.id, true).expect("highlight");
        assert_eq!(highlighted_projects(&db).expect("highlighted").len(), 1);
    }
}

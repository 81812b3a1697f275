//! Project timeline: delivery milestones and notes.

use crate::db::BackofficeDb;
use crate::error::CoreError;
use crate::policy;
use crate::types::{Principal, TimelineEvent, TimelineEventType};

use super::{non_blank, require_project};

/// Record an event on a project's timeline, attributed to `actor`.
pub fn record_event(
    db: &BackofficeDb,
    actor: &Principal,
    project_id: i64,
    event_type: TimelineEventType,
    title: &str,
    description: Option<&str>,
) -> Result<TimelineEvent, CoreError> {
    policy::may_administer_projects(actor)?;
    let title = non_blank(title, "Event title")?;
    let event = db.with_transaction(|tx| -> Result<TimelineEvent, CoreError> {
        require_project(tx, project_id)?;
        Ok(tx.insert_event(project_id, event_type, &title, description, Some(actor.id))?)
    })?;
    log::info!(
        "Recorded {} event {} on project {}",
        event.event_type,
        event.id,
        project_id
    );
    Ok(event)
}

/// A project's timeline, newest first. Visible to anyone who may view the
/// project.
pub fn project_timeline(
    db: &BackofficeDb,
    viewer: &Principal,
    project_id: i64,
) -> Result<Vec<TimelineEvent>, CoreError> {
    db.with_snapshot(|snap| -> Result<Vec<TimelineEvent>, CoreError> {
        let project = require_project(snap, project_id)?;
        let member = snap.assignment_for_pair(project_id, viewer.id)?.is_some();
        policy::may_view_project(viewer, member, project.client_id() == Some(viewer.id))?;
        Ok(snap.events_for_project(project_id)?)
    })
}

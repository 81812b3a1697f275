//! Developer workspace composition.
//!
//! `compose_workspace` does no I/O: the loader in `services::workspace` reads
//! every source inside one snapshot and hands the collections over.

use std::collections::HashMap;

use serde::Serialize;

use crate::board::{board_for, project_summary, ProjectSummary, TaskBoard, DEFAULT_UPCOMING_LIMIT};
use crate::types::{Inquiry, Notification, Project, Task, TimelineEvent};

/// Entries kept in each workspace feed unless configured otherwise.
pub const DEFAULT_FEED_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceLimits {
    pub feed: usize,
    pub upcoming_tasks: usize,
}

impl Default for WorkspaceLimits {
    fn default() -> Self {
        Self {
            feed: DEFAULT_FEED_LIMIT,
            upcoming_tasks: DEFAULT_UPCOMING_LIMIT,
        }
    }
}

/// Already-fetched inputs for one developer.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSources {
    /// Tasks assigned to the developer, across all projects.
    pub tasks: Vec<Task>,
    /// Projects the developer is assigned to, deduplicated.
    pub projects: Vec<Project>,
    /// Timeline events of those projects, in storage order.
    pub events: Vec<TimelineEvent>,
    /// Inquiries linked to those projects.
    pub inquiries: Vec<Inquiry>,
    /// The developer's notifications, newest first.
    pub notifications: Vec<Notification>,
    pub unread_notifications: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperWorkspace {
    pub task_board: TaskBoard,
    pub recent_events: Vec<TimelineEvent>,
    pub assigned_projects: Vec<Project>,
    pub project_summaries: Vec<ProjectSummary>,
    pub recent_inquiries: Vec<Inquiry>,
    pub notifications: Vec<Notification>,
    pub unread_notifications: u32,
}

/// Compose the dashboard payload. Project summaries only count the
/// developer's own tasks on each project.
pub fn compose_workspace(sources: WorkspaceSources, limits: WorkspaceLimits) -> DeveloperWorkspace {
    let WorkspaceSources {
        tasks,
        projects,
        mut events,
        mut inquiries,
        mut notifications,
        unread_notifications,
    } = sources;

    let task_board = board_for(&tasks);

    let mut by_project: HashMap<i64, Vec<Task>> = HashMap::new();
    for task in &tasks {
        by_project.entry(task.project_id).or_default().push(task.clone());
    }
    let project_summaries = projects
        .iter()
        .map(|project| {
            let own = by_project.get(&project.id).map(Vec::as_slice).unwrap_or_default();
            project_summary(project, own, limits.upcoming_tasks)
        })
        .collect();

    // Stable sorts keep arrival order for equal timestamps.
    events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    events.truncate(limits.feed);

    inquiries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    inquiries.truncate(limits.feed);

    notifications.truncate(limits.feed);

    DeveloperWorkspace {
        task_board,
        recent_events: events,
        assigned_projects: projects,
        project_summaries,
        recent_inquiries: inquiries,
        notifications,
        unread_notifications,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::graph::fixtures::{account, project, task};
    use crate::roles::Role;
    use crate::types::{InquiryStatus, NotificationType, TaskStatus, TimelineEventType};

    fn event(id: i64, project_id: i64, minutes: i64) -> TimelineEvent {
        TimelineEvent {
            id,
            project_id,
            event_type: TimelineEventType::Development,
            title: format!("event {id}"),
            description: None,
            occurred_at: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
            actor: None,
        }
    }

    fn inquiry(id: i64, project_id: i64, minutes: i64) -> Inquiry {
        let ts = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        Inquiry {
            id,
            full_name: "Pat".into(),
            email: "pat@buyer.io".into(),
            phone: None,
            company: None,
            message: format!("inquiry {id}"),
            status: InquiryStatus::New,
            assigned_to: None,
            source: None,
            project_id: Some(project_id),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn notification(id: i64, recipient_id: i64) -> Notification {
        Notification {
            id,
            recipient_id,
            notification_type: NotificationType::TaskAssigned,
            title: format!("notification {id}"),
            message: None,
            project_id: None,
            task_id: None,
            read: false,
            created_at: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_progress_from_own_tasks_with_fallback() {
        let dev = account(7, "Dana", Role::Developer);
        let x = project(1, "X", None);
        let mut y = project(2, "Y", None);
        y.progress_percentage = 35;

        let statuses = [
            TaskStatus::Done,
            TaskStatus::Done,
            TaskStatus::Done,
            TaskStatus::Todo,
            TaskStatus::InProgress,
        ];
        let tasks: Vec<Task> = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| task(i as i64 + 1, x.id, *s, Some(&dev)))
            .collect();

        let workspace = compose_workspace(
            WorkspaceSources {
                tasks,
                projects: vec![x, y],
                ..Default::default()
            },
            WorkspaceLimits::default(),
        );

        assert_eq!(workspace.project_summaries[0].progress_percentage, 60);
        assert_eq!(workspace.project_summaries[1].progress_percentage, 35);
        assert_eq!(workspace.project_summaries[1].total_tasks, 0);
        assert_eq!(workspace.task_board.done.len(), 3);
        assert_eq!(workspace.task_board.total(), 5);
        assert_eq!(workspace.project_summaries[0].contributors.len(), 1);
    }

    #[test]
    fn test_feeds_sorted_and_truncated() {
        let events: Vec<TimelineEvent> = (1..=25).map(|i| event(i, 1, i)).collect();
        let inquiries: Vec<Inquiry> = (1..=22).map(|i| inquiry(i, 1, i)).collect();
        let notifications: Vec<Notification> = (1..=30).rev().map(|i| notification(i, 7)).collect();

        let workspace = compose_workspace(
            WorkspaceSources {
                events,
                inquiries,
                notifications,
                unread_notifications: 30,
                ..Default::default()
            },
            WorkspaceLimits::default(),
        );

        assert_eq!(workspace.recent_events.len(), 20);
        assert_eq!(workspace.recent_events[0].id, 25);
        assert_eq!(workspace.recent_inquiries.len(), 20);
        assert_eq!(workspace.recent_inquiries[0].id, 22);
        assert_eq!(workspace.notifications.len(), 20);
        assert_eq!(workspace.notifications[0].id, 30);
        assert_eq!(workspace.unread_notifications, 30);
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        let events = vec![event(3, 1, 5), event(1, 2, 5), event(2, 1, 9)];
        let workspace = compose_workspace(
            WorkspaceSources {
                events,
                ..Default::default()
            },
            WorkspaceLimits::default(),
        );
        let ids: Vec<i64> = workspace.recent_events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_empty_sources_still_have_full_board() {
        let workspace = compose_workspace(WorkspaceSources::default(), WorkspaceLimits::default());
        assert_eq!(workspace.task_board, TaskBoard::default());
        assert!(workspace.project_summaries.is_empty());
    }
}

//! Task board aggregation.
//!
//! A board partitions tasks into the five status buckets, always all five,
//! in TODO → IN_PROGRESS → REVIEW → BLOCKED → DONE order. Project summaries
//! add the roll-up counts, computed progress, upcoming work and contributors.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::{Project, ProjectStatus, StaffSummary, Task, TaskStatus};

/// Upcoming tasks shown per project summary unless configured otherwise.
pub const DEFAULT_UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBoard {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub review: Vec<Task>,
    pub blocked: Vec<Task>,
    pub done: Vec<Task>,
}

impl TaskBoard {
    pub fn bucket(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Review => &self.review,
            TaskStatus::Blocked => &self.blocked,
            TaskStatus::Done => &self.done,
        }
    }

    fn bucket_mut(&mut self, status: TaskStatus) -> &mut Vec<Task> {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Review => &mut self.review,
            TaskStatus::Blocked => &mut self.blocked,
            TaskStatus::Done => &mut self.done,
        }
    }

    pub fn total(&self) -> usize {
        TaskStatus::ALL.iter().map(|s| self.bucket(*s).len()).sum()
    }
}

/// Group tasks by status, keeping input order inside each bucket.
pub fn board_for(tasks: &[Task]) -> TaskBoard {
    let mut board = TaskBoard::default();
    for task in tasks {
        board.bucket_mut(task.status).push(task.clone());
    }
    board
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub project_id: i64,
    pub name: String,
    pub status: ProjectStatus,
    pub client: Option<StaffSummary>,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub blocked_tasks: usize,
    pub todo_tasks: usize,
    /// Share of completed tasks, or the stored percentage when there are none.
    pub progress_percentage: u8,
    pub upcoming_tasks: Vec<Task>,
    pub contributors: Vec<StaffSummary>,
}

/// Roll up `tasks` for `project`.
pub fn project_summary(project: &Project, tasks: &[Task], upcoming_limit: usize) -> ProjectSummary {
    let count = |pred: fn(TaskStatus) -> bool| tasks.iter().filter(|t| pred(t.status)).count();

    let total_tasks = tasks.len();
    let completed_tasks = count(|s| s == TaskStatus::Done);
    let in_progress_tasks = count(|s| matches!(s, TaskStatus::InProgress | TaskStatus::Review));
    let blocked_tasks = count(|s| s == TaskStatus::Blocked);
    let todo_tasks = count(|s| s == TaskStatus::Todo);

    let progress_percentage = if total_tasks > 0 {
        (completed_tasks as f64 / total_tasks as f64 * 100.0).round() as u8
    } else {
        project.progress_percentage
    };

    ProjectSummary {
        project_id: project.id,
        name: project.name.clone(),
        status: project.status,
        client: project.client.clone(),
        total_tasks,
        completed_tasks,
        in_progress_tasks,
        blocked_tasks,
        todo_tasks,
        progress_percentage,
        upcoming_tasks: upcoming(tasks, upcoming_limit),
        contributors: contributors(tasks),
    }
}

/// Open tasks by due date, then last update, then id. Missing dates sort last.
fn upcoming(tasks: &[Task], limit: usize) -> Vec<Task> {
    let mut open: Vec<&Task> = tasks.iter().filter(|t| t.status != TaskStatus::Done).collect();
    open.sort_by_key(|t| {
        (
            t.due_date.is_none(),
            t.due_date,
            t.updated_at.is_none(),
            t.updated_at,
            t.id,
        )
    });
    open.into_iter().take(limit).cloned().collect()
}

/// Distinct assignees in first-seen order.
fn contributors(tasks: &[Task]) -> Vec<StaffSummary> {
    let mut seen = HashSet::new();
    tasks
        .iter()
        .filter_map(|t| t.assignee.as_ref())
        .filter(|a| seen.insert(a.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::graph::fixtures::{account, project, task};
    use crate::roles::Role;

    #[test]
    fn test_board_partitions_exactly() {
        let tasks: Vec<Task> = TaskStatus::ALL
            .iter()
            .cycle()
            .take(12)
            .enumerate()
            .map(|(i, s)| task(i as i64 + 1, 1, *s, None))
            .collect();
        let board = board_for(&tasks);
        assert_eq!(board.total(), tasks.len());
        for status in TaskStatus::ALL {
            assert!(board.bucket(*status).iter().all(|t| t.status == *status));
        }
        assert_eq!(board.todo.len(), 3);
        assert_eq!(board.done.len(), 2);
    }

    #[test]
    fn test_empty_board_has_all_buckets() {
        let json = serde_json::to_value(board_for(&[])).expect("serialize");
        for key in ["todo", "inProgress", "review", "blocked", "done"] {
            assert_eq!(json[key], serde_json::json!([]), "bucket {key}");
        }
    }

    #[test]
    fn test_summary_counts_and_progress() {
        let p = project(1, "X", None);
        let tasks = vec![
            task(1, 1, TaskStatus::Done, None),
            task(2, 1, TaskStatus::Done, None),
            task(3, 1, TaskStatus::Done, None),
            task(4, 1, TaskStatus::Review, None),
            task(5, 1, TaskStatus::Blocked, None),
        ];
        let summary = project_summary(&p, &tasks, DEFAULT_UPCOMING_LIMIT);
        assert_eq!(summary.progress_percentage, 60);
        assert_eq!(summary.completed_tasks, 3);
        assert_eq!(summary.in_progress_tasks, 1);
        assert_eq!(summary.blocked_tasks, 1);
        assert_eq!(summary.todo_tasks, 0);
        assert_eq!(
            summary.completed_tasks
                + summary.in_progress_tasks
                + summary.blocked_tasks
                + summary.todo_tasks,
            summary.total_tasks
        );
        assert_eq!(project_summary(&p, &tasks, DEFAULT_UPCOMING_LIMIT), summary);
    }

    #[test]
    fn test_progress_falls_back_without_tasks() {
        let p = project(1, "Y", None);
        let summary = project_summary(&p, &[], DEFAULT_UPCOMING_LIMIT);
        assert_eq!(summary.progress_percentage, p.progress_percentage);
        assert_eq!(summary.total_tasks, 0);
    }

    #[test]
    fn test_progress_rounds_half_up() {
        let p = project(1, "Z", None);
        let tasks = vec![
            task(1, 1, TaskStatus::Done, None),
            task(2, 1, TaskStatus::Todo, None),
            task(3, 1, TaskStatus::Todo, None),
        ];
        assert_eq!(project_summary(&p, &tasks, 5).progress_percentage, 33);
        let tasks = vec![
            task(1, 1, TaskStatus::Done, None),
            task(2, 1, TaskStatus::Done, None),
            task(3, 1, TaskStatus::Todo, None),
        ];
        assert_eq!(project_summary(&p, &tasks, 5).progress_percentage, 67);
    }

    #[test]
    fn test_upcoming_ordering_and_limit() {
        let p = project(1, "X", None);
        let date = |d| NaiveDate::from_ymd_opt(2025, 6, d);
        let updated = |h| Some(Utc.with_ymd_and_hms(2025, 5, 1, h, 0, 0).unwrap());

        let mut no_due_old = task(1, 1, TaskStatus::Todo, None);
        no_due_old.updated_at = updated(1);
        let mut later = task(2, 1, TaskStatus::Todo, None);
        later.due_date = date(20);
        let mut soon_fresh = task(3, 1, TaskStatus::InProgress, None);
        soon_fresh.due_date = date(10);
        soon_fresh.updated_at = updated(9);
        let mut soon_stale = task(4, 1, TaskStatus::Blocked, None);
        soon_stale.due_date = date(10);
        soon_stale.updated_at = updated(2);
        let mut soon_never = task(5, 1, TaskStatus::Review, None);
        soon_never.due_date = date(10);
        let mut finished = task(6, 1, TaskStatus::Done, None);
        finished.due_date = date(1);
        let no_due_never = task(7, 1, TaskStatus::Todo, None);

        let tasks = vec![
            no_due_old,
            later,
            soon_fresh,
            soon_stale,
            soon_never,
            finished,
            no_due_never,
        ];
        let ids: Vec<i64> = project_summary(&p, &tasks, 5)
            .upcoming_tasks
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![4, 3, 5, 2, 1]);
    }

    #[test]
    fn test_contributors_first_seen() {
        let p = project(1, "X", None);
        let carol = account(3, "Carol", Role::Developer);
        let dan = account(4, "Dan", Role::Developer);
        let tasks = vec![
            task(1, 1, TaskStatus::Todo, Some(&dan)),
            task(2, 1, TaskStatus::Todo, None),
            task(3, 1, TaskStatus::Done, Some(&carol)),
            task(4, 1, TaskStatus::Todo, Some(&dan)),
        ];
        let ids: Vec<i64> = project_summary(&p, &tasks, 5)
            .contributors
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![4, 3]);
    }
}

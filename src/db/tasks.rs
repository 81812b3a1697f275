use super::*;

const TASK_SELECT: &str = "SELECT t.id, t.project_id, p.name, t.title, t.description,
        t.status, t.priority, t.due_date, t.created_at, t.updated_at,
        t.assignee_id, u.id, u.full_name, u.email, u.role
     FROM project_tasks t
     LEFT JOIN projects p ON p.id = t.project_id
     LEFT JOIN accounts u ON u.id = t.assignee_id";

impl BackofficeDb {
    // =========================================================================
    // Project tasks
    // =========================================================================

    /// Insert a task. Status defaults to TODO and priority to MEDIUM.
    pub fn insert_task(&self, task: &NewTask) -> Result<Task, DbError> {
        self.conn.execute(
            "INSERT INTO project_tasks (
                project_id, assignee_id, title, description, status, priority, due_date, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                task.project_id,
                task.assignee_id,
                task.title.trim(),
                task.description,
                task.status.unwrap_or(TaskStatus::Todo),
                task.priority.unwrap_or(TaskPriority::Medium),
                task.due_date,
                Utc::now(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_task(id)?
            .ok_or_else(|| DbError::Integrity(format!("task {id} vanished after insert")))
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>, DbError> {
        let sql = format!("{TASK_SELECT} WHERE t.id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::map_task_row)
            .optional()?)
    }

    /// Apply a partial update. `clear_due_date` wins over a supplied due
    /// date; a supplied assignee wins over `clear_assignee`.
    pub fn update_task(&self, id: i64, update: &TaskUpdate) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE project_tasks SET
                title = COALESCE(?2, title),
                description = COALESCE(?3, description),
                status = COALESCE(?4, status),
                priority = COALESCE(?5, priority),
                due_date = CASE WHEN ?6 THEN NULL ELSE COALESCE(?7, due_date) END,
                assignee_id = CASE
                    WHEN ?9 IS NOT NULL THEN ?9
                    WHEN ?8 THEN NULL
                    ELSE assignee_id
                END,
                updated_at = ?10
             WHERE id = ?1",
            params![
                id,
                update.title.as_deref().map(str::trim),
                update.description,
                update.status,
                update.priority,
                update.clear_due_date,
                update.due_date,
                update.clear_assignee,
                update.assignee_id,
                Utc::now(),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_task(&self, id: i64) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM project_tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn all_tasks(&self) -> Result<Vec<Task>, DbError> {
        let sql = format!("{TASK_SELECT} ORDER BY t.project_id, t.id");
        self.query_tasks(&sql, params![])
    }

    pub fn tasks_for_project(&self, project_id: i64) -> Result<Vec<Task>, DbError> {
        let sql = format!("{TASK_SELECT} WHERE t.project_id = ?1 ORDER BY t.id");
        self.query_tasks(&sql, params![project_id])
    }

    pub fn tasks_for_assignee(&self, assignee_id: i64) -> Result<Vec<Task>, DbError> {
        let sql = format!(
            "{TASK_SELECT} WHERE t.assignee_id = ?1 ORDER BY t.due_date IS NULL, t.due_date, t.id"
        );
        self.query_tasks(&sql, params![assignee_id])
    }

    pub fn tasks_for_project_and_status(
        &self,
        project_id: i64,
        status: TaskStatus,
    ) -> Result<Vec<Task>, DbError> {
        let sql = format!("{TASK_SELECT} WHERE t.project_id = ?1 AND t.status = ?2 ORDER BY t.id");
        self.query_tasks(&sql, params![project_id, status])
    }

    fn query_tasks<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Task>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::map_task_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn map_task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
        let id: i64 = row.get(0)?;
        let project_id: i64 = row.get(1)?;
        let project_name: Option<String> = row.get(2)?;
        let project_name = project_name.ok_or_else(|| {
            dangling(2, format!("task {id} references missing project {project_id}"))
        })?;
        Ok(Task {
            id,
            project_id,
            project_name,
            title: row.get(3)?,
            description: row.get(4)?,
            status: row.get(5)?,
            priority: row.get(6)?,
            due_date: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
            assignee: staff_at(row, 10, 11, "task assignee")?,
        })
    }
}

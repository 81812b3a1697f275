use super::*;

/// Project columns plus the joined client (columns 12..=15).
const PROJECT_SELECT: &str = "SELECT p.id, p.name, p.summary, p.details, p.status,
        p.progress_percentage, p.start_date, p.target_date, p.highlighted,
        p.created_at, p.updated_at, p.client_id,
        c.id, c.full_name, c.email, c.role
     FROM projects p
     LEFT JOIN accounts c ON c.id = p.client_id";

impl BackofficeDb {
    // =========================================================================
    // Projects
    // =========================================================================

    /// Insert a requested project: PLANNING at 5%, starting today.
    pub fn insert_project(
        &self,
        request: &NewProjectRequest,
        client_id: Option<i64>,
    ) -> Result<Project, DbError> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO projects (
                name, summary, details, status, progress_percentage,
                start_date, target_date, highlighted, client_id, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, 5, ?5, ?6, 0, ?7, ?8, ?8)",
            params![
                request.name.trim(),
                request.summary.trim(),
                request.details,
                ProjectStatus::Planning,
                now.date_naive(),
                request.target_date,
                client_id,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_project(id)?
            .ok_or_else(|| DbError::Integrity(format!("project {id} vanished after insert")))
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>, DbError> {
        let sql = format!("{PROJECT_SELECT} WHERE p.id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::map_project_row)
            .optional()?)
    }

    pub fn all_projects(&self) -> Result<Vec<Project>, DbError> {
        let sql = format!("{PROJECT_SELECT} ORDER BY p.name COLLATE NOCASE, p.id");
        self.query_projects(&sql, params![])
    }

    pub fn projects_for_client(&self, client_id: i64) -> Result<Vec<Project>, DbError> {
        let sql = format!(
            "{PROJECT_SELECT} WHERE p.client_id = ?1 ORDER BY p.name COLLATE NOCASE, p.id"
        );
        self.query_projects(&sql, params![client_id])
    }

    pub fn highlighted_projects(&self) -> Result<Vec<Project>, DbError> {
        let sql = format!(
            "{PROJECT_SELECT} WHERE p.highlighted = 1 ORDER BY p.updated_at DESC, p.id DESC"
        );
        self.query_projects(&sql, params![])
    }

    /// Look up a project by exact name (case-insensitive).
    pub fn project_by_name(&self, name: &str) -> Result<Option<Project>, DbError> {
        let sql = format!("{PROJECT_SELECT} WHERE p.name = ?1 COLLATE NOCASE ORDER BY p.id LIMIT 1");
        Ok(self
            .conn
            .query_row(&sql, params![name.trim()], Self::map_project_row)
            .optional()?)
    }

    /// Write the delivery state of a project. `None` keeps the stored value.
    pub fn update_project_state(
        &self,
        id: i64,
        status: ProjectStatus,
        progress_percentage: Option<u8>,
        target_date: Option<NaiveDate>,
    ) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE projects SET
                status = ?2,
                progress_percentage = COALESCE(?3, progress_percentage),
                target_date = COALESCE(?4, target_date),
                updated_at = ?5
             WHERE id = ?1",
            params![id, status, progress_percentage, target_date, Utc::now()],
        )?;
        Ok(changed > 0)
    }

    pub fn set_project_highlighted(&self, id: i64, highlighted: bool) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE projects SET highlighted = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, highlighted as i32, Utc::now()],
        )?;
        Ok(changed > 0)
    }

    fn query_projects<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<Project>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::map_project_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn map_project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            summary: row.get(2)?,
            details: row.get(3)?,
            status: row.get(4)?,
            progress_percentage: row.get(5)?,
            start_date: row.get(6)?,
            target_date: row.get(7)?,
            highlighted: row.get::<_, i32>(8)? != 0,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
            client: staff_at(row, 11, 12, "project client")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{seed_account, seed_project, test_db};
    use super::*;

    #[test]
    fn test_insert_sets_request_defaults() {
        let db = test_db();
        let customer = seed_account(&db, "Cora", Role::Customer);
        let project = seed_project(&db, "Portal", Some(customer.id));
        assert_eq!(project.status, ProjectStatus::Planning);
        assert_eq!(project.progress_percentage, 5);
        assert_eq!(project.start_date, Some(Utc::now().date_naive()));
        assert_eq!(project.client_id(), Some(customer.id));
        assert_eq!(project.client.as_ref().map(|c| c.role), Some(Role::Customer));
    }

    #[test]
    fn test_projects_for_client_and_by_name() {
        let db = test_db();
        let customer = seed_account(&db, "Cora", Role::Customer);
        seed_project(&db, "beta", Some(customer.id));
        seed_project(&db, "Alpha", Some(customer.id));
        seed_project(&db, "Internal", None);

        let names: Vec<String> = db
            .projects_for_client(customer.id)
            .expect("query")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "beta"]);

        let found = db.project_by_name("INTERNAL").expect("query").expect("project");
        assert!(found.client.is_none());
        assert_eq!(db.all_projects().expect("query").len(), 3);
    }

    #[test]
    fn test_update_state_keeps_unset_fields() {
        let db = test_db();
        let project = seed_project(&db, "Portal", None);
        assert!(db
            .update_project_state(project.id, ProjectStatus::Testing, Some(80), None)
            .expect("update"));
        assert!(db
            .update_project_state(project.id, ProjectStatus::Deployed, None, None)
            .expect("update"));
        let reloaded = db.get_project(project.id).expect("query").expect("project");
        assert_eq!(reloaded.status, ProjectStatus::Deployed);
        assert_eq!(reloaded.progress_percentage, 80);
    }

    #[test]
    fn test_highlighted_projects() {
        let db = test_db();
        let shown = seed_project(&db, "Showcase", None);
        seed_project(&db, "Quiet", None);
        db.set_project_highlighted(shown.id, true).expect("highlight");
        let highlighted = db.highlighted_projects().expect("query");
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].id, shown.id);
    }

    #[test]
    fn test_dangling_client_is_integrity_error() {
        let db = test_db();
        let project = seed_project(&db, "Orphan", None);
        db.conn_ref()
            .execute_batch("PRAGMA foreign_keys = OFF;")
            .expect("pragma");
        db.conn_ref()
            .execute(
                "UPDATE projects SET client_id = 4242 WHERE id = ?1",
                params![project.id],
            )
            .expect("raw update");
        let err = db.get_project(project.id).unwrap_err();
        assert!(matches!(err, DbError::Integrity(_)), "got {err:?}");
    }
}

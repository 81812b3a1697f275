use super::*;

const ASSIGNMENT_SELECT: &str = "SELECT a.id, a.project_id, a.assignment_role, a.assigned_at,
        a.member_id, m.id, m.full_name, m.email, m.role
     FROM project_assignments a
     LEFT JOIN accounts m ON m.id = a.member_id";

const ASSIGNMENT_ORDER: &str = "ORDER BY a.project_id, m.full_name COLLATE NOCASE, a.id";

impl BackofficeDb {
    // =========================================================================
    // Project assignments
    // =========================================================================

    /// Link a member to a project. The `(project_id, member_id)` pair is a
    /// schema-level unique key, so a concurrent duplicate loses here rather
    /// than slipping past a pre-check.
    pub fn insert_assignment(
        &self,
        project_id: i64,
        member_id: i64,
        assignment_role: Role,
    ) -> Result<Assignment, DbError> {
        self.conn
            .execute(
                "INSERT INTO project_assignments (project_id, member_id, assignment_role, assigned_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![project_id, member_id, assignment_role, Utc::now()],
            )
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation(_) => {
                    DbError::UniqueViolation("Member already assigned to project".to_string())
                }
                other => other,
            })?;
        let id = self.conn.last_insert_rowid();
        self.get_assignment(id)?
            .ok_or_else(|| DbError::Integrity(format!("assignment {id} vanished after insert")))
    }

    pub fn get_assignment(&self, id: i64) -> Result<Option<Assignment>, DbError> {
        let sql = format!("{ASSIGNMENT_SELECT} WHERE a.id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::map_assignment_row)
            .optional()?)
    }

    pub fn all_assignments(&self) -> Result<Vec<Assignment>, DbError> {
        let sql = format!("{ASSIGNMENT_SELECT} {ASSIGNMENT_ORDER}");
        self.query_assignments(&sql, params![])
    }

    pub fn assignments_for_project(&self, project_id: i64) -> Result<Vec<Assignment>, DbError> {
        let sql = format!("{ASSIGNMENT_SELECT} WHERE a.project_id = ?1 {ASSIGNMENT_ORDER}");
        self.query_assignments(&sql, params![project_id])
    }

    /// Assignments held by one member, oldest first.
    pub fn assignments_for_member(&self, member_id: i64) -> Result<Vec<Assignment>, DbError> {
        let sql = format!(
            "{ASSIGNMENT_SELECT} WHERE a.member_id = ?1 ORDER BY a.assigned_at, a.id"
        );
        self.query_assignments(&sql, params![member_id])
    }

    pub fn assignment_for_pair(
        &self,
        project_id: i64,
        member_id: i64,
    ) -> Result<Option<Assignment>, DbError> {
        let sql = format!("{ASSIGNMENT_SELECT} WHERE a.project_id = ?1 AND a.member_id = ?2");
        Ok(self
            .conn
            .query_row(&sql, params![project_id, member_id], Self::map_assignment_row)
            .optional()?)
    }

    pub fn assignments_by_role(&self, assignment_role: Role) -> Result<Vec<Assignment>, DbError> {
        let sql = format!("{ASSIGNMENT_SELECT} WHERE a.assignment_role = ?1 {ASSIGNMENT_ORDER}");
        self.query_assignments(&sql, params![assignment_role])
    }

    pub fn delete_assignment(&self, id: i64) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM project_assignments WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn query_assignments<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<Assignment>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::map_assignment_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn map_assignment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Assignment> {
        let id: i64 = row.get(0)?;
        let member = staff_at(row, 4, 5, "assignment member")?
            .ok_or_else(|| dangling(4, format!("assignment {id} has no member")))?;
        Ok(Assignment {
            id,
            project_id: row.get(1)?,
            assignment_role: row.get(2)?,
            assigned_at: row.get(3)?,
            member,
        })
    }
}

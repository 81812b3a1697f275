use super::*;

const EVENT_SELECT: &str = "SELECT e.id, e.project_id, e.event_type, e.title, e.description,
        e.occurred_at, e.actor_id, a.id, a.full_name, a.email, a.role
     FROM project_timeline_events e
     LEFT JOIN accounts a ON a.id = e.actor_id";

impl BackofficeDb {
    // =========================================================================
    // Project timeline
    // =========================================================================

    pub fn insert_event(
        &self,
        project_id: i64,
        event_type: TimelineEventType,
        title: &str,
        description: Option<&str>,
        actor_id: Option<i64>,
    ) -> Result<TimelineEvent, DbError> {
        self.conn.execute(
            "INSERT INTO project_timeline_events
                (project_id, actor_id, event_type, title, description, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![project_id, actor_id, event_type, title.trim(), description, Utc::now()],
        )?;
        let id = self.conn.last_insert_rowid();
        let sql = format!("{EVENT_SELECT} WHERE e.id = ?1");
        self.conn
            .query_row(&sql, params![id], Self::map_event_row)
            .optional()?
            .ok_or_else(|| DbError::Integrity(format!("timeline event {id} vanished after insert")))
    }

    /// Events for one project, newest first.
    pub fn events_for_project(&self, project_id: i64) -> Result<Vec<TimelineEvent>, DbError> {
        self.events_for_projects(&[project_id])
    }

    /// Events across several projects, newest first; equal timestamps keep
    /// insertion order.
    pub fn events_for_projects(&self, project_ids: &[i64]) -> Result<Vec<TimelineEvent>, DbError> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; project_ids.len()].join(", ");
        let sql = format!(
            "{EVENT_SELECT} WHERE e.project_id IN ({placeholders})
             ORDER BY e.occurred_at DESC, e.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(project_ids.iter()),
            Self::map_event_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn map_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TimelineEvent> {
        Ok(TimelineEvent {
            id: row.get(0)?,
            project_id: row.get(1)?,
            event_type: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            occurred_at: row.get(5)?,
            actor: staff_at(row, 6, 7, "timeline actor")?,
        })
    }
}

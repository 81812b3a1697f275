use super::*;

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, type, title, message, project_id, task_id, read_flag, created_at";

impl BackofficeDb {
    // =========================================================================
    // Notification ledger
    // =========================================================================

    /// Append a notification. The ledger stamps the timestamp and starts it unread.
    pub fn insert_notification(&self, n: &NewNotification) -> Result<Notification, DbError> {
        self.conn.execute(
            "INSERT INTO user_notifications (
                recipient_id, type, title, message, project_id, task_id, read_flag, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            params![
                n.recipient_id,
                n.notification_type,
                n.title,
                n.message,
                n.project_id,
                n.task_id,
                Utc::now(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.find_notification(id, n.recipient_id)?
            .ok_or_else(|| DbError::Integrity(format!("notification {id} vanished after insert")))
    }

    /// A recipient's notifications, newest first. `limit` of `None` returns all.
    pub fn notifications_for_recipient(
        &self,
        recipient_id: i64,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>, DbError> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM user_notifications
             WHERE recipient_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![recipient_id, limit], Self::map_notification_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn unread_count(&self, recipient_id: i64) -> Result<u32, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM user_notifications WHERE recipient_id = ?1 AND read_flag = 0",
            params![recipient_id],
            |row| row.get(0),
        )?)
    }

    /// Look up a notification only if it belongs to `recipient_id`.
    pub fn find_notification(
        &self,
        id: i64,
        recipient_id: i64,
    ) -> Result<Option<Notification>, DbError> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM user_notifications
             WHERE id = ?1 AND recipient_id = ?2"
        );
        Ok(self
            .conn
            .query_row(&sql, params![id, recipient_id], Self::map_notification_row)
            .optional()?)
    }

    /// Mark one notification read. Returns false when `id` does not belong
    /// to `recipient_id`. Already-read notifications stay read.
    pub fn mark_notification_read(&self, id: i64, recipient_id: i64) -> Result<bool, DbError> {
        let matched = self.conn.execute(
            "UPDATE user_notifications SET read_flag = 1 WHERE id = ?1 AND recipient_id = ?2",
            params![id, recipient_id],
        )?;
        Ok(matched > 0)
    }

    /// Mark every unread notification of a recipient read. Returns the number flipped.
    pub fn mark_all_notifications_read(&self, recipient_id: i64) -> Result<usize, DbError> {
        Ok(self.conn.execute(
            "UPDATE user_notifications SET read_flag = 1 WHERE recipient_id = ?1 AND read_flag = 0",
            params![recipient_id],
        )?)
    }

    fn map_notification_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
        Ok(Notification {
            id: row.get(0)?,
            recipient_id: row.get(1)?,
            notification_type: row.get(2)?,
            title: row.get(3)?,
            message: row.get(4)?,
            project_id: row.get(5)?,
            task_id: row.get(6)?,
            read: row.get::<_, i32>(7)? != 0,
            created_at: row.get(8)?,
        })
    }
}

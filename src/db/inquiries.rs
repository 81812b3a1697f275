use super::*;

const INQUIRY_COLUMNS: &str = "id, full_name, email, phone, company, message, status,
        assigned_to, source, project_id, created_at, updated_at";

impl BackofficeDb {
    // =========================================================================
    // Inquiries
    // =========================================================================

    /// Record an inbound inquiry in status NEW.
    pub fn insert_inquiry(&self, inquiry: &NewInquiry) -> Result<Inquiry, DbError> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO inquiries (
                full_name, email, phone, company, message, status, source, project_id,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                inquiry.full_name.trim(),
                inquiry.email.trim().to_lowercase(),
                inquiry.phone,
                inquiry.company,
                inquiry.message,
                InquiryStatus::New,
                inquiry.source,
                inquiry.project_id,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_inquiry(id)?
            .ok_or_else(|| DbError::Integrity(format!("inquiry {id} vanished after insert")))
    }

    pub fn get_inquiry(&self, id: i64) -> Result<Option<Inquiry>, DbError> {
        let sql = format!("SELECT {INQUIRY_COLUMNS} FROM inquiries WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::map_inquiry_row)
            .optional()?)
    }

    pub fn all_inquiries(&self) -> Result<Vec<Inquiry>, DbError> {
        let sql = format!("SELECT {INQUIRY_COLUMNS} FROM inquiries ORDER BY created_at DESC, id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![], Self::map_inquiry_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Inquiries linked to any of `project_ids`, newest first.
    pub fn inquiries_for_projects(&self, project_ids: &[i64]) -> Result<Vec<Inquiry>, DbError> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; project_ids.len()].join(", ");
        let sql = format!(
            "SELECT {INQUIRY_COLUMNS} FROM inquiries WHERE project_id IN ({placeholders})
             ORDER BY created_at DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(project_ids.iter()),
            Self::map_inquiry_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn update_inquiry_status(
        &self,
        id: i64,
        status: InquiryStatus,
        assigned_to: Option<&str>,
    ) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE inquiries SET status = ?2, assigned_to = COALESCE(?3, assigned_to), updated_at = ?4
             WHERE id = ?1",
            params![id, status, assigned_to, Utc::now()],
        )?;
        Ok(changed > 0)
    }

    fn map_inquiry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Inquiry> {
        Ok(Inquiry {
            id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            company: row.get(4)?,
            message: row.get(5)?,
            status: row.get(6)?,
            assigned_to: row.get(7)?,
            source: row.get(8)?,
            project_id: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{seed_project, test_db};
    use super::*;

    fn inquiry(project_id: Option<i64>, message: &str) -> NewInquiry {
        NewInquiry {
            full_name: "Pat Buyer".into(),
            email: "Pat@Buyer.io".into(),
            phone: None,
            company: Some("Buyer Inc".into()),
            message: message.into(),
            source: Some("website".into()),
            project_id,
        }
    }

    #[test]
    fn test_insert_and_scope_by_project() {
        let db = test_db();
        let portal = seed_project(&db, "Portal", None);
        let other = seed_project(&db, "Other", None);

        let first = db.insert_inquiry(&inquiry(Some(portal.id), "first")).expect("insert");
        assert_eq!(first.status, InquiryStatus::New);
        assert_eq!(first.email, "pat@buyer.io");
        db.insert_inquiry(&inquiry(Some(portal.id), "second")).expect("insert");
        db.insert_inquiry(&inquiry(Some(other.id), "elsewhere")).expect("insert");
        db.insert_inquiry(&inquiry(None, "unlinked")).expect("insert");

        let scoped = db.inquiries_for_projects(&[portal.id]).expect("query");
        let messages: Vec<&str> = scoped.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "first"]);
    }

    #[test]
    fn test_update_status() {
        let db = test_db();
        let created = db.insert_inquiry(&inquiry(None, "hello")).expect("insert");
        assert!(db
            .update_inquiry_status(created.id, InquiryStatus::Quoted, Some("sales"))
            .expect("update"));
        let reloaded = db.get_inquiry(created.id).expect("query").expect("inquiry");
        assert_eq!(reloaded.status, InquiryStatus::Quoted);
        assert_eq!(reloaded.assigned_to.as_deref(), Some("sales"));
    }
}

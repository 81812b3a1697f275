use super::*;

const ACCOUNT_COLUMNS: &str = "id, full_name, email, role, active, created_at, updated_at";

impl BackofficeDb {
    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert an account. Email is stored lowercased; a duplicate (in any
    /// case) surfaces as `DbError::UniqueViolation`.
    pub fn insert_account(&self, account: &NewAccount) -> Result<Account, DbError> {
        let now = Utc::now();
        let email = account.email.trim().to_lowercase();
        self.conn
            .execute(
                "INSERT INTO accounts (full_name, email, role, active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 1, ?4, ?4)",
                params![account.full_name.trim(), email, account.role, now],
            )
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation(_) => {
                    DbError::UniqueViolation(format!("Email already registered: {email}"))
                }
                other => other,
            })?;
        let id = self.conn.last_insert_rowid();
        self.get_account(id)?
            .ok_or_else(|| DbError::Integrity(format!("account {id} vanished after insert")))
    }

    pub fn get_account(&self, id: i64) -> Result<Option<Account>, DbError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::map_account_row)
            .optional()?)
    }

    /// Look up an account by email (case-insensitive).
    pub fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, DbError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![email.trim()], Self::map_account_row)
            .optional()?)
    }

    pub fn exists_by_email(&self, email: &str) -> Result<bool, DbError> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = ?1)",
            params![email.trim()],
            |row| row.get(0),
        )?)
    }

    /// Accounts holding `role`, ordered by name.
    pub fn accounts_by_role(&self, role: Role) -> Result<Vec<Account>, DbError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE role = ?1
             ORDER BY full_name COLLATE NOCASE, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![role], Self::map_account_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn all_accounts(&self) -> Result<Vec<Account>, DbError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY full_name COLLATE NOCASE, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_account_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Apply a partial update. Fields left `None` keep their stored value.
    /// Returns false when no account has `id`.
    pub fn update_account_fields(&self, id: i64, update: &AccountUpdate) -> Result<bool, DbError> {
        let email = update.email.as_ref().map(|e| e.trim().to_lowercase());
        let changed = self
            .conn
            .execute(
                "UPDATE accounts SET
                    full_name = COALESCE(?2, full_name),
                    email = COALESCE(?3, email),
                    role = COALESCE(?4, role),
                    updated_at = ?5
                 WHERE id = ?1",
                params![
                    id,
                    update.full_name.as_deref().map(str::trim),
                    email,
                    update.role,
                    Utc::now()
                ],
            )
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation(_) => DbError::UniqueViolation(format!(
                    "Email already registered: {}",
                    email.as_deref().unwrap_or_default()
                )),
                other => other,
            })?;
        Ok(changed > 0)
    }

    pub fn set_account_active(&self, id: i64, active: bool) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE accounts SET active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, active as i32, Utc::now()],
        )?;
        Ok(changed > 0)
    }

    /// Delete an account. Assignments and notifications cascade; project
    /// client and task assignee references are cleared.
    pub fn delete_account(&self, id: i64) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn map_account_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
        Ok(Account {
            id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            role: row.get(3)?,
            active: row.get::<_, i32>(4)? != 0,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

//! Shared type definitions for the database layer.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use thiserror::Error;

use crate::roles::Role;
use crate::types::{
    InquiryStatus, NotificationType, ProjectStatus, TaskPriority, TaskStatus, TimelineEventType,
};

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("{0}")]
    UniqueViolation(String),

    #[error("Unknown {column} value: {value}")]
    UnknownValue { column: &'static str, value: String },

    #[error("{0}")]
    Integrity(String),
}

/// Raised while decoding a label column that holds text outside its enum.
#[derive(Debug, Error)]
#[error("unknown {column} value: {value}")]
pub struct UnknownValue {
    pub column: &'static str,
    pub value: String,
}

/// Raised while decoding a row whose foreign key has no target.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DanglingReference(pub String);

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref code, ref message) = err {
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            {
                return DbError::UniqueViolation(
                    message
                        .clone()
                        .unwrap_or_else(|| "Unique constraint violated".to_string()),
                );
            }
        }
        if let rusqlite::Error::FromSqlConversionFailure(_, _, ref inner) = err {
            if let Some(unknown) = inner.downcast_ref::<UnknownValue>() {
                return DbError::UnknownValue {
                    column: unknown.column,
                    value: unknown.value.clone(),
                };
            }
            if let Some(dangling) = inner.downcast_ref::<DanglingReference>() {
                return DbError::Integrity(dangling.0.clone());
            }
        }
        DbError::Sqlite(err)
    }
}

/// Build the conversion error used when a joined row is missing its target.
pub(crate) fn dangling(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Null,
        Box::new(DanglingReference(message)),
    )
}

/// Store an enum as its label and decode strictly: unknown text is an error,
/// never a default.
macro_rules! sql_label {
    ($ty:ty, $column:literal) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                <$ty>::parse(text).ok_or_else(|| {
                    FromSqlError::Other(Box::new(UnknownValue {
                        column: $column,
                        value: text.to_string(),
                    }))
                })
            }
        }
    };
}

sql_label!(Role, "role");
sql_label!(ProjectStatus, "project status");
sql_label!(TaskStatus, "task status");
sql_label!(TaskPriority, "task priority");
sql_label!(TimelineEventType, "timeline event type");
sql_label!(InquiryStatus, "inquiry status");
sql_label!(NotificationType, "notification type");

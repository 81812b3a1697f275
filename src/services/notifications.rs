//! Notification ledger: per-recipient feeds and read-state transitions.
//!
//! A notification only ever moves from unread to read. Lookups are scoped to
//! the recipient, so an id belonging to someone else is reported as missing.

use serde::Serialize;

use crate::db::BackofficeDb;
use crate::error::CoreError;
use crate::types::{NewNotification, Notification, NotificationType, Principal};

use super::non_blank;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: u32,
}

/// The recipient's full feed, newest first, with the live unread count.
pub fn feed(db: &BackofficeDb, recipient_id: i64) -> Result<NotificationFeed, CoreError> {
    db.with_snapshot(|snap| -> Result<NotificationFeed, CoreError> {
        Ok(NotificationFeed {
            notifications: snap.notifications_for_recipient(recipient_id, None)?,
            unread_count: snap.unread_count(recipient_id)?,
        })
    })
}

pub fn unread_count(db: &BackofficeDb, recipient_id: i64) -> Result<u32, CoreError> {
    Ok(db.unread_count(recipient_id)?)
}

/// Mark one of the recipient's notifications read and return it.
pub fn mark_read(
    db: &BackofficeDb,
    recipient_id: i64,
    notification_id: i64,
) -> Result<Notification, CoreError> {
    db.with_transaction(|tx| -> Result<Notification, CoreError> {
        if !tx.mark_notification_read(notification_id, recipient_id)? {
            return Err(CoreError::not_found("Notification", notification_id));
        }
        tx.find_notification(notification_id, recipient_id)?
            .ok_or_else(|| CoreError::not_found("Notification", notification_id))
    })
}

/// Mark every unread notification of the recipient read. Returns how many
/// changed.
pub fn mark_all_read(db: &BackofficeDb, recipient_id: i64) -> Result<usize, CoreError> {
    let changed = db.with_transaction(|tx| -> Result<usize, CoreError> {
        Ok(tx.mark_all_notifications_read(recipient_id)?)
    })?;
    log::debug!("Marked {} notifications read for account {}", changed, recipient_id);
    Ok(changed)
}

/// Post a free-form notice to `recipient_id` on behalf of an admin.
pub fn send_custom(
    db: &BackofficeDb,
    actor: &Principal,
    recipient_id: i64,
    title: &str,
    message: Option<&str>,
) -> Result<Notification, CoreError> {
    crate::policy::may_administer_projects(actor)?;
    let title = non_blank(title, "Notification title")?;
    let notification = db.with_transaction(|tx| -> Result<Notification, CoreError> {
        super::require_account(tx, recipient_id)?;
        Ok(tx.insert_notification(&NewNotification {
            recipient_id,
            notification_type: NotificationType::Custom,
            title,
            message: message.map(str::to_string),
            project_id: None,
            task_id: None,
        })?)
    })?;
    log::info!("Account {} notified account {}", actor.id, recipient_id);
    Ok(notification)
}

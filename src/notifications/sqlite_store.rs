use crate::sqlite_column;
use crate::sqlite_persistence::{open_versioned, Column, SqlType, Table, VersionedSchema};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::models::{
    InvestigationSnapshot, NewNotification, Notification, NotificationPage, NotificationType,
    Page, SenderSnapshot,
};
use super::store::NotificationStore;

/// V 0
const NOTIFICATION_TABLE_V_0: Table = Table {
    name: "notification",
    columns: &[
        // Insertion order, used for newest-first listing.
        sqlite_column!("seq", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("notification_type", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("message", &SqlType::Text, non_null = true),
        sqlite_column!(
            "is_read",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("receiver_id", &SqlType::Text, non_null = true),
        sqlite_column!("sender_id", &SqlType::Text, non_null = true),
        sqlite_column!("investigation_id", &SqlType::Text),
        sqlite_column!("comment_id", &SqlType::Text),
        sqlite_column!("created_at", &SqlType::Text, non_null = true),
        sqlite_column!("sender_name", &SqlType::Text, non_null = true),
        sqlite_column!("investigation_title", &SqlType::Text),
    ],
    indices: &[
        ("idx_notification_receiver_read", "receiver_id, is_read"),
        ("idx_notification_receiver_seq", "receiver_id, seq"),
    ],
};

pub(crate) const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[NOTIFICATION_TABLE_V_0],
    migration: None,
}];

const SELECT_COLUMNS: &str = "id, notification_type, title, message, is_read, receiver_id, \
    sender_id, investigation_id, comment_id, created_at, sender_name, investigation_title";

fn notification_from_row(row: &Row) -> rusqlite::Result<Notification> {
    let notification_type: String = row.get(1)?;
    let notification_type = NotificationType::from_str(&notification_type)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let created_at: String = row.get(9)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Notification {
        id: row.get(0)?,
        notification_type,
        title: row.get(2)?,
        message: row.get(3)?,
        is_read: row.get::<_, i64>(4)? != 0,
        receiver_id: row.get(5)?,
        sender_id: row.get(6)?,
        investigation_id: row.get(7)?,
        comment_id: row.get(8)?,
        created_at,
        sender: SenderSnapshot { name: row.get(10)? },
        investigation: row
            .get::<_, Option<String>>(11)?
            .map(|title| InvestigationSnapshot { title }),
    })
}

/// Table backed notification store. Appends are single inserts and marking as
/// read is a single conditional update, so there is no whole-collection
/// rewrite to race on.
#[derive(Clone)]
pub struct SqliteNotificationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteNotificationStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteNotificationStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn get_by_id(conn: &Connection, notification_id: &str) -> Result<Option<Notification>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                SELECT_COLUMNS, NOTIFICATION_TABLE_V_0.name
            ),
            params![notification_id],
            notification_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to read notification {}", notification_id))
    }
}

impl NotificationStore for SqliteNotificationStore {
    fn append(&self, notification: NewNotification) -> Result<Notification> {
        let notification =
            notification.into_notification(uuid::Uuid::new_v4().to_string(), Utc::now());
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (id, notification_type, title, message, is_read, receiver_id, \
                 sender_id, investigation_id, comment_id, created_at, sender_name, \
                 investigation_title) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                NOTIFICATION_TABLE_V_0.name
            ),
            params![
                notification.id,
                notification.notification_type.as_str(),
                notification.title,
                notification.message,
                notification.receiver_id,
                notification.sender_id,
                notification.investigation_id,
                notification.comment_id,
                notification
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                notification.sender.name,
                notification.investigation.as_ref().map(|i| i.title.as_str()),
            ],
        )
        .with_context(|| {
            format!(
                "Failed to store notification for receiver {}",
                notification.receiver_id
            )
        })?;
        debug!(
            "Stored {} notification {} for receiver {}",
            notification.notification_type, notification.id, notification.receiver_id
        );
        Ok(notification)
    }

    fn mark_read(&self, notification_id: &str, user_id: &str) -> Result<Option<Notification>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let updated = tx.execute(
            &format!(
                "UPDATE {} SET is_read = 1 WHERE id = ?1 AND receiver_id = ?2",
                NOTIFICATION_TABLE_V_0.name
            ),
            params![notification_id, user_id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        let notification = Self::get_by_id(&tx, notification_id)?;
        tx.commit()?;
        Ok(notification)
    }

    fn list_for_user(&self, user_id: &str, page: Page) -> Result<NotificationPage> {
        let conn = self.conn.lock().unwrap();
        let total: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE receiver_id = ?1",
                NOTIFICATION_TABLE_V_0.name
            ),
            params![user_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE receiver_id = ?1 ORDER BY seq DESC LIMIT ?2 OFFSET ?3",
            SELECT_COLUMNS, NOTIFICATION_TABLE_V_0.name
        ))?;
        let notifications = stmt
            .query_map(
                params![user_id, page.limit as i64, page.offset() as i64],
                notification_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("Failed to list notifications of user {}", user_id))?;

        Ok(NotificationPage::new(notifications, total as usize, page))
    }

    fn list_unread_for_user(&self, user_id: &str) -> Result<Vec<Notification>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE receiver_id = ?1 AND is_read = 0 ORDER BY seq DESC",
            SELECT_COLUMNS, NOTIFICATION_TABLE_V_0.name
        ))?;
        let notifications = stmt
            .query_map(params![user_id], notification_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("Failed to list unread notifications of user {}", user_id))?;
        Ok(notifications)
    }

    fn count_unread_for_user(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE receiver_id = ?1 AND is_read = 0",
                NOTIFICATION_TABLE_V_0.name
            ),
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::store::contract;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteNotificationStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let temp_file_path = temp_dir.path().join("notifications.db");
        let store = SqliteNotificationStore::new(&temp_file_path).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_appended_is_unread_until_marked() {
        let (store, _temp_dir) = create_tmp_store();
        contract::appended_is_unread_until_marked(&store);
    }

    #[test]
    fn test_foreign_mark_read_is_not_found() {
        let (store, _temp_dir) = create_tmp_store();
        contract::foreign_mark_read_is_not_found(&store);
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let (store, _temp_dir) = create_tmp_store();
        contract::mark_read_is_idempotent(&store);
    }

    #[test]
    fn test_lists_newest_first() {
        let (store, _temp_dir) = create_tmp_store();
        contract::lists_newest_first(&store);
    }

    #[test]
    fn test_paginates() {
        let (store, _temp_dir) = create_tmp_store();
        contract::paginates(&store);
    }

    #[test]
    fn test_farthest_page_is_empty() {
        let (store, _temp_dir) = create_tmp_store();
        contract::farthest_page_is_empty(&store);
    }

    #[test]
    fn test_isolates_receivers() {
        let (store, _temp_dir) = create_tmp_store();
        contract::isolates_receivers(&store);
    }

    #[test]
    fn test_assigns_unique_ids() {
        let (store, _temp_dir) = create_tmp_store();
        contract::assigns_unique_ids(&store);
    }

    #[test]
    fn test_comment_scenario() {
        let (store, _temp_dir) = create_tmp_store();
        contract::comment_scenario(&store);
    }

    #[test]
    fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notifications.db");

        let created = {
            let store = SqliteNotificationStore::new(&path).unwrap();
            let created = store.append(contract::new_notification("u1", "A")).unwrap();
            store.mark_read(&created.id, "u1").unwrap();
            created
        };

        let store = SqliteNotificationStore::new(&path).unwrap();
        let page = store.list_for_user("u1", Page::default()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.notifications[0].id, created.id);
        assert_eq!(page.notifications[0].created_at, created.created_at);
        assert!(page.notifications[0].is_read);
    }

    #[test]
    fn test_unknown_stored_type_is_an_error() {
        let (store, _temp_dir) = create_tmp_store();
        let created = store.append(contract::new_notification("u1", "A")).unwrap();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "UPDATE notification SET notification_type = 'GARBAGE' WHERE id = ?1",
                params![created.id],
            )
            .unwrap();
        }

        assert!(store.list_unread_for_user("u1").is_err());
    }
}

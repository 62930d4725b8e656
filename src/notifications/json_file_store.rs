use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::models::{NewNotification, Notification, NotificationPage, Page};
use super::store::NotificationStore;

/// On-disk layout: `{ "notifications": [...] }`, newest first.
#[derive(Debug, Default, Serialize, Deserialize)]
struct NotificationsDocument {
    notifications: Vec<Notification>,
}

/// Notification store backed by a single JSON document.
///
/// The document is loaded once and kept in memory behind a mutex, every
/// mutation rewrites the whole file while holding it. Writes go to a temporary
/// file in the same directory which is then renamed over the document, so a
/// crash mid-write leaves the previous version intact. If the write fails the
/// in-memory change is undone.
pub struct JsonFileNotificationStore {
    path: PathBuf,
    document: Mutex<NotificationsDocument>,
}

impl JsonFileNotificationStore {
    pub fn new<T: AsRef<Path>>(path: T) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                info!("Creating notifications directory {:?}", parent);
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }

        let document = if path.exists() {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open notifications file {:?}", path))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse notifications file {:?}", path))?
        } else {
            info!("Initializing empty notifications file at {:?}", path);
            let document = NotificationsDocument::default();
            write_atomically(&path, &document)?;
            document
        };

        Ok(JsonFileNotificationStore {
            path,
            document: Mutex::new(document),
        })
    }

    fn persist(&self, document: &NotificationsDocument) -> Result<()> {
        write_atomically(&self.path, document)
    }
}

fn write_atomically(path: &Path, document: &NotificationsDocument) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp_file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
    {
        let mut writer = BufWriter::new(temp_file.as_file());
        serde_json::to_writer_pretty(&mut writer, document)?;
        writer.flush()?;
    }
    temp_file.as_file().sync_all()?;
    temp_file
        .persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace notifications file {:?}", path))?;
    Ok(())
}

impl NotificationStore for JsonFileNotificationStore {
    fn append(&self, notification: NewNotification) -> Result<Notification> {
        let notification =
            notification.into_notification(uuid::Uuid::new_v4().to_string(), Utc::now());
        let mut document = self.document.lock().unwrap();
        document.notifications.insert(0, notification.clone());
        if let Err(err) = self.persist(&document) {
            document.notifications.remove(0);
            return Err(err);
        }
        debug!(
            "Stored {} notification {} for receiver {}",
            notification.notification_type, notification.id, notification.receiver_id
        );
        Ok(notification)
    }

    fn mark_read(&self, notification_id: &str, user_id: &str) -> Result<Option<Notification>> {
        let mut document = self.document.lock().unwrap();
        let position = document
            .notifications
            .iter()
            .position(|n| n.id == notification_id && n.receiver_id == user_id);
        let position = match position {
            Some(position) => position,
            None => return Ok(None),
        };

        if document.notifications[position].is_read {
            return Ok(Some(document.notifications[position].clone()));
        }

        document.notifications[position].is_read = true;
        if let Err(err) = self.persist(&document) {
            document.notifications[position].is_read = false;
            return Err(err);
        }
        Ok(Some(document.notifications[position].clone()))
    }

    fn list_for_user(&self, user_id: &str, page: Page) -> Result<NotificationPage> {
        let document = self.document.lock().unwrap();
        let mut total = 0;
        let mut notifications = Vec::new();
        for notification in document
            .notifications
            .iter()
            .filter(|n| n.receiver_id == user_id)
        {
            if total >= page.offset() && notifications.len() < page.limit {
                notifications.push(notification.clone());
            }
            total += 1;
        }
        Ok(NotificationPage::new(notifications, total, page))
    }

    fn list_unread_for_user(&self, user_id: &str) -> Result<Vec<Notification>> {
        let document = self.document.lock().unwrap();
        Ok(document
            .notifications
            .iter()
            .filter(|n| n.receiver_id == user_id && !n.is_read)
            .cloned()
            .collect())
    }

    fn count_unread_for_user(&self, user_id: &str) -> Result<usize> {
        let document = self.document.lock().unwrap();
        Ok(document
            .notifications
            .iter()
            .filter(|n| n.receiver_id == user_id && !n.is_read)
            .count())
    }
}

//! Notification storage trait

use anyhow::Result;

use super::models::{NewNotification, Notification, NotificationPage, Page};

/// Trait for notification storage operations.
///
/// Every method that reads or mutates a user's notifications takes the id of
/// the user performing the request and only ever touches that user's records.
pub trait NotificationStore: Send + Sync {
    /// Stores a new notification, assigning it a fresh id and creation time.
    /// Returns the stored notification.
    fn append(&self, notification: NewNotification) -> Result<Notification>;

    /// Marks a notification as read. Returns the updated notification.
    /// Returns None if the notification doesn't exist or doesn't belong to the user.
    fn mark_read(&self, notification_id: &str, user_id: &str) -> Result<Option<Notification>>;

    /// Returns a page of the user's notifications, newest first.
    fn list_for_user(&self, user_id: &str, page: Page) -> Result<NotificationPage>;

    /// Returns all the user's unread notifications, newest first.
    fn list_unread_for_user(&self, user_id: &str) -> Result<Vec<Notification>>;

    /// Returns the number of unread notifications of the user.
    fn count_unread_for_user(&self, user_id: &str) -> Result<usize>;
}

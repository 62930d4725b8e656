//! Notification data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fallback sender name used when the sender can't be resolved to a user.
pub const SYSTEM_SENDER_NAME: &str = "System";

/// Upper bound for the page size of a paginated listing.
pub const MAX_PAGE_LIMIT: usize = 100;

pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Notification type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    InvestigationCreated,
    InvestigationStatusChanged,
    CommentAdded,
    ProfileUpdated,
}

impl NotificationType {
    pub const ALL: [NotificationType; 4] = [
        NotificationType::InvestigationCreated,
        NotificationType::InvestigationStatusChanged,
        NotificationType::CommentAdded,
        NotificationType::ProfileUpdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::InvestigationCreated => "INVESTIGATION_CREATED",
            NotificationType::InvestigationStatusChanged => "INVESTIGATION_STATUS_CHANGED",
            NotificationType::CommentAdded => "COMMENT_ADDED",
            NotificationType::ProfileUpdated => "PROFILE_UPDATED",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown notification type: {0}")]
pub struct UnknownNotificationType(pub String);

impl FromStr for NotificationType {
    type Err = UnknownNotificationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownNotificationType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderSnapshot {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationSnapshot {
    pub title: String,
}

/// A notification addressed to exactly one receiver.
///
/// `sender` and `investigation` are snapshots taken when the notification was
/// created, they are not updated when the underlying entities change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub receiver_id: String,
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sender: SenderSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigation: Option<InvestigationSnapshot>,
}

/// A notification as handed to the store, before an id and a creation
/// timestamp are assigned. Stored notifications always start unread.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub receiver_id: String,
    pub sender_id: String,
    pub investigation_id: Option<String>,
    pub comment_id: Option<String>,
    pub sender: SenderSnapshot,
    pub investigation: Option<InvestigationSnapshot>,
}

impl NewNotification {
    pub fn into_notification(self, id: String, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id,
            notification_type: self.notification_type,
            title: self.title,
            message: self.message,
            is_read: false,
            receiver_id: self.receiver_id,
            sender_id: self.sender_id,
            investigation_id: self.investigation_id,
            comment_id: self.comment_id,
            created_at,
            sender: self.sender,
            investigation: self.investigation,
        }
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageError {
    #[error("page is out of range")]
    InvalidPage,
    #[error("limit must be at least 1")]
    InvalidLimit,
}

impl Page {
    /// Limits above `MAX_PAGE_LIMIT` are clamped. The end of the requested
    /// window must fit in an SQLite integer.
    pub fn new(page: usize, limit: usize) -> Result<Self, PageError> {
        if limit < 1 {
            return Err(PageError::InvalidLimit);
        }
        let limit = limit.min(MAX_PAGE_LIMIT);
        let end = page
            .checked_sub(1)
            .and_then(|before| before.checked_mul(limit))
            .and_then(|offset| offset.checked_add(limit));
        match end {
            Some(end) if end <= i64::MAX as usize => Ok(Page { page, limit }),
            _ => Err(PageError::InvalidPage),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Page {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub total: usize,
    pub has_more: bool,
}

impl NotificationPage {
    pub fn new(notifications: Vec<Notification>, total: usize, page: Page) -> Self {
        NotificationPage {
            notifications,
            total,
            has_more: page.offset() + page.limit < total,
        }
    }
}

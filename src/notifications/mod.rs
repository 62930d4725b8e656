//! Per-user notifications for the oversight dashboard

pub mod events;
mod json_file_store;
pub mod models;
mod service;
mod sqlite_store;
mod store;

pub use events::{DomainEvent, InvestigationParties, InvestigationRef, InvestigationStatus};
pub use json_file_store::JsonFileNotificationStore;
pub use models::{
    InvestigationSnapshot, NewNotification, Notification, NotificationPage, NotificationType,
    Page, PageError, SenderSnapshot, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, SYSTEM_SENDER_NAME,
};
pub use service::NotificationService;
pub use sqlite_store::SqliteNotificationStore;
pub use store::NotificationStore;

//! Notification endpoints polled by the dashboard

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ApiError;
use super::metrics;
use super::session::Session;
use super::state::{GuardedNotificationService, GuardedNotificationStore, ServerState};
use super::ServerConfig;
use crate::notifications::{DomainEvent, Notification, Page, DEFAULT_PAGE_LIMIT};

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ListNotificationsQuery {
    unread_only: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

impl ListNotificationsQuery {
    /// Only the literal `true` selects the unread listing.
    fn unread_only(&self) -> bool {
        self.unread_only.as_deref() == Some("true")
    }
}

#[derive(Serialize)]
struct NotificationList {
    notifications: Vec<Notification>,
}

#[derive(Serialize)]
struct UnreadCount {
    count: usize,
}

async fn list_notifications(
    session: Session,
    State(store): State<GuardedNotificationStore>,
    query: Result<Query<ListNotificationsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;

    if query.unread_only() {
        let notifications = store.list_unread_for_user(&session.user_id)?;
        return Ok(Json(NotificationList { notifications }).into_response());
    }

    let page = Page::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    )?;
    let page = store.list_for_user(&session.user_id, page)?;
    Ok(Json(page).into_response())
}

async fn get_unread_count(
    session: Session,
    State(store): State<GuardedNotificationStore>,
) -> Result<Json<UnreadCount>, ApiError> {
    let count = store.count_unread_for_user(&session.user_id)?;
    Ok(Json(UnreadCount { count }))
}

async fn mark_notification_read(
    session: Session,
    State(store): State<GuardedNotificationStore>,
    Path(notification_id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    match store.mark_read(&notification_id, &session.user_id)? {
        Some(notification) => {
            metrics::record_notification_read();
            Ok(Json(notification))
        }
        None => {
            debug!(
                "User {} can't mark notification {} as read",
                session.user_id, notification_id
            );
            Err(ApiError::NotFound("Notification"))
        }
    }
}

async fn create_sample_notifications(
    session: Session,
    State(config): State<ServerConfig>,
    State(service): State<GuardedNotificationService>,
) -> Result<Response, ApiError> {
    if !config.enable_sample_notifications {
        return Err(ApiError::NotFound("Route"));
    }
    let notifications = service.seed_samples(&session.user_id)?;
    Ok((StatusCode::CREATED, Json(NotificationList { notifications })).into_response())
}

async fn post_event(
    session: Session,
    State(service): State<GuardedNotificationService>,
    body: Result<Json<DomainEvent>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(event) = body?;
    match service.dispatch(event, &session.user_id)? {
        Some(notification) => Ok((StatusCode::CREATED, Json(notification)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub fn make_notification_routes(state: ServerState) -> Router {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(get_unread_count))
        .route("/notifications/samples", post(create_sample_notifications))
        .route("/notifications/{id}", put(mark_notification_read))
        .route("/events", post(post_event))
        .with_state(state)
}

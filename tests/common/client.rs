//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all notification-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows.
    /// For most tests, use `authenticated()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client pre-authenticated as the regular test user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER, TEST_PASS).await
    }

    /// Creates a client pre-authenticated as the second test user
    pub async fn authenticated_other(base_url: String) -> Self {
        Self::authenticated_as(base_url, OTHER_USER, OTHER_PASS).await
    }

    async fn authenticated_as(base_url: String, handle: &str, password: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.login(handle, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Authentication of {} failed: {:?}",
            handle,
            response.text().await
        );

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /auth/login
    pub async fn login(&self, handle: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/auth/login", self.base_url))
            .json(&json!({
                "user_handle": handle,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(format!("{}/auth/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Notification Endpoints
    // ========================================================================

    /// GET /notifications (first page, default limit)
    pub async fn get_notifications(&self) -> Response {
        self.client
            .get(format!("{}/notifications", self.base_url))
            .send()
            .await
            .expect("Get notifications request failed")
    }

    /// GET /notifications?page=&limit=
    pub async fn get_notifications_page(&self, page: usize, limit: usize) -> Response {
        self.get_notifications_with_query(&format!("page={}&limit={}", page, limit))
            .await
    }

    /// GET /notifications?unreadOnly=true
    pub async fn get_unread_notifications(&self) -> Response {
        self.get_notifications_with_query("unreadOnly=true").await
    }

    /// GET /notifications with a raw query string
    pub async fn get_notifications_with_query(&self, query: &str) -> Response {
        self.client
            .get(format!("{}/notifications?{}", self.base_url, query))
            .send()
            .await
            .expect("Get notifications request failed")
    }

    /// GET /notifications/unread-count
    pub async fn get_unread_count(&self) -> Response {
        self.client
            .get(format!("{}/notifications/unread-count", self.base_url))
            .send()
            .await
            .expect("Get unread count request failed")
    }

    /// PUT /notifications/{id}
    pub async fn mark_notification_read(&self, notification_id: &str) -> Response {
        self.client
            .put(format!("{}/notifications/{}", self.base_url, notification_id))
            .send()
            .await
            .expect("Mark notification read request failed")
    }

    /// POST /notifications/samples
    pub async fn create_sample_notifications(&self) -> Response {
        self.client
            .post(format!("{}/notifications/samples", self.base_url))
            .send()
            .await
            .expect("Create sample notifications request failed")
    }

    // ========================================================================
    // Event Endpoints
    // ========================================================================

    /// POST /events
    pub async fn post_event(&self, event: serde_json::Value) -> Response {
        self.client
            .post(format!("{}/events", self.base_url))
            .json(&event)
            .send()
            .await
            .expect("Post event request failed")
    }
}

//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, display names, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Regular test user handle
pub const TEST_USER: &str = "testuser";

/// Regular test user password
pub const TEST_PASS: &str = "testpass123";

/// Display name of the regular test user, shown as notification sender
pub const TEST_USER_NAME: &str = "Test User";

/// Second user, used as the other party of investigations
pub const OTHER_USER: &str = "inspector";

/// Second user password
pub const OTHER_PASS: &str = "inspectorpass123";

/// Display name of the second user
pub const OTHER_USER_NAME: &str = "Inspecteur Martin";

// ============================================================================
// Test Investigation Data
// ============================================================================

pub const INVESTIGATION_ID: &str = "inv-42";

pub const INVESTIGATION_TITLE: &str = "Contrôle cantine école Jules Ferry";

pub const ESTABLISHMENT_NAME: &str = "École Jules Ferry";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

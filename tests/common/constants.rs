//! Shared constants for end-to-end tests
//!
//! When test data changes (user credentials, timeouts, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Test user email, owner of the kiosk schedule
pub const TEST_USER: &str = "user@example.com";

/// Test user password
pub const TEST_PASS: &str = "testpass123";

/// Id of the first user created in the test database
pub const TEST_USER_ID: usize = 1;

/// A second user, used to check isolation between tenants
pub const OTHER_USER: &str = "other@example.com";

/// Other user password
pub const OTHER_PASS: &str = "otherpass123";

// ============================================================================
// Test Media
// ============================================================================

/// Bytes uploaded as a video. The sniffer doesn't recognise them, so the
/// declared content type is trusted.
pub const TEST_VIDEO_BYTES: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Minimal JPEG header, enough for the thumbnail sniffer
pub const TEST_THUMBNAIL_BYTES: &[u8] =
    &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F', 0, 1];

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

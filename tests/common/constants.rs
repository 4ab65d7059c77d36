//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (user credentials, catalog IDs, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Regular test user handle
pub const TEST_USER: &str = "testuser";

/// Regular test user password
pub const TEST_PASS: &str = "testpass123";

/// Second test user handle, for isolation tests
pub const OTHER_USER: &str = "otheruser";

/// Second test user password
pub const OTHER_PASS: &str = "otherpass123";

// ============================================================================
// Test Catalog IDs
// ============================================================================

/// Topic ID for "Italian Basics" (vocabulary, beginner)
pub const TOPIC_ITALIAN_ID: &str = "topic-italian";

/// Topic ID for "World Capitals" (geography, beginner)
pub const TOPIC_GEOGRAPHY_ID: &str = "topic-geography";

/// Topic ID for "Rust Programming" (technology, intermediate)
pub const TOPIC_RUST_ID: &str = "topic-rust";

/// Article about Italian greetings, rating 4.5, 10 minutes
pub const CONTENT_ITALIAN_ARTICLE_ID: &str = "content-italian-article";

/// Video about Italian numbers, rating 3.5, 10 minutes
pub const CONTENT_ITALIAN_VIDEO_ID: &str = "content-italian-video";

/// Quiz about European capitals, rating 4.2, 10 minutes
pub const CONTENT_GEOGRAPHY_QUIZ_ID: &str = "content-geography-quiz";

/// Long article about Rust ownership, rating 4.8, 30 minutes
pub const CONTENT_RUST_ARTICLE_ID: &str = "content-rust-article";

// ============================================================================
// Test Catalog Metadata
// ============================================================================

/// Topic 1 name
pub const TOPIC_ITALIAN_NAME: &str = "Italian Basics";

/// Topic 2 name
pub const TOPIC_GEOGRAPHY_NAME: &str = "World Capitals";

/// Topic 3 name
pub const TOPIC_RUST_NAME: &str = "Rust Programming";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

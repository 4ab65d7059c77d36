//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all server endpoints.
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
    /// Creates a new unauthenticated client.
    ///
    /// Use this for testing authentication flows. For most tests, use
    /// `authenticated()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client pre-authenticated as the regular test user.
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(TEST_USER, TEST_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    /// Creates a client pre-authenticated as the second test user.
    pub async fn authenticated_other(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(OTHER_USER, OTHER_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Second test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/login
    pub async fn login(&self, handle: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&json!({
                "user_handle": handle,
                "password": password
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(format!("{}/v1/auth/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    // ========================================================================
    // Learning Endpoints
    // ========================================================================

    /// GET /v1/learn/recommendations with optional query parameters
    pub async fn get_recommendations(
        &self,
        limit: Option<usize>,
        exclude_completed: Option<bool>,
        types: Option<&str>,
    ) -> Response {
        let mut url = format!("{}/v1/learn/recommendations", self.base_url);
        let mut params = vec![];
        if let Some(l) = limit {
            params.push(format!("limit={}", l));
        }
        if let Some(e) = exclude_completed {
            params.push(format!("exclude_completed={}", e));
        }
        if let Some(t) = types {
            params.push(format!("types={}", t));
        }
        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }
        self.client
            .get(&url)
            .send()
            .await
            .expect("Get recommendations request failed")
    }

    /// GET /v1/learn/routine with optional total_minutes
    pub async fn get_routine(&self, total_minutes: Option<u32>) -> Response {
        let mut url = format!("{}/v1/learn/routine", self.base_url);
        if let Some(minutes) = total_minutes {
            url = format!("{}?total_minutes={}", url, minutes);
        }
        self.client
            .get(&url)
            .send()
            .await
            .expect("Get routine request failed")
    }

    // ========================================================================
    // User Endpoints
    // ========================================================================

    /// GET /v1/user/preferences
    pub async fn get_preferences(&self) -> Response {
        self.client
            .get(format!("{}/v1/user/preferences", self.base_url))
            .send()
            .await
            .expect("Get preferences request failed")
    }

    /// PUT /v1/user/preferences
    pub async fn put_preferences(&self, body: serde_json::Value) -> Response {
        self.client
            .put(format!("{}/v1/user/preferences", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Put preferences request failed")
    }

    /// GET /v1/user/interests
    pub async fn get_interests(&self) -> Response {
        self.client
            .get(format!("{}/v1/user/interests", self.base_url))
            .send()
            .await
            .expect("Get interests request failed")
    }

    /// DELETE /v1/user/interests
    pub async fn delete_interests(&self) -> Response {
        self.client
            .delete(format!("{}/v1/user/interests", self.base_url))
            .send()
            .await
            .expect("Delete interests request failed")
    }

    /// POST /v1/user/sessions
    pub async fn post_session(&self, body: serde_json::Value) -> Response {
        self.client
            .post(format!("{}/v1/user/sessions", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Post session request failed")
    }

    /// POST /v1/user/sessions with the common fields filled in
    pub async fn record_session(
        &self,
        topic_id: &str,
        content_id: &str,
        completed: bool,
        engagement_score: Option<f64>,
    ) -> Response {
        let mut body = json!({
            "topic_id": topic_id,
            "content_id": content_id,
            "duration_minutes": 10,
            "completed": completed
        });
        if let Some(engagement) = engagement_score {
            body["engagement_score"] = json!(engagement);
        }
        self.post_session(body).await
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// GET /v1/content/topics
    pub async fn get_topics(&self) -> Response {
        self.client
            .get(format!("{}/v1/content/topics", self.base_url))
            .send()
            .await
            .expect("Get topics request failed")
    }

    /// GET /v1/content/topic/{id}
    pub async fn get_topic(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/content/topic/{}", self.base_url, id))
            .send()
            .await
            .expect("Get topic request failed")
    }

    /// GET /v1/content/{id}
    pub async fn get_content(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/content/{}", self.base_url, id))
            .send()
            .await
            .expect("Get content request failed")
    }

    // ========================================================================
    // Health Check / System Endpoints
    // ========================================================================

    /// GET /
    pub async fn get_stats(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Get stats request failed")
    }
}

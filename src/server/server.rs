use anyhow::Result;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error};

use crate::catalog::ContentType;
use crate::recommend::{RecommendationRequest, Recommender, DEFAULT_ROUTINE_MINUTES};
use crate::user::{AuthTokenValue, LearningSession, UserManager, UserPreferences};
use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::services::ServeDir;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{response, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub user_handle: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Response {
    debug!("login() called for user handle {}", body.user_handle);
    let user_id = match user_manager.verify_password(&body.user_handle, &body.password) {
        Ok(Some(user_id)) => user_id,
        Ok(None) => return StatusCode::FORBIDDEN.into_response(),
        Err(err) => {
            error!("Error verifying password: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match user_manager.generate_auth_token(user_id) {
        Ok(auth_token) => {
            let response_body = LoginSuccessResponse {
                token: auth_token.value.0.clone(),
            };
            let response_body = serde_json::to_string(&response_body).unwrap();

            let cookie_value = HeaderValue::from_str(&format!(
                "{}={}; Path=/; HttpOnly",
                COOKIE_SESSION_TOKEN_KEY, auth_token.value.0
            ))
            .unwrap();
            response::Builder::new()
                .status(StatusCode::CREATED)
                .header(axum::http::header::SET_COOKIE, cookie_value)
                .body(Body::from(response_body))
                .unwrap()
        }
        Err(err) => {
            error!("Error with auth token generation: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn logout(State(user_manager): State<GuardedUserManager>, session: Session) -> Response {
    match user_manager.delete_auth_token(session.user_id, &AuthTokenValue(session.token)) {
        Ok(()) => {
            let cookie_value = Cookie::build(Cookie::new(COOKIE_SESSION_TOKEN_KEY, ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
                .same_site(SameSite::Lax)
                .build();

            response::Builder::new()
                .status(StatusCode::OK)
                .header(axum::http::header::SET_COOKIE, cookie_value.to_string())
                .body(Body::empty())
                .unwrap()
        }
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

#[derive(Deserialize, Debug, Default)]
struct RecommendationsQuery {
    limit: Option<usize>,
    exclude_completed: Option<bool>,
    /// Comma-separated content type tags.
    types: Option<String>,
}

async fn get_recommendations(
    session: Session,
    State(recommender): State<GuardedRecommender>,
    Query(query): Query<RecommendationsQuery>,
) -> Response {
    let mut request = RecommendationRequest::default();
    if let Some(limit) = query.limit {
        request.limit = limit;
    }
    if let Some(exclude_completed) = query.exclude_completed {
        request.exclude_completed = exclude_completed;
    }
    if let Some(types) = &query.types {
        let mut parsed = Vec::new();
        for tag in types.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match ContentType::from_db_str(tag) {
                Some(content_type) => parsed.push(content_type),
                None => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"error": format!("Unknown content type: {}", tag)})),
                    )
                        .into_response()
                }
            }
        }
        request.preferred_types = Some(parsed);
    }

    match recommender.get_recommendations(session.user_id, &request, Utc::now()) {
        Ok(recommendations) => Json(json!({"recommendations": recommendations})).into_response(),
        Err(err) => {
            error!("Error fetching recommendations: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to fetch recommendations"})),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize, Debug, Default)]
struct RoutineQuery {
    total_minutes: Option<u32>,
}

async fn get_routine(
    session: Session,
    State(recommender): State<GuardedRecommender>,
    Query(query): Query<RoutineQuery>,
) -> Response {
    let total_minutes = query.total_minutes.unwrap_or(DEFAULT_ROUTINE_MINUTES);
    match recommender.generate_morning_routine(session.user_id, total_minutes) {
        Ok(routine) => Json(json!({"routine": routine})).into_response(),
        Err(err) => {
            error!("Error generating morning routine: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to generate routine"})),
            )
                .into_response()
        }
    }
}

async fn get_preferences(
    session: Session,
    State(user_store): State<GuardedUserStore>,
) -> Response {
    match user_store.get_user_preferences(session.user_id) {
        Ok(Some(preferences)) => Json(preferences).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Error fetching preferences: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn put_preferences(
    session: Session,
    State(user_store): State<GuardedUserStore>,
    Json(body): Json<UserPreferences>,
) -> Response {
    match user_store.set_user_preferences(session.user_id, &body) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            error!("Error storing preferences: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_interests(session: Session, State(user_store): State<GuardedUserStore>) -> Response {
    match user_store.get_user_interests(session.user_id) {
        Ok(interests) => Json(interests).into_response(),
        Err(err) => {
            error!("Error fetching interests: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn delete_interests(
    session: Session,
    State(user_store): State<GuardedUserStore>,
) -> Response {
    match user_store.delete_user_interests(session.user_id) {
        Ok(deleted) => Json(json!({"deleted": deleted})).into_response(),
        Err(err) => {
            error!("Error deleting interests: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize, Debug)]
struct RecordSessionBody {
    pub topic_id: String,
    pub content_id: String,
    pub duration_minutes: u32,
    pub completed: bool,
    pub score: Option<f64>,
    pub engagement_score: Option<f64>,
}

async fn post_session(
    session: Session,
    State(recommender): State<GuardedRecommender>,
    Json(body): Json<RecordSessionBody>,
) -> Response {
    let learning_session = LearningSession {
        id: None,
        user_id: session.user_id,
        topic_id: body.topic_id,
        content_id: body.content_id,
        duration_minutes: body.duration_minutes,
        completed: body.completed,
        score: body.score,
        engagement_score: body.engagement_score,
        created: Utc::now(),
    };
    match recommender.record_session(&learning_session) {
        Ok(id) => (StatusCode::CREATED, Json(json!({"id": id}))).into_response(),
        Err(err) => {
            error!("Error recording learning session: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_topics(
    _session: Session,
    State(catalog_store): State<GuardedCatalogStore>,
) -> Response {
    match catalog_store.get_all_topics() {
        Ok(topics) => Json(topics).into_response(),
        Err(err) => {
            error!("Error fetching topics: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_topic(
    _session: Session,
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    match catalog_store.get_topic(&id) {
        Ok(Some(topic)) => Json(topic).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Error fetching topic {}: {}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_content_item(
    _session: Session,
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    match catalog_store.get_content(&id) {
        Ok(Some(content)) => Json(content).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Error fetching content {}: {}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        catalog_store: GuardedCatalogStore,
        user_store: GuardedUserStore,
    ) -> ServerState {
        let user_manager = Arc::new(UserManager::new(user_store.clone()));
        let recommender = Arc::new(Recommender::new(catalog_store.clone(), user_store.clone()));
        ServerState {
            config,
            start_time: Instant::now(),
            hash: env!("GIT_HASH").to_owned(),
            catalog_store,
            user_store,
            user_manager,
            recommender,
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    user_store: GuardedUserStore,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), catalog_store, user_store);

    let auth_routes: Router = Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let learn_routes: Router = Router::new()
        .route("/recommendations", get(get_recommendations))
        .route("/routine", get(get_routine))
        .with_state(state.clone());

    let user_routes: Router = Router::new()
        .route("/preferences", get(get_preferences))
        .route("/preferences", put(put_preferences))
        .route("/interests", get(get_interests))
        .route("/interests", delete(delete_interests))
        .route("/sessions", post(post_session))
        .with_state(state.clone());

    let content_routes: Router = Router::new()
        .route("/topics", get(get_topics))
        .route("/topic/{id}", get(get_topic))
        .route("/{id}", get(get_content_item))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app: Router = home_router
        .nest("/v1/auth", auth_routes)
        .nest("/v1/learn", learn_routes)
        .nest("/v1/user", user_routes)
        .nest("/v1/content", content_routes)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    user_store: GuardedUserStore,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, catalog_store, user_store)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalogStore;
    use crate::user::SqliteUserStore;
    use axum::{body::Body, http::Request};
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    struct TestApp {
        app: Router,
        user_manager: UserManager,
        _dir: TempDir,
    }

    fn make_test_app() -> TestApp {
        let dir = TempDir::new().unwrap();
        let catalog_store: GuardedCatalogStore =
            Arc::new(SqliteCatalogStore::new(dir.path().join("catalog.db")).unwrap());
        let user_store: GuardedUserStore =
            Arc::new(SqliteUserStore::new(dir.path().join("user.db")).unwrap());
        let app = make_app(
            ServerConfig::default(),
            catalog_store,
            user_store.clone(),
        )
        .unwrap();
        TestApp {
            app,
            user_manager: UserManager::new(user_store),
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn responds_unauthorized_on_protected_routes() {
        let test_app = make_test_app();

        let protected_routes = vec![
            "/v1/learn/recommendations",
            "/v1/learn/routine",
            "/v1/user/preferences",
            "/v1/user/interests",
            "/v1/content/topics",
            "/v1/content/topic/123",
            "/v1/content/123",
            "/v1/auth/logout",
        ];

        for route in protected_routes.into_iter() {
            let request = Request::builder().uri(route).body(Body::empty()).unwrap();
            let response = test_app.app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", route);
        }
    }

    #[tokio::test]
    async fn home_works_without_a_session() {
        let test_app = make_test_app();

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let test_app = make_test_app();
        test_app.user_manager.add_user("mario").unwrap();
        test_app
            .user_manager
            .create_password_credentials("mario", "secret123")
            .unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/v1/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"user_handle": "mario", "password": "nope"}"#,
            ))
            .unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn login_sets_session_cookie_and_authorizes_requests() {
        let test_app = make_test_app();
        test_app.user_manager.add_user("mario").unwrap();
        test_app
            .user_manager
            .create_password_credentials("mario", "secret123")
            .unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/v1/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"user_handle": "mario", "password": "secret123"}"#,
            ))
            .unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let set_cookie = response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("session_token="));
        assert!(set_cookie.contains("HttpOnly"));

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let token = parsed["token"].as_str().unwrap().to_string();

        // The token works through the Authorization header.
        let request = Request::builder()
            .uri("/v1/content/topics")
            .header("Authorization", &token)
            .body(Body::empty())
            .unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_content_type_tag_is_a_bad_request() {
        let test_app = make_test_app();
        let user_id = test_app.user_manager.add_user("mario").unwrap();
        let token = test_app.user_manager.generate_auth_token(user_id).unwrap();

        let request = Request::builder()
            .uri("/v1/learn/recommendations?types=article,hologram")
            .header("Authorization", &token.value.0)
            .body(Body::empty())
            .unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn preferences_404_until_set() {
        let test_app = make_test_app();
        let user_id = test_app.user_manager.add_user("mario").unwrap();
        let token = test_app.user_manager.generate_auth_token(user_id).unwrap();

        let request = Request::builder()
            .uri("/v1/user/preferences")
            .header("Authorization", &token.value.0)
            .body(Body::empty())
            .unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = Request::builder()
            .method("PUT")
            .uri("/v1/user/preferences")
            .header("Authorization", &token.value.0)
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{
                    "difficulty_level": "beginner",
                    "learning_style": "reading",
                    "daily_goal_minutes": 30,
                    "morning_reminder": false,
                    "reminder_time": null
                }"#,
            ))
            .unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .uri("/v1/user/preferences")
            .header("Authorization", &token.value.0)
            .body(Body::empty())
            .unwrap();
        let response = test_app.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

use super::auth::{AuthToken, AuthTokenValue, UserAuthCredentials};
use super::user_models::{LearningSession, UserInterest, UserPreferences};
use anyhow::Result;

pub trait UserAuthCredentialsStore: Send + Sync {
    /// Returns the user's authentication credentials given the user handle.
    /// Returns Ok(None) if the user has no password credentials.
    /// Returns Err if there is a database error.
    fn get_user_auth_credentials(&self, user_handle: &str) -> Result<Option<UserAuthCredentials>>;

    /// Creates or replaces the user's password credentials.
    fn set_user_auth_credentials(&self, credentials: &UserAuthCredentials) -> Result<()>;
}

pub trait UserAuthTokenStore: Send + Sync {
    /// Returns a user's authentication token given an AuthTokenValue.
    /// Returns Ok(None) if the token does not exist.
    /// Returns Err if there is a database error.
    fn get_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Deletes an auth token given the token value, returning the deleted
    /// token. Returns Ok(None) if the token does not exist.
    fn delete_user_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>>;

    /// Stamps an auth token with the current time.
    fn update_user_auth_token_last_used_timestamp(&self, token: &AuthTokenValue) -> Result<()>;

    /// Adds a new auth token.
    fn add_user_auth_token(&self, token: AuthToken) -> Result<()>;

    /// Prunes auth tokens that haven't been used for the specified duration.
    /// Returns the number of tokens that were deleted.
    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize>;
}

pub trait UserStore: UserAuthTokenStore + UserAuthCredentialsStore + Send + Sync {
    /// Creates a new user and returns the user id.
    fn create_user(&self, user_handle: &str) -> Result<usize>;

    /// Returns a user's handle given the user id.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>>;

    /// Returns a user's id given the user handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>>;

    /// Returns all users' handles.
    fn get_all_user_handles(&self) -> Result<Vec<String>>;
}

pub trait UserPreferencesStore: Send + Sync {
    /// Returns the user's learning preferences.
    /// Returns Ok(None) if the user never set them.
    fn get_user_preferences(&self, user_id: usize) -> Result<Option<UserPreferences>>;

    /// Creates or replaces the user's learning preferences.
    fn set_user_preferences(&self, user_id: usize, preferences: &UserPreferences) -> Result<()>;
}

pub trait UserInterestStore: Send + Sync {
    /// Returns all of the user's topic interests, strongest first.
    fn get_user_interests(&self, user_id: usize) -> Result<Vec<UserInterest>>;

    /// Returns the user's interest in one topic.
    /// Returns Ok(None) if no interest was ever recorded.
    fn get_user_interest(&self, user_id: usize, topic_id: &str) -> Result<Option<UserInterest>>;

    /// Creates or updates the interest for (interest.user_id, interest.topic_id).
    fn upsert_user_interest(&self, interest: &UserInterest) -> Result<()>;

    /// Deletes all of the user's interests.
    /// Returns the number of interests that were deleted.
    fn delete_user_interests(&self, user_id: usize) -> Result<usize>;
}

pub trait LearningSessionStore: Send + Sync {
    /// Records a learning session and returns its id.
    fn record_learning_session(&self, session: &LearningSession) -> Result<usize>;

    /// Returns the user's most recent sessions, newest first.
    fn get_user_sessions(&self, user_id: usize, limit: usize) -> Result<Vec<LearningSession>>;

    /// Returns the distinct content ids of the user's completed sessions.
    fn get_completed_content_ids(&self, user_id: usize) -> Result<Vec<String>>;
}

/// Combined trait for user storage with learning state tracking.
pub trait FullUserStore:
    UserStore + UserPreferencesStore + UserInterestStore + LearningSessionStore
{
}

// Blanket implementation for any type implementing all the user store traits
impl<T: UserStore + UserPreferencesStore + UserInterestStore + LearningSessionStore> FullUserStore
    for T
{
}

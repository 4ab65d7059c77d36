pub mod auth;
mod sqlite_user_store;
mod user_manager;
pub mod user_models;
mod user_store;

pub use auth::{AuthToken, AuthTokenValue, CredentialsHasher, UserAuthCredentials};
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::UserManager;
pub use user_models::{LearningSession, LearningStyle, UserInterest, UserPreferences};
pub use user_store::{
    FullUserStore, LearningSessionStore, UserAuthCredentialsStore, UserAuthTokenStore,
    UserInterestStore, UserPreferencesStore, UserStore,
};

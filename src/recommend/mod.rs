//! Recommendation engine: heuristic scoring, candidate assembly, interest
//! tracking and the morning routine builder.

mod routine;
mod scorer;
mod service;

pub use routine::{RoutineItem, DEFAULT_ROUTINE_MINUTES, ROUTINE_TOPIC_COUNT};
pub use scorer::score_content;
pub use service::{
    Recommendation, RecommendationRequest, Recommender, DEFAULT_RECOMMENDATION_LIMIT,
};

use crate::catalog::{CatalogStore, Content, ContentFilter, ContentType, Topic};
use crate::user::{FullUserStore, LearningSession, UserInterest};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

/// How many candidates to over-fetch per requested recommendation, so that
/// re-ranking by score has something to work with.
pub const CANDIDATE_MULTIPLIER: usize = 2;

/// Strength floor for a freshly created interest.
pub const MIN_INTEREST_STRENGTH: f64 = 0.1;

/// Fraction of the normalized engagement added to an existing interest.
pub const INTEREST_GAIN_FACTOR: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    pub limit: usize,
    pub exclude_completed: bool,
    pub preferred_types: Option<Vec<ContentType>>,
}

impl Default for RecommendationRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RECOMMENDATION_LIMIT,
            exclude_completed: true,
            preferred_types: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub content: Content,
    pub topic: Topic,
    pub score: f64,
    pub reason: String,
}

/// Assembles recommendations and maintains interest strengths.
pub struct Recommender {
    pub(crate) catalog_store: Arc<dyn CatalogStore>,
    pub(crate) user_store: Arc<dyn FullUserStore>,
}

impl Recommender {
    pub fn new(catalog_store: Arc<dyn CatalogStore>, user_store: Arc<dyn FullUserStore>) -> Self {
        Self {
            catalog_store,
            user_store,
        }
    }

    /// Returns up to `request.limit` scored recommendations for the user,
    /// best first. A user without interests gets an empty list; missing
    /// preferences just skip the preference-based scoring rules.
    pub fn get_recommendations(
        &self,
        user_id: usize,
        request: &RecommendationRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>> {
        let preferences = self.user_store.get_user_preferences(user_id)?;
        let interests = self.user_store.get_user_interests(user_id)?;
        if interests.is_empty() {
            return Ok(Vec::new());
        }

        let exclude_ids = if request.exclude_completed {
            self.user_store.get_completed_content_ids(user_id)?
        } else {
            Vec::new()
        };

        let filter = ContentFilter {
            topic_ids: interests.iter().map(|i| i.topic_id.clone()).collect(),
            exclude_ids,
            types: request.preferred_types.clone(),
        };
        let candidates = self
            .catalog_store
            .find_content(&filter, request.limit.saturating_mul(CANDIDATE_MULTIPLIER))?;

        let mut topics: HashMap<String, Topic> = HashMap::new();
        for interest in &interests {
            if let Some(topic) = self.catalog_store.get_topic(&interest.topic_id)? {
                topics.insert(topic.id.clone(), topic);
            }
        }

        let mut recommendations = Vec::new();
        for content in candidates {
            let Some(topic) = topics.get(&content.topic_id) else {
                continue;
            };
            let (score, reasons) = super::scorer::score_content(
                &content,
                topic,
                &interests,
                preferences.as_ref(),
                now,
            );
            recommendations.push(Recommendation {
                content,
                topic: topic.clone(),
                score,
                reason: reasons.join(", "),
            });
        }

        // Stable sort: candidates with equal scores keep their fetch order.
        recommendations.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        recommendations.truncate(request.limit);
        Ok(recommendations)
    }

    /// Folds an engagement score (0-100) into the user's interest for a
    /// topic. Existing interests grow, saturating at 1.0; a new interest
    /// starts at the normalized engagement with a floor of
    /// [`MIN_INTEREST_STRENGTH`]. Strength never decreases.
    pub fn update_interest(
        &self,
        user_id: usize,
        topic_id: &str,
        engagement_score: f64,
    ) -> Result<()> {
        let engagement = engagement_score.clamp(0.0, 100.0);
        let interest = match self.user_store.get_user_interest(user_id, topic_id)? {
            Some(mut interest) => {
                interest.strength =
                    (interest.strength + (engagement / 100.0) * INTEREST_GAIN_FACTOR).min(1.0);
                interest
            }
            None => UserInterest {
                user_id,
                topic_id: topic_id.to_string(),
                strength: (engagement / 100.0).max(MIN_INTEREST_STRENGTH),
                preferred_content_types: Vec::new(),
                average_session_length: None,
                created: Utc::now(),
                updated: Utc::now(),
            },
        };
        self.user_store.upsert_user_interest(&interest)
    }

    /// Records a learning session; when it carries an engagement score the
    /// topic interest is updated from it.
    pub fn record_session(&self, session: &LearningSession) -> Result<usize> {
        let session_id = self.user_store.record_learning_session(session)?;
        if let Some(engagement) = session.engagement_score {
            self.update_interest(session.user_id, &session.topic_id, engagement)?;
        }
        Ok(session_id)
    }
}

// src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::not_blank;

/// Visitor review of a business, visible once approved
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub business_id: Uuid,
    pub author_name: String,
    pub author_email: Option<String>,
    pub rating: i16,
    pub comment: Option<String>,
    pub status: String,
    pub moderated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,

    /// Joined in admin queues
    #[sqlx(default)]
    pub business_name: Option<String>,
}

/// Request to create a new review
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub author_name: String,

    #[validate(email)]
    pub author_email: Option<String>,

    #[validate(range(min = 1, max = 5))]
    pub rating: i16,

    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Review response DTO exposed via API
#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub author_name: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Convert database Review into API response
    pub fn to_response(&self) -> ReviewResponse {
        ReviewResponse {
            id: self.id,
            author_name: self.author_name.clone(),
            rating: self.rating,
            comment: self.comment.clone(),
            created_at: self.created_at,
        }
    }
}

/// POST /admin/reviews/{id}/status
#[derive(Debug, Deserialize)]
pub struct ReviewStatusRequest {
    pub status: String,
}

/// Moderation queue filter shared by reviews and claims
#[derive(Debug, Default, Deserialize)]
pub struct QueueQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let mut req = CreateReviewRequest {
            author_name: "Salma".to_string(),
            author_email: None,
            rating: 5,
            comment: Some("Great service".to_string()),
        };
        assert!(req.validate().is_ok());

        req.rating = 0;
        assert!(req.validate().is_err());

        req.rating = 6;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_blank_author_rejected() {
        let req = CreateReviewRequest {
            author_name: String::new(),
            author_email: None,
            rating: 3,
            comment: None,
        };
        assert!(req.validate().is_err());
    }
}

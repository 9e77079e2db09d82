// src/db/stats_repository.rs
// DOCUMENTATION: Aggregate counters for the admin dashboard

use crate::errors::DirectoryError;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DirectoryStats {
    pub businesses_total: i64,
    pub businesses_pending: i64,
    pub businesses_approved: i64,
    pub businesses_rejected: i64,
    pub businesses_suspended: i64,
    pub businesses_sponsored: i64,
    pub reviews_pending: i64,
    pub claims_pending: i64,
    pub messages_unread: i64,
    pub categories: i64,
    pub cities: i64,
    pub countries: i64,
    pub average_rating: Option<f64>,
}

pub struct StatsRepository;

impl StatsRepository {
    pub async fn collect(pool: &PgPool) -> Result<DirectoryStats, DirectoryError> {
        sqlx::query_as::<_, DirectoryStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM businesses WHERE is_active) AS businesses_total,
                (SELECT COUNT(*) FROM businesses WHERE is_active AND status = 'pending') AS businesses_pending,
                (SELECT COUNT(*) FROM businesses WHERE is_active AND status = 'approved') AS businesses_approved,
                (SELECT COUNT(*) FROM businesses WHERE is_active AND status = 'rejected') AS businesses_rejected,
                (SELECT COUNT(*) FROM businesses WHERE is_active AND status = 'suspended') AS businesses_suspended,
                (
                    SELECT COUNT(*) FROM businesses
                    WHERE is_active AND is_sponsored
                      AND (sponsored_until IS NULL OR sponsored_until > NOW())
                ) AS businesses_sponsored,
                (SELECT COUNT(*) FROM reviews WHERE status = 'pending') AS reviews_pending,
                (SELECT COUNT(*) FROM listing_claims WHERE status = 'pending') AS claims_pending,
                (SELECT COUNT(*) FROM contact_messages WHERE NOT is_read) AS messages_unread,
                (SELECT COUNT(*) FROM categories) AS categories,
                (SELECT COUNT(*) FROM cities) AS cities,
                (SELECT COUNT(*) FROM countries) AS countries,
                (SELECT AVG(rating)::float8 FROM reviews WHERE status = 'approved') AS average_rating
            "#,
        )
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Collect dashboard stats", e))
    }
}

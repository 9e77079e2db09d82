// src/db/review_repository.rs
// DOCUMENTATION: Review database operations
// PURPOSE: Handle submission, listing and moderation of business reviews

use crate::errors::DirectoryError;
use crate::models::{CreateReviewRequest, ModerationStatus, PageParams, Review};
use sqlx::PgPool;
use uuid::Uuid;

const REVIEW_COLUMNS: &str = r#"
    r.id, r.business_id, r.author_name, r.author_email, r.rating, r.comment,
    r.status, r.moderated_at, r.created_at
"#;

pub struct ReviewRepository;

impl ReviewRepository {
    /// Store a new review awaiting moderation
    pub async fn create(
        pool: &PgPool,
        business_id: Uuid,
        req: &CreateReviewRequest,
    ) -> Result<Review, DirectoryError> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (business_id, author_name, author_email, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, business_id, author_name, author_email, rating, comment,
                      status, moderated_at, created_at
            "#,
        )
        .bind(business_id)
        .bind(req.author_name.trim())
        .bind(&req.author_email)
        .bind(req.rating)
        .bind(&req.comment)
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Create review", e))?;

        log::info!("Review {} submitted for business {}", review.id, business_id);
        Ok(review)
    }

    /// Approved reviews of a business, newest first
    pub async fn list_approved(
        pool: &PgPool,
        business_id: Uuid,
        page: PageParams,
    ) -> Result<(Vec<Review>, i64), DirectoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reviews WHERE business_id = $1 AND status = 'approved'",
        )
        .bind(business_id)
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Count reviews", e))?;

        let sql = format!(
            r#"
            SELECT {}
            FROM reviews r
            WHERE r.business_id = $1 AND r.status = 'approved'
            ORDER BY r.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            REVIEW_COLUMNS
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(business_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Fetch reviews", e))?;

        Ok((reviews, total))
    }

    /// Moderation queue, optionally restricted to one status
    pub async fn list_for_moderation(
        pool: &PgPool,
        status: Option<ModerationStatus>,
        page: PageParams,
    ) -> Result<(Vec<Review>, i64), DirectoryError> {
        let status = status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reviews WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Count reviews", e))?;

        let sql = format!(
            r#"
            SELECT {}, b.name AS business_name
            FROM reviews r
            JOIN businesses b ON b.id = r.business_id
            WHERE ($1::text IS NULL OR r.status = $1)
            ORDER BY r.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            REVIEW_COLUMNS
        );
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(status)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Fetch review queue", e))?;

        Ok((reviews, total))
    }

    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: ModerationStatus,
    ) -> Result<Review, DirectoryError> {
        sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET status = $1, moderated_at = NOW()
            WHERE id = $2
            RETURNING id, business_id, author_name, author_email, rating, comment,
                      status, moderated_at, created_at
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Moderate review", e))?
        .ok_or_else(|| {
            log::warn!("Review not found: {}", id);
            DirectoryError::NotFound(format!("review {}", id))
        })
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), DirectoryError> {
        let rows = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Delete review", e))?
            .rows_affected();

        if rows == 0 {
            return Err(DirectoryError::NotFound(format!("review {}", id)));
        }

        log::info!("Deleted review: {}", id);
        Ok(())
    }
}

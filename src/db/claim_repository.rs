// src/db/claim_repository.rs
// DOCUMENTATION: Listing claim database operations
// PURPOSE: Store ownership requests and apply admin decisions atomically

use crate::errors::DirectoryError;
use crate::models::{CreateClaimRequest, ListingClaim, ModerationStatus, PageParams};
use sqlx::PgPool;
use uuid::Uuid;

/// Note stored on claims closed by a competing approval
pub const COMPETING_CLAIM_NOTE: &str = "Another claim for this business was approved";

pub const PENDING_CLAIM_EXISTS: &str =
    "a claim from this email is already pending for this business";

const CLAIM_COLUMNS: &str = r#"
    id, business_id, claimant_name, claimant_email, claimant_phone,
    position, message, status, admin_notes, reviewed_at, created_at
"#;

const CLAIM_RETURNING: &str = r#"
    RETURNING id, business_id, claimant_name, claimant_email, claimant_phone,
              position, message, status, admin_notes, reviewed_at, created_at
"#;

pub struct ClaimRepository;

impl ClaimRepository {
    pub async fn create(
        pool: &PgPool,
        business_id: Uuid,
        req: &CreateClaimRequest,
    ) -> Result<ListingClaim, DirectoryError> {
        let sql = format!(
            r#"
            INSERT INTO listing_claims (
                business_id, claimant_name, claimant_email, claimant_phone, position, message
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            {}
            "#,
            CLAIM_RETURNING
        );

        let claim = sqlx::query_as::<_, ListingClaim>(&sql)
            .bind(business_id)
            .bind(req.claimant_name.trim())
            .bind(req.claimant_email.trim().to_lowercase())
            .bind(&req.claimant_phone)
            .bind(&req.position)
            .bind(&req.message)
            .fetch_one(pool)
            .await
            .map_err(|e| pending_conflict(DirectoryError::from_db("Create claim", e)))?;

        log::info!("Claim {} submitted for business {}", claim.id, business_id);
        Ok(claim)
    }

    /// Whether `email` already has a pending claim on the business
    pub async fn has_pending_claim(
        pool: &PgPool,
        business_id: Uuid,
        email: &str,
    ) -> Result<bool, DirectoryError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM listing_claims
                WHERE business_id = $1 AND claimant_email = $2 AND status = 'pending'
            )
            "#,
        )
        .bind(business_id)
        .bind(email.trim().to_lowercase())
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Check pending claims", e))
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<ListingClaim, DirectoryError> {
        sqlx::query_as::<_, ListingClaim>(
            r#"
            SELECT lc.id, lc.business_id, lc.claimant_name, lc.claimant_email, lc.claimant_phone,
                   lc.position, lc.message, lc.status, lc.admin_notes, lc.reviewed_at,
                   lc.created_at, b.name AS business_name
            FROM listing_claims lc
            JOIN businesses b ON b.id = lc.business_id
            WHERE lc.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Fetch claim", e))?
        .ok_or_else(|| {
            log::warn!("Claim not found: {}", id);
            DirectoryError::NotFound(format!("claim {}", id))
        })
    }

    pub async fn list_for_moderation(
        pool: &PgPool,
        status: Option<ModerationStatus>,
        page: PageParams,
    ) -> Result<(Vec<ListingClaim>, i64), DirectoryError> {
        let status = status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM listing_claims WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Count claims", e))?;

        let claims = sqlx::query_as::<_, ListingClaim>(
            r#"
            SELECT lc.id, lc.business_id, lc.claimant_name, lc.claimant_email, lc.claimant_phone,
                   lc.position, lc.message, lc.status, lc.admin_notes, lc.reviewed_at,
                   lc.created_at, b.name AS business_name
            FROM listing_claims lc
            JOIN businesses b ON b.id = lc.business_id
            WHERE ($1::text IS NULL OR lc.status = $1)
            ORDER BY lc.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Fetch claim queue", e))?;

        Ok((claims, total))
    }

    /// Approve a pending claim
    /// DOCUMENTATION: In one transaction the claim is approved, the business
    /// gets the claimant as verified owner and competing pending claims are rejected
    pub async fn approve(
        pool: &PgPool,
        id: Uuid,
        admin_notes: Option<&str>,
    ) -> Result<ListingClaim, DirectoryError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| DirectoryError::from_db("Begin claim approval", e))?;

        let current = sqlx::query_as::<_, ListingClaim>(&format!(
            "SELECT {} FROM listing_claims WHERE id = $1 FOR UPDATE",
            CLAIM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DirectoryError::from_db("Lock claim", e))?
        .ok_or_else(|| DirectoryError::NotFound(format!("claim {}", id)))?;
        current.ensure_pending()?;

        let sql = format!(
            r#"
            UPDATE listing_claims
            SET status = 'approved', admin_notes = $1, reviewed_at = NOW()
            WHERE id = $2
            {}
            "#,
            CLAIM_RETURNING
        );
        let claim = sqlx::query_as::<_, ListingClaim>(&sql)
            .bind(admin_notes)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DirectoryError::from_db("Approve claim", e))?;

        let rows = sqlx::query(
            r#"
            UPDATE businesses
            SET owner_email = $1, is_verified = true, updated_at = NOW()
            WHERE id = $2 AND is_active = true
            "#,
        )
        .bind(&claim.claimant_email)
        .bind(claim.business_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DirectoryError::from_db("Assign business owner", e))?
        .rows_affected();

        if rows == 0 {
            return Err(DirectoryError::NotFound(format!(
                "business {}",
                claim.business_id
            )));
        }

        let rejected = sqlx::query(
            r#"
            UPDATE listing_claims
            SET status = 'rejected', admin_notes = $1, reviewed_at = NOW()
            WHERE business_id = $2 AND id <> $3 AND status = 'pending'
            "#,
        )
        .bind(COMPETING_CLAIM_NOTE)
        .bind(claim.business_id)
        .bind(claim.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DirectoryError::from_db("Reject competing claims", e))?
        .rows_affected();

        tx.commit()
            .await
            .map_err(|e| DirectoryError::from_db("Commit claim approval", e))?;

        log::info!(
            "Approved claim {} for business {} ({} competing claims rejected)",
            claim.id,
            claim.business_id,
            rejected
        );
        Ok(claim)
    }

    pub async fn reject(
        pool: &PgPool,
        id: Uuid,
        admin_notes: Option<&str>,
    ) -> Result<ListingClaim, DirectoryError> {
        let sql = format!(
            r#"
            UPDATE listing_claims
            SET status = 'rejected', admin_notes = $1, reviewed_at = NOW()
            WHERE id = $2 AND status = 'pending'
            {}
            "#,
            CLAIM_RETURNING
        );
        let claim = sqlx::query_as::<_, ListingClaim>(&sql)
            .bind(admin_notes)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Reject claim", e))?
            .ok_or_else(|| {
                DirectoryError::AlreadyExists(format!("claim {} is not pending", id))
            })?;

        log::info!("Rejected claim {}", claim.id);
        Ok(claim)
    }
}

/// A unique violation on insert means a concurrent submission raced past the pending check
fn pending_conflict(err: DirectoryError) -> DirectoryError {
    match err {
        DirectoryError::AlreadyExists(_) => {
            DirectoryError::AlreadyExists(PENDING_CLAIM_EXISTS.to_string())
        }
        other => other,
    }
}

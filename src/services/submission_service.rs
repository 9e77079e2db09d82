// src/services/submission_service.rs
// DOCUMENTATION: Public submissions: reviews, listing claims and contact messages
// PURPOSE: Visibility and duplicate checks before anything reaches a moderation queue

use crate::db::{
    BusinessRepository, ClaimRepository, ContactRepository, ReviewRepository, PENDING_CLAIM_EXISTS,
};
use crate::errors::DirectoryError;
use crate::models::{
    BusinessView, ClaimReceipt, ContactMessage, CreateClaimRequest, CreateContactMessageRequest,
    CreateReviewRequest, PageParams, Paginated, ReviewResponse,
};
use sqlx::PgPool;
use uuid::Uuid;

pub struct SubmissionService;

impl SubmissionService {
    /// Store a review for an approved, active business
    pub async fn submit_review(
        pool: &PgPool,
        business_id: Uuid,
        req: &CreateReviewRequest,
    ) -> Result<ReviewResponse, DirectoryError> {
        BusinessRepository::get_public(pool, &business_id.to_string()).await?;
        let review = ReviewRepository::create(pool, business_id, req).await?;
        Ok(review.to_response())
    }

    pub async fn list_reviews(
        pool: &PgPool,
        business_id: Uuid,
        page: PageParams,
    ) -> Result<Paginated<ReviewResponse>, DirectoryError> {
        BusinessRepository::get_public(pool, &business_id.to_string()).await?;
        let (reviews, total) = ReviewRepository::list_approved(pool, business_id, page).await?;
        Ok(Paginated::new(
            reviews.iter().map(|r| r.to_response()).collect(),
            total,
            page,
        ))
    }

    /// Ask to be recognised as the owner of a listing
    pub async fn submit_claim(
        pool: &PgPool,
        business_id: Uuid,
        req: &CreateClaimRequest,
    ) -> Result<ClaimReceipt, DirectoryError> {
        let business = BusinessRepository::get_by_id(pool, business_id).await?;
        check_claimable(&business)?;

        if ClaimRepository::has_pending_claim(pool, business_id, &req.claimant_email).await? {
            return Err(DirectoryError::AlreadyExists(PENDING_CLAIM_EXISTS.to_string()));
        }

        let claim = ClaimRepository::create(pool, business_id, req).await?;
        Ok(claim.to_receipt())
    }

    pub async fn submit_contact(
        pool: &PgPool,
        req: &CreateContactMessageRequest,
    ) -> Result<ContactMessage, DirectoryError> {
        ContactRepository::create(pool, req).await
    }
}

fn check_claimable(business: &BusinessView) -> Result<(), DirectoryError> {
    if business.owner_email.is_some() {
        return Err(DirectoryError::AlreadyExists(format!(
            "business {} already has an owner",
            business.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::business::sample_business;

    #[test]
    fn test_owned_business_cannot_be_claimed() {
        let mut business = sample_business("Garage Atlas");
        assert!(check_claimable(&business).is_ok());

        business.owner_email = Some("owner@example.com".to_string());
        assert!(matches!(
            check_claimable(&business),
            Err(DirectoryError::AlreadyExists(_))
        ));
    }
}

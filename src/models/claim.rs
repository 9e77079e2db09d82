// src/models/claim.rs
// DOCUMENTATION: Listing claims submitted by purported business owners

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::not_blank;

use crate::errors::DirectoryError;
use crate::models::ModerationStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ListingClaim {
    pub id: Uuid,
    pub business_id: Uuid,
    pub claimant_name: String,
    pub claimant_email: String,
    pub claimant_phone: Option<String>,

    /// Role at the business (owner, manager, ...)
    pub position: Option<String>,

    pub message: Option<String>,
    pub status: String,
    pub admin_notes: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,

    #[sqlx(default)]
    pub business_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClaimRequest {
    #[validate(length(min = 1, max = 120), custom = "not_blank")]
    pub claimant_name: String,

    #[validate(email)]
    pub claimant_email: String,

    #[validate(length(min = 3, max = 40))]
    pub claimant_phone: Option<String>,

    #[validate(length(max = 120))]
    pub position: Option<String>,

    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

/// Public acknowledgement; claim details stay in the admin queue
#[derive(Debug, Serialize)]
pub struct ClaimReceipt {
    pub id: Uuid,
    pub business_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl ListingClaim {
    /// Only pending claims can be approved or rejected
    pub fn ensure_pending(&self) -> Result<(), DirectoryError> {
        if self.status != ModerationStatus::Pending.as_str() {
            return Err(DirectoryError::AlreadyExists(format!(
                "claim {} is already {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    pub fn to_receipt(&self) -> ClaimReceipt {
        ClaimReceipt {
            id: self.id,
            business_id: self.business_id,
            status: self.status.clone(),
            created_at: self.created_at,
        }
    }
}

/// POST /admin/claims/{id}/approve and /reject
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ClaimDecisionRequest {
    #[validate(length(max = 2000))]
    pub admin_notes: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_claim(status: &str) -> ListingClaim {
    ListingClaim {
        id: Uuid::new_v4(),
        business_id: Uuid::new_v4(),
        claimant_name: "Samira Alaoui".to_string(),
        claimant_email: "samira@example.com".to_string(),
        claimant_phone: None,
        position: Some("owner".to_string()),
        message: None,
        status: status.to_string(),
        admin_notes: None,
        reviewed_at: None,
        created_at: Utc::now(),
        business_name: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_claims_are_decided() {
        assert!(sample_claim("pending").ensure_pending().is_ok());
        for status in ["approved", "rejected"] {
            assert!(matches!(
                sample_claim(status).ensure_pending(),
                Err(DirectoryError::AlreadyExists(_))
            ));
        }
    }
}

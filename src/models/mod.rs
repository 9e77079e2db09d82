// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod admin_user;
pub mod business;
pub mod category;
pub mod claim;
pub mod contact;
pub mod location;
pub mod moderation;
pub mod pagination;
pub mod review;

pub use admin_user::*;
pub use business::*;
pub use category::*;
pub use claim::*;
pub use contact::*;
pub use location::*;
pub use moderation::*;
pub use pagination::*;
pub use review::*;

use serde::Deserialize;
use validator::ValidationError;

/// Required text must contain something besides whitespace
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// `?lang=` plus paging, used by localized public listings
#[derive(Debug, Default, Deserialize)]
pub struct LocalizedQuery {
    pub lang: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// `?page=&limit=` only
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_whitespace_names_are_rejected() {
        assert!(not_blank("Atlas").is_ok());
        assert!(not_blank(" \t ").is_err());

        let review = CreateReviewRequest {
            author_name: "   ".to_string(),
            author_email: None,
            rating: 4,
            comment: None,
        };
        assert!(review.validate().is_err());

        let claim = CreateClaimRequest {
            claimant_name: "\n ".to_string(),
            claimant_email: "owner@example.com".to_string(),
            claimant_phone: None,
            position: None,
            message: None,
        };
        assert!(claim.validate().is_err());

        let named = CreateClaimRequest {
            claimant_name: "Samira".to_string(),
            ..claim
        };
        assert!(named.validate().is_ok());
    }
}

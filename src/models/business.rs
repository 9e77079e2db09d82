// src/models/business.rs
// DOCUMENTATION: Core data structures for business listings
// PURPOSE: Defines all serialization/deserialization models for API and database

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::not_blank;

use super::ReviewResponse;

/// Business listing joined with its category, city and rating aggregates
/// DOCUMENTATION: Maps the businesses table plus derived columns
/// average_rating and review_count only count approved reviews
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BusinessView {
    /// Unique identifier (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// URL-safe unique name
    pub slug: String,

    pub description: Option<String>,

    pub category_id: Uuid,
    pub category_name: String,
    pub category_slug: String,

    pub city_id: Uuid,
    pub city_name: String,
    pub city_slug: String,

    pub country_name: String,
    pub country_code: String,

    /// Contact details
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,

    /// Map position (both or neither)
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub logo_url: Option<String>,

    /// Moderation status: pending, approved, rejected, suspended
    pub status: String,

    /// Sponsored ad flag
    pub is_sponsored: bool,

    /// Sponsorship end; open-ended when absent
    pub sponsored_until: Option<DateTime<Utc>>,

    /// Set once a listing claim is approved
    pub is_verified: bool,

    /// Claimant email of the approved owner
    pub owner_email: Option<String>,

    /// Soft delete flag (true = active, false = deleted)
    pub is_active: bool,

    pub average_rating: Option<f64>,
    pub review_count: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusinessView {
    /// A sponsorship counts while flagged and not past its end date
    pub fn is_effectively_sponsored(&self, now: DateTime<Utc>) -> bool {
        self.is_sponsored && self.sponsored_until.map_or(true, |until| until > now)
    }

    /// Unowned, unverified listings can be claimed
    pub fn is_claimable(&self) -> bool {
        self.owner_email.is_none() && !self.is_verified
    }

    /// Convert to the public API representation
    pub fn to_response(&self, now: DateTime<Utc>) -> BusinessResponse {
        BusinessResponse {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            category: BusinessCategoryRef {
                id: self.category_id,
                name: self.category_name.clone(),
                slug: self.category_slug.clone(),
            },
            city: BusinessCityRef {
                id: self.city_id,
                name: self.city_name.clone(),
                slug: self.city_slug.clone(),
                country_name: self.country_name.clone(),
                country_code: self.country_code.clone(),
            },
            address: self.address.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            website: self.website.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            logo_url: self.logo_url.clone(),
            is_sponsored: self.is_effectively_sponsored(now),
            is_verified: self.is_verified,
            average_rating: self.average_rating.map(round_rating),
            review_count: self.review_count,
            created_at: self.created_at,
        }
    }
}

/// Round to one decimal for display
fn round_rating(rating: f64) -> f64 {
    (rating * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Serialize)]
pub struct BusinessCategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BusinessCityRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub country_name: String,
    pub country_code: String,
}

/// Public business representation
/// DOCUMENTATION: Excludes moderation and ownership fields
#[derive(Debug, Clone, Serialize)]
pub struct BusinessResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: BusinessCategoryRef,
    pub city: BusinessCityRef,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub logo_url: Option<String>,

    /// Effective sponsorship, already checked against the end date
    pub is_sponsored: bool,
    pub is_verified: bool,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Detailed response for GET /businesses/{id_or_slug}
#[derive(Debug, Serialize)]
pub struct BusinessDetailResponse {
    #[serde(flatten)]
    pub business: BusinessResponse,
    pub reviews: Vec<ReviewResponse>,
    pub is_claimable: bool,
}

/// Admin representation: every column plus the effective sponsorship
#[derive(Debug, Clone, Serialize)]
pub struct AdminBusinessResponse {
    #[serde(flatten)]
    pub business: BusinessView,
    pub sponsorship_active: bool,
}

/// Request DTO for creating a business
/// DOCUMENTATION: Used by the public submission form and the admin dashboard
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CreateBusinessRequest {
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub name: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub category_id: Uuid,

    pub city_id: Uuid,

    #[validate(length(max = 500))]
    pub address: Option<String>,

    #[validate(length(min = 3, max = 40))]
    pub phone: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(url)]
    pub website: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    #[validate(url)]
    pub logo_url: Option<String>,
}

impl CreateBusinessRequest {
    /// Coordinates come as a pair or not at all
    pub fn check_coordinates(&self) -> Result<(), crate::errors::DirectoryError> {
        check_coordinate_pair(self.latitude, self.longitude)
    }
}

pub fn check_coordinate_pair(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(), crate::errors::DirectoryError> {
    if latitude.is_some() != longitude.is_some() {
        return Err(crate::errors::DirectoryError::ValidationError(
            "latitude and longitude must be provided together".to_string(),
        ));
    }
    Ok(())
}

/// Admin creation: same fields plus an initial moderation state
#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateBusinessRequest {
    #[serde(flatten)]
    #[validate]
    pub business: CreateBusinessRequest,

    /// Defaults to approved
    pub status: Option<String>,

    #[serde(default)]
    pub is_sponsored: bool,
}

/// Request DTO for updating an existing business
/// All fields are optional - only provided fields are updated
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateBusinessRequest {
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub name: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub category_id: Option<Uuid>,

    pub city_id: Option<Uuid>,

    #[validate(length(max = 500))]
    pub address: Option<String>,

    #[validate(length(min = 3, max = 40))]
    pub phone: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(url)]
    pub website: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    #[validate(url)]
    pub logo_url: Option<String>,
}

/// POST /admin/businesses/{id}/status
#[derive(Debug, Deserialize)]
pub struct BusinessStatusRequest {
    pub status: String,
}

/// POST /admin/businesses/{id}/sponsored
#[derive(Debug, Deserialize)]
pub struct SponsorshipRequest {
    pub is_sponsored: bool,
    pub sponsored_until: Option<DateTime<Utc>>,
}

/// Public search query parameters
/// DOCUMENTATION: Parsed from the /businesses/search query string
#[derive(Debug, Default, Deserialize)]
pub struct BusinessSearchQuery {
    /// Free text, every word must match
    pub q: Option<String>,

    /// Category slug
    pub category: Option<String>,

    /// City slug
    pub city: Option<String>,

    /// ISO country code
    pub country: Option<String>,

    pub min_rating: Option<f64>,

    pub sponsored_only: Option<bool>,

    pub page: Option<i64>,

    pub limit: Option<i64>,
}

/// Admin dashboard business list query
#[derive(Debug, Default, Deserialize)]
pub struct AdminBusinessQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub category_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    pub sponsored: Option<bool>,
    /// newest, oldest, name, rating
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
pub(crate) fn sample_business(name: &str) -> BusinessView {
    let now = Utc::now();
    BusinessView {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: crate::services::slugify(name),
        description: None,
        category_id: Uuid::new_v4(),
        category_name: "Restaurants".to_string(),
        category_slug: "restaurants".to_string(),
        city_id: Uuid::new_v4(),
        city_name: "Casablanca".to_string(),
        city_slug: "casablanca".to_string(),
        country_name: "Morocco".to_string(),
        country_code: "MA".to_string(),
        address: None,
        phone: None,
        email: None,
        website: None,
        latitude: None,
        longitude: None,
        logo_url: None,
        status: "approved".to_string(),
        is_sponsored: false,
        sponsored_until: None,
        is_verified: false,
        owner_email: None,
        is_active: true,
        average_rating: None,
        review_count: 0,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_effective_sponsorship() {
        let now = Utc::now();
        let mut business = sample_business("Cafe Atlas");
        assert!(!business.is_effectively_sponsored(now));

        business.is_sponsored = true;
        assert!(business.is_effectively_sponsored(now));

        business.sponsored_until = Some(now - Duration::days(1));
        assert!(!business.is_effectively_sponsored(now));

        business.sponsored_until = Some(now + Duration::days(1));
        assert!(business.is_effectively_sponsored(now));
    }

    #[test]
    fn test_response_rounds_rating_and_hides_owner() {
        let mut business = sample_business("Cafe Atlas");
        business.average_rating = Some(4.266);
        business.owner_email = Some("owner@example.com".to_string());

        let response = business.to_response(Utc::now());
        assert_eq!(response.average_rating, Some(4.3));

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("owner_email").is_none());
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_claimable() {
        let mut business = sample_business("Cafe Atlas");
        assert!(business.is_claimable());
        business.is_verified = true;
        assert!(!business.is_claimable());
    }

    #[test]
    fn test_create_request_validation() {
        let mut req = CreateBusinessRequest {
            name: "Atlas Plumbing".to_string(),
            description: None,
            category_id: Uuid::new_v4(),
            city_id: Uuid::new_v4(),
            address: None,
            phone: Some("+212 522 000000".to_string()),
            email: Some("contact@atlas.ma".to_string()),
            website: Some("https://atlas.ma".to_string()),
            latitude: Some(33.57),
            longitude: Some(-7.59),
            logo_url: None,
        };
        assert!(req.validate().is_ok());
        assert!(req.check_coordinates().is_ok());

        req.email = Some("not-an-email".to_string());
        assert!(req.validate().is_err());

        req.email = None;
        req.latitude = Some(123.0);
        assert!(req.validate().is_err());

        req.latitude = None;
        assert!(req.check_coordinates().is_err());
    }
}

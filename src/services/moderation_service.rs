// src/services/moderation_service.rs
// DOCUMENTATION: Admin dashboard business logic
// PURPOSE: Moderation of businesses, reviews, claims and messages; sponsorship;
// admin registry and dashboard counters

use crate::db::{
    AdminUserRepository, BusinessRepository, ClaimRepository, ContactRepository, DirectoryStats,
    ReviewRepository, StatsRepository,
};
use crate::errors::DirectoryError;
use crate::models::{
    paginate_slice, AdminBusinessQuery, AdminBusinessResponse, AdminCheckResponse,
    AdminCreateBusinessRequest, AdminRole, AdminUser, BusinessView, ContactMessage,
    CreateAdminUserRequest, ListingClaim, MessageQuery, ModerationStatus, PageParams, Paginated,
    QueueQuery, Review, SponsorshipRequest, UpdateBusinessRequest,
};
use crate::services::{
    unique_slug, BusinessFilter, BusinessService, DirectoryCache, CATEGORIES_PREFIX,
    CITIES_PREFIX, COUNTRIES_PREFIX,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct ModerationService;

impl ModerationService {
    pub async fn stats(pool: &PgPool) -> Result<DirectoryStats, DirectoryError> {
        StatsRepository::collect(pool).await
    }

    // ---- businesses ----

    /// Admin table: every active business through the multi-field filter
    pub async fn list_businesses(
        pool: &PgPool,
        query: &AdminBusinessQuery,
    ) -> Result<Paginated<AdminBusinessResponse>, DirectoryError> {
        let filter = BusinessFilter::from_query(query)?;
        let now = Utc::now();

        let businesses = BusinessRepository::list_all_active(pool).await?;
        let fetched = businesses.len();
        let matched = filter.apply(businesses, now);
        log::debug!("Admin business filter kept {} of {}", matched.len(), fetched);

        Ok(paginate_slice(matched, PageParams::new(query.page, query.limit))
            .map(|b| admin_view(b, now)))
    }

    pub async fn get_business(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<AdminBusinessResponse, DirectoryError> {
        let business = BusinessRepository::get_by_id(pool, id).await?;
        Ok(admin_view(business, Utc::now()))
    }

    pub async fn create_business(
        pool: &PgPool,
        cache: &DirectoryCache,
        req: &AdminCreateBusinessRequest,
    ) -> Result<AdminBusinessResponse, DirectoryError> {
        req.business.check_coordinates()?;
        let status = match req.status.as_deref() {
            Some(raw) => raw.parse()?,
            None => ModerationStatus::Approved,
        };

        let slug = BusinessService::next_slug(pool, &req.business.name).await?;
        let business =
            BusinessRepository::create(pool, &req.business, &slug, status, req.is_sponsored)
                .await?;

        invalidate_listing_counts(cache).await;
        Ok(admin_view(business, Utc::now()))
    }

    /// Partial update; a new name gets a new slug
    pub async fn update_business(
        pool: &PgPool,
        cache: &DirectoryCache,
        id: Uuid,
        req: &UpdateBusinessRequest,
    ) -> Result<AdminBusinessResponse, DirectoryError> {
        crate::models::check_coordinate_pair(req.latitude, req.longitude)?;
        let current = BusinessRepository::get_by_id(pool, id).await?;

        let new_slug = match req.name.as_deref() {
            Some(name) if name != current.name => {
                let base = crate::services::slugify(name);
                let taken: Vec<String> = BusinessRepository::taken_slugs(pool, &base)
                    .await?
                    .into_iter()
                    .filter(|s| *s != current.slug)
                    .collect();
                Some(unique_slug(&base, &taken))
            }
            _ => None,
        };

        let business = BusinessRepository::update(pool, id, req, new_slug.as_deref()).await?;
        invalidate_listing_counts(cache).await;
        Ok(admin_view(business, Utc::now()))
    }

    pub async fn set_business_status(
        pool: &PgPool,
        cache: &DirectoryCache,
        id: Uuid,
        status: &str,
    ) -> Result<AdminBusinessResponse, DirectoryError> {
        let status: ModerationStatus = status.parse()?;
        let business = BusinessRepository::set_status(pool, id, status).await?;
        invalidate_listing_counts(cache).await;
        Ok(admin_view(business, Utc::now()))
    }

    pub async fn set_sponsorship(
        pool: &PgPool,
        id: Uuid,
        req: &SponsorshipRequest,
    ) -> Result<AdminBusinessResponse, DirectoryError> {
        let now = Utc::now();
        let until = sponsorship_end(req, now)?;
        let business = BusinessRepository::set_sponsorship(pool, id, req.is_sponsored, until).await?;
        Ok(admin_view(business, now))
    }

    pub async fn delete_business(
        pool: &PgPool,
        cache: &DirectoryCache,
        id: Uuid,
    ) -> Result<(), DirectoryError> {
        BusinessRepository::soft_delete(pool, id).await?;
        invalidate_listing_counts(cache).await;
        Ok(())
    }

    // ---- reviews ----

    pub async fn list_reviews(
        pool: &PgPool,
        query: &QueueQuery,
    ) -> Result<Paginated<Review>, DirectoryError> {
        let status = queue_status(query.status.as_deref())?;
        let page = PageParams::new(query.page, query.limit);
        let (reviews, total) = ReviewRepository::list_for_moderation(pool, status, page).await?;
        Ok(Paginated::new(reviews, total, page))
    }

    pub async fn set_review_status(
        pool: &PgPool,
        id: Uuid,
        status: &str,
    ) -> Result<Review, DirectoryError> {
        let status = ModerationStatus::parse_for_queue(status)?;
        ReviewRepository::set_status(pool, id, status).await
    }

    pub async fn delete_review(pool: &PgPool, id: Uuid) -> Result<(), DirectoryError> {
        ReviewRepository::delete(pool, id).await
    }

    // ---- claims ----

    pub async fn list_claims(
        pool: &PgPool,
        query: &QueueQuery,
    ) -> Result<Paginated<ListingClaim>, DirectoryError> {
        let status = queue_status(query.status.as_deref())?;
        let page = PageParams::new(query.page, query.limit);
        let (claims, total) = ClaimRepository::list_for_moderation(pool, status, page).await?;
        Ok(Paginated::new(claims, total, page))
    }

    pub async fn approve_claim(
        pool: &PgPool,
        id: Uuid,
        admin_notes: Option<&str>,
    ) -> Result<ListingClaim, DirectoryError> {
        // 404 for unknown ids before the pending-only update
        ClaimRepository::get_by_id(pool, id).await?;
        ClaimRepository::approve(pool, id, admin_notes).await
    }

    pub async fn reject_claim(
        pool: &PgPool,
        id: Uuid,
        admin_notes: Option<&str>,
    ) -> Result<ListingClaim, DirectoryError> {
        ClaimRepository::get_by_id(pool, id).await?;
        ClaimRepository::reject(pool, id, admin_notes).await
    }

    // ---- messages ----

    pub async fn list_messages(
        pool: &PgPool,
        query: &MessageQuery,
    ) -> Result<Paginated<ContactMessage>, DirectoryError> {
        let page = PageParams::new(query.page, query.limit);
        let (messages, total) = ContactRepository::list(pool, query.unread_only, page).await?;
        Ok(Paginated::new(messages, total, page))
    }

    pub async fn mark_message_read(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<ContactMessage, DirectoryError> {
        ContactRepository::mark_read(pool, id).await
    }

    pub async fn delete_message(pool: &PgPool, id: Uuid) -> Result<(), DirectoryError> {
        ContactRepository::delete(pool, id).await
    }

    // ---- admin registry ----

    pub async fn list_admins(pool: &PgPool) -> Result<Vec<AdminUser>, DirectoryError> {
        AdminUserRepository::list(pool).await
    }

    pub async fn add_admin(
        pool: &PgPool,
        req: &CreateAdminUserRequest,
    ) -> Result<AdminUser, DirectoryError> {
        let role = match req.role.as_deref() {
            Some(raw) => raw.parse()?,
            None => AdminRole::Moderator,
        };
        AdminUserRepository::create(pool, &req.email, req.display_name.as_deref(), role).await
    }

    /// Remove an admin user, keeping at least one `admin`
    pub async fn remove_admin(pool: &PgPool, id: Uuid) -> Result<(), DirectoryError> {
        AdminUserRepository::remove(pool, id).await
    }

    pub async fn check_admin(
        pool: &PgPool,
        email: &str,
    ) -> Result<AdminCheckResponse, DirectoryError> {
        let user = AdminUserRepository::find_by_email(pool, email).await?;
        Ok(AdminCheckResponse {
            email: email.trim().to_lowercase(),
            is_admin: user.is_some(),
            role: user.map(|u| u.role),
        })
    }
}

fn admin_view(business: BusinessView, now: DateTime<Utc>) -> AdminBusinessResponse {
    AdminBusinessResponse {
        sponsorship_active: business.is_effectively_sponsored(now),
        business,
    }
}

fn queue_status(raw: Option<&str>) -> Result<Option<ModerationStatus>, DirectoryError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && *s != "all")
        .map(ModerationStatus::parse_for_queue)
        .transpose()
}

/// End date to store for a sponsorship change
pub fn sponsorship_end(
    req: &SponsorshipRequest,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, DirectoryError> {
    if !req.is_sponsored {
        return Ok(None);
    }
    match req.sponsored_until {
        Some(until) if until <= now => Err(DirectoryError::ValidationError(
            "sponsored_until must be in the future".to_string(),
        )),
        until => Ok(until),
    }
}

/// Public lists carry business counts
async fn invalidate_listing_counts(cache: &DirectoryCache) {
    let dropped = cache.invalidate_prefix(CATEGORIES_PREFIX).await
        + cache.invalidate_prefix(COUNTRIES_PREFIX).await
        + cache.invalidate_prefix(CITIES_PREFIX).await;
    log::debug!("Business change invalidated {} cached lists", dropped);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_sponsorship_end() {
        let now = Utc::now();
        let mut req = SponsorshipRequest {
            is_sponsored: true,
            sponsored_until: None,
        };
        assert_eq!(sponsorship_end(&req, now).unwrap(), None);

        req.sponsored_until = Some(now + Duration::days(30));
        assert_eq!(sponsorship_end(&req, now).unwrap(), req.sponsored_until);

        req.sponsored_until = Some(now - Duration::days(1));
        assert!(matches!(
            sponsorship_end(&req, now),
            Err(DirectoryError::ValidationError(_))
        ));

        // Un-sponsoring clears any end date, even a past one
        req.is_sponsored = false;
        assert_eq!(sponsorship_end(&req, now).unwrap(), None);
    }

    #[test]
    fn test_queue_status() {
        assert_eq!(queue_status(None).unwrap(), None);
        assert_eq!(queue_status(Some("all")).unwrap(), None);
        assert_eq!(
            queue_status(Some("pending")).unwrap(),
            Some(ModerationStatus::Pending)
        );
        assert!(queue_status(Some("suspended")).is_err());
    }

    #[test]
    fn test_admin_view_reports_effective_sponsorship() {
        let now = Utc::now();
        let mut business = crate::models::business::sample_business("Riad Salam");
        business.is_sponsored = true;
        business.sponsored_until = Some(now - Duration::minutes(5));

        let view = admin_view(business, now);
        assert!(!view.sponsorship_active);
        assert!(view.business.is_sponsored);
    }

    #[tokio::test]
    async fn test_business_changes_drop_cached_lists() {
        let cache = DirectoryCache::new(60);
        cache
            .set(DirectoryCache::categories_key("en"), "[]".to_string())
            .await;
        cache
            .set(DirectoryCache::cities_key("MA", "fr"), "[]".to_string())
            .await;

        invalidate_listing_counts(&cache).await;
        assert_eq!(cache.get(&DirectoryCache::categories_key("en")).await, None);
        assert_eq!(cache.get(&DirectoryCache::cities_key("MA", "fr")).await, None);
    }
}

// src/db/business_repository.rs
// DOCUMENTATION: Database access layer for business listings
// PURPOSE: All SQL touching the businesses table

use crate::errors::DirectoryError;
use crate::models::{
    BusinessView, CreateBusinessRequest, ModerationStatus, PageParams, UpdateBusinessRequest,
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Business columns plus joined names and approved-review aggregates
/// DOCUMENTATION: Every query returning BusinessView starts from this
const BUSINESS_SELECT: &str = r#"
    SELECT
        b.id, b.name, b.slug, b.description,
        b.category_id, c.name AS category_name, c.slug AS category_slug,
        b.city_id, ci.name AS city_name, ci.slug AS city_slug,
        co.name AS country_name, co.code AS country_code,
        b.address, b.phone, b.email, b.website,
        b.latitude, b.longitude, b.logo_url,
        b.status, b.is_sponsored, b.sponsored_until, b.is_verified,
        b.owner_email, b.is_active,
        r.average_rating, COALESCE(r.review_count, 0) AS review_count,
        b.created_at, b.updated_at
    FROM businesses b
    JOIN categories c ON c.id = b.category_id
    JOIN cities ci ON ci.id = b.city_id
    JOIN countries co ON co.id = ci.country_id
    LEFT JOIN LATERAL (
        SELECT AVG(rating)::float8 AS average_rating, COUNT(*) AS review_count
        FROM reviews
        WHERE business_id = b.id AND status = 'approved'
    ) r ON true
"#;

const BUSINESS_COUNT_FROM: &str = r#"
    SELECT COUNT(*)
    FROM businesses b
    JOIN categories c ON c.id = b.category_id
    JOIN cities ci ON ci.id = b.city_id
    JOIN countries co ON co.id = ci.country_id
    LEFT JOIN LATERAL (
        SELECT AVG(rating)::float8 AS average_rating
        FROM reviews
        WHERE business_id = b.id AND status = 'approved'
    ) r ON true
"#;

/// Sponsored (and not expired) first, then best rated, then by name
const PUBLIC_ORDER: &str = r#"
    ORDER BY
        (b.is_sponsored AND (b.sponsored_until IS NULL OR b.sponsored_until > NOW())) DESC,
        r.average_rating DESC NULLS LAST,
        b.name ASC
"#;

/// Filters shared by search, category pages and city pages
/// DOCUMENTATION: Only approved, active businesses are ever public
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// Lower-cased words, each must match name, description or address
    pub tokens: Vec<String>,
    pub category_slug: Option<String>,
    pub city_slug: Option<String>,
    pub country_code: Option<String>,
    pub min_rating: Option<f64>,
    pub sponsored_only: bool,
    /// Map pages only want businesses that can be placed
    pub with_coordinates: bool,
}

/// Escape LIKE wildcards in user text
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_listing_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ListingFilter) {
    qb.push(" WHERE b.is_active = true AND b.status = 'approved' AND c.is_active = true");

    for token in &filter.tokens {
        let pattern = format!("%{}%", escape_like(token));
        qb.push(" AND (b.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR b.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR b.address ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(category) = &filter.category_slug {
        qb.push(" AND c.slug = ").push_bind(category.clone());
    }

    if let Some(city) = &filter.city_slug {
        qb.push(" AND ci.slug = ").push_bind(city.clone());
    }

    if let Some(country) = &filter.country_code {
        qb.push(" AND co.code = ").push_bind(country.to_uppercase());
    }

    if let Some(min_rating) = filter.min_rating {
        qb.push(" AND r.average_rating >= ").push_bind(min_rating);
    }

    if filter.sponsored_only {
        qb.push(
            " AND b.is_sponsored = true AND (b.sponsored_until IS NULL OR b.sponsored_until > NOW())",
        );
    }

    if filter.with_coordinates {
        qb.push(" AND b.latitude IS NOT NULL AND b.longitude IS NOT NULL");
    }
}

/// BusinessRepository: All database operations for businesses
pub struct BusinessRepository;

impl BusinessRepository {
    /// Public listing with filters
    /// DOCUMENTATION: Returns tuple: (results, total_count) for pagination
    pub async fn search(
        pool: &PgPool,
        filter: &ListingFilter,
        page: PageParams,
    ) -> Result<(Vec<BusinessView>, i64), DirectoryError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(BUSINESS_COUNT_FROM);
        push_listing_filters(&mut count_qb, filter);
        let (total,): (i64,) = count_qb
            .build_query_as()
            .fetch_one(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Count businesses", e))?;

        let mut qb = QueryBuilder::<Postgres>::new(BUSINESS_SELECT);
        push_listing_filters(&mut qb, filter);
        qb.push(PUBLIC_ORDER);
        qb.push(" LIMIT ").push_bind(page.limit);
        qb.push(" OFFSET ").push_bind(page.offset());

        log::debug!("Executing listing query: {}", qb.sql());

        let businesses = qb
            .build_query_as::<BusinessView>()
            .fetch_all(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Search businesses", e))?;

        log::info!(
            "Listing query completed: {} results, {} total (page {})",
            businesses.len(),
            total,
            page.page
        );

        Ok((businesses, total))
    }

    /// Every public business matching the filter, unpaginated (map view)
    pub async fn list_public(
        pool: &PgPool,
        filter: &ListingFilter,
    ) -> Result<Vec<BusinessView>, DirectoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(BUSINESS_SELECT);
        push_listing_filters(&mut qb, filter);
        qb.push(PUBLIC_ORDER);

        qb.build_query_as::<BusinessView>()
            .fetch_all(pool)
            .await
            .map_err(|e| DirectoryError::from_db("List public businesses", e))
    }

    /// Every active business regardless of status (admin table)
    pub async fn list_all_active(pool: &PgPool) -> Result<Vec<BusinessView>, DirectoryError> {
        let sql = format!("{} WHERE b.is_active = true", BUSINESS_SELECT);
        sqlx::query_as::<_, BusinessView>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| DirectoryError::from_db("List businesses", e))
    }

    /// Retrieve an active business by ID, whatever its moderation status
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<BusinessView, DirectoryError> {
        let sql = format!("{} WHERE b.id = $1 AND b.is_active = true", BUSINESS_SELECT);
        sqlx::query_as::<_, BusinessView>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Fetch business", e))?
            .ok_or_else(|| {
                log::warn!("Business not found: {}", id);
                DirectoryError::NotFound(format!("business {}", id))
            })
    }

    /// Retrieve a publicly visible business by UUID or slug
    pub async fn get_public(pool: &PgPool, identifier: &str) -> Result<BusinessView, DirectoryError> {
        let visible = "b.is_active = true AND b.status = 'approved' AND c.is_active = true";
        let query = match Uuid::parse_str(identifier) {
            Ok(id) => {
                let sql = format!("{} WHERE b.id = $1 AND {}", BUSINESS_SELECT, visible);
                sqlx::query_as::<_, BusinessView>(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            }
            Err(_) => {
                let sql = format!("{} WHERE b.slug = $1 AND {}", BUSINESS_SELECT, visible);
                sqlx::query_as::<_, BusinessView>(&sql)
                    .bind(identifier)
                    .fetch_optional(pool)
                    .await
            }
        };

        query
            .map_err(|e| DirectoryError::from_db("Fetch business", e))?
            .ok_or_else(|| {
                log::warn!("Public business not found: {}", identifier);
                DirectoryError::NotFound(format!("business '{}'", identifier))
            })
    }

    /// Existing slugs equal to `base` or of the form `base-N`
    pub async fn taken_slugs(pool: &PgPool, base: &str) -> Result<Vec<String>, DirectoryError> {
        sqlx::query_scalar::<_, String>(
            "SELECT slug FROM businesses WHERE slug = $1 OR slug LIKE $2",
        )
        .bind(base)
        .bind(format!("{}-%", escape_like(base)))
        .fetch_all(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Check business slugs", e))
    }

    /// Create new business
    pub async fn create(
        pool: &PgPool,
        req: &CreateBusinessRequest,
        slug: &str,
        status: ModerationStatus,
        is_sponsored: bool,
    ) -> Result<BusinessView, DirectoryError> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO businesses (
                name, slug, description, category_id, city_id,
                address, phone, email, website,
                latitude, longitude, logo_url,
                status, is_sponsored
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(&req.name) // $1
        .bind(slug) // $2
        .bind(&req.description) // $3
        .bind(req.category_id) // $4
        .bind(req.city_id) // $5
        .bind(&req.address) // $6
        .bind(&req.phone) // $7
        .bind(&req.email) // $8
        .bind(&req.website) // $9
        .bind(req.latitude) // $10
        .bind(req.longitude) // $11
        .bind(&req.logo_url) // $12
        .bind(status.as_str()) // $13
        .bind(is_sponsored) // $14
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Create business", e))?;

        let business = Self::get_by_id(pool, id).await?;
        log::info!("Created business {} ({})", business.slug, business.status);
        Ok(business)
    }

    /// Update existing business
    /// DOCUMENTATION: Partial update - only provided fields are modified
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateBusinessRequest,
        new_slug: Option<&str>,
    ) -> Result<BusinessView, DirectoryError> {
        let updated = sqlx::query(
            r#"
            UPDATE businesses
            SET name = COALESCE($1, name),
                slug = COALESCE($2, slug),
                description = COALESCE($3, description),
                category_id = COALESCE($4, category_id),
                city_id = COALESCE($5, city_id),
                address = COALESCE($6, address),
                phone = COALESCE($7, phone),
                email = COALESCE($8, email),
                website = COALESCE($9, website),
                latitude = COALESCE($10, latitude),
                longitude = COALESCE($11, longitude),
                logo_url = COALESCE($12, logo_url),
                updated_at = NOW()
            WHERE id = $13 AND is_active = true
            "#,
        )
        .bind(&req.name)
        .bind(new_slug)
        .bind(&req.description)
        .bind(req.category_id)
        .bind(req.city_id)
        .bind(&req.address)
        .bind(&req.phone)
        .bind(&req.email)
        .bind(&req.website)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(&req.logo_url)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Update business", e))?
        .rows_affected();

        if updated == 0 {
            return Err(DirectoryError::NotFound(format!("business {}", id)));
        }

        log::info!("Updated business: {}", id);
        Self::get_by_id(pool, id).await
    }

    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: ModerationStatus,
    ) -> Result<BusinessView, DirectoryError> {
        let rows = sqlx::query(
            "UPDATE businesses SET status = $1, updated_at = NOW() WHERE id = $2 AND is_active = true",
        )
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Update business status", e))?
        .rows_affected();

        if rows == 0 {
            return Err(DirectoryError::NotFound(format!("business {}", id)));
        }

        log::info!("Business {} is now {}", id, status);
        Self::get_by_id(pool, id).await
    }

    pub async fn set_sponsorship(
        pool: &PgPool,
        id: Uuid,
        is_sponsored: bool,
        sponsored_until: Option<DateTime<Utc>>,
    ) -> Result<BusinessView, DirectoryError> {
        let rows = sqlx::query(
            r#"
            UPDATE businesses
            SET is_sponsored = $1, sponsored_until = $2, updated_at = NOW()
            WHERE id = $3 AND is_active = true
            "#,
        )
        .bind(is_sponsored)
        .bind(sponsored_until)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Update sponsorship", e))?
        .rows_affected();

        if rows == 0 {
            return Err(DirectoryError::NotFound(format!("business {}", id)));
        }

        log::info!("Business {} sponsored={} until {:?}", id, is_sponsored, sponsored_until);
        Self::get_by_id(pool, id).await
    }

    /// Soft delete business
    /// DOCUMENTATION: Sets is_active=false instead of physical deletion
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<(), DirectoryError> {
        let rows = sqlx::query(
            "UPDATE businesses SET is_active = false, updated_at = NOW() WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Delete business", e))?
        .rows_affected();

        if rows == 0 {
            return Err(DirectoryError::NotFound(format!("business {}", id)));
        }

        log::info!("Deleted business: {}", id);
        Ok(())
    }

    /// Delete a category or city row
    /// DOCUMENTATION: In one transaction the row is locked, active businesses
    /// block the delete (409), soft-deleted businesses still referencing it are
    /// purged (their reviews and claims cascade), then the row is removed.
    /// The row lock serializes against concurrent business inserts.
    pub async fn remove_catalog_entry(
        pool: &PgPool,
        entry: CatalogEntry,
        id: Uuid,
    ) -> Result<u64, DirectoryError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| DirectoryError::from_db("Begin catalog delete", e))?;

        let locked = sqlx::query_scalar::<_, Uuid>(&format!(
            "SELECT id FROM {} WHERE id = $1 FOR UPDATE",
            entry.table()
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DirectoryError::from_db("Lock catalog entry", e))?;

        if locked.is_none() {
            return Err(DirectoryError::NotFound(format!("{} {}", entry.label(), id)));
        }

        let active = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM businesses WHERE {} = $1 AND is_active = true",
            entry.column()
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DirectoryError::from_db("Count catalog businesses", e))?;

        ensure_unused(entry, id, active)?;

        let purged = sqlx::query(&format!(
            "DELETE FROM businesses WHERE {} = $1 AND is_active = false",
            entry.column()
        ))
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DirectoryError::from_db("Purge deleted businesses", e))?
        .rows_affected();

        sqlx::query(&format!("DELETE FROM {} WHERE id = $1", entry.table()))
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DirectoryError::from_db("Delete catalog entry", e))?;

        tx.commit()
            .await
            .map_err(|e| DirectoryError::from_db("Commit catalog delete", e))?;

        log::info!(
            "Deleted {} {} ({} soft-deleted businesses purged)",
            entry.label(),
            id,
            purged
        );
        Ok(purged)
    }
}

/// Catalog rows that businesses reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntry {
    Category,
    City,
}

impl CatalogEntry {
    fn table(&self) -> &'static str {
        match self {
            CatalogEntry::Category => "categories",
            CatalogEntry::City => "cities",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            CatalogEntry::Category => "category_id",
            CatalogEntry::City => "city_id",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CatalogEntry::Category => "category",
            CatalogEntry::City => "city",
        }
    }
}

/// Only active businesses keep a catalog row alive
fn ensure_unused(entry: CatalogEntry, id: Uuid, active: i64) -> Result<(), DirectoryError> {
    if active > 0 {
        return Err(DirectoryError::AlreadyExists(format!(
            "{} {} still has {} active businesses",
            entry.label(),
            id,
            active
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("atlas"), "atlas");
    }

    #[test]
    fn test_listing_filters_bind_user_text() {
        let filter = ListingFilter {
            tokens: vec!["o'brien".to_string()],
            category_slug: Some("plumbers".to_string()),
            min_rating: Some(4.0),
            sponsored_only: true,
            ..Default::default()
        };

        let mut qb = QueryBuilder::<Postgres>::new(BUSINESS_SELECT);
        push_listing_filters(&mut qb, &filter);
        let sql = qb.sql();

        assert!(!sql.contains("o'brien"));
        assert!(sql.contains("b.name ILIKE $1"));
        assert!(sql.contains("c.slug = $4"));
        assert!(sql.contains("r.average_rating >= $5"));
        assert!(sql.contains("b.status = 'approved'"));
        assert!(sql.contains("b.sponsored_until > NOW()"));
    }

    #[test]
    fn test_catalog_entry_in_use_blocks_removal() {
        let id = Uuid::new_v4();
        assert!(ensure_unused(CatalogEntry::Category, id, 0).is_ok());

        match ensure_unused(CatalogEntry::City, id, 2) {
            Err(DirectoryError::AlreadyExists(msg)) => {
                assert!(msg.starts_with("city"));
                assert!(msg.contains("2 active businesses"));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_catalog_entry_targets() {
        assert_eq!(CatalogEntry::Category.table(), "categories");
        assert_eq!(CatalogEntry::Category.column(), "category_id");
        assert_eq!(CatalogEntry::City.table(), "cities");
        assert_eq!(CatalogEntry::City.column(), "city_id");
    }
}

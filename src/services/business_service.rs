// src/services/business_service.rs
// DOCUMENTATION: Business logic for public business listings
// PURPOSE: Intermediary between handlers and repositories for search, detail, submission and maps

use crate::db::{BusinessRepository, LocationRepository, ListingFilter, ReviewRepository};
use crate::errors::DirectoryError;
use crate::models::{
    BusinessDetailResponse, BusinessResponse, BusinessSearchQuery, BusinessView, City,
    CityMapQuery, CityMapResponse, CreateBusinessRequest, ModerationStatus, PageParams, Paginated,
    MAX_PAGE_SIZE,
};
use crate::services::business_filter::tokenize;
use crate::services::map_cluster::{
    bounds, cluster_points, map_center, rect_to_lat_lng_array, to_feature_collection, viewport,
    ClusterOptions, MapPoint, DEFAULT_ZOOM, MAX_ZOOM,
};
use crate::services::{slugify, unique_slug};
use chrono::{DateTime, Utc};
use geo_types::Point;
use sqlx::PgPool;

pub struct BusinessService;

impl BusinessService {
    /// Public search over approved, active businesses
    pub async fn search(
        pool: &PgPool,
        query: &BusinessSearchQuery,
    ) -> Result<Paginated<BusinessResponse>, DirectoryError> {
        let filter = Self::listing_filter(query)?;
        let page = PageParams::new(query.page, query.limit);

        let (businesses, total) = BusinessRepository::search(pool, &filter, page).await?;
        let now = Utc::now();

        Ok(Paginated::new(
            businesses.iter().map(|b| b.to_response(now)).collect(),
            total,
            page,
        ))
    }

    /// Translate query parameters into repository filters
    pub fn listing_filter(query: &BusinessSearchQuery) -> Result<ListingFilter, DirectoryError> {
        if let Some(min_rating) = query.min_rating {
            if !(0.0..=5.0).contains(&min_rating) {
                return Err(DirectoryError::InvalidInput(
                    "min_rating must be between 0 and 5".to_string(),
                ));
            }
        }

        Ok(ListingFilter {
            tokens: tokenize(query.q.as_deref().unwrap_or("")),
            category_slug: non_blank(query.category.as_deref()),
            city_slug: non_blank(query.city.as_deref()),
            country_code: non_blank(query.country.as_deref()),
            min_rating: query.min_rating,
            sponsored_only: query.sponsored_only.unwrap_or(false),
            with_coordinates: false,
        })
    }

    /// Business page by UUID or slug, with its approved reviews
    pub async fn get_detail(
        pool: &PgPool,
        identifier: &str,
    ) -> Result<BusinessDetailResponse, DirectoryError> {
        let business = BusinessRepository::get_public(pool, identifier).await?;
        let (reviews, _) = ReviewRepository::list_approved(
            pool,
            business.id,
            PageParams::new(Some(1), Some(MAX_PAGE_SIZE)),
        )
        .await?;

        Ok(BusinessDetailResponse {
            business: business.to_response(Utc::now()),
            reviews: reviews.iter().map(|r| r.to_response()).collect(),
            is_claimable: business.is_claimable(),
        })
    }

    /// Public listing submission, held for moderation
    pub async fn submit(
        pool: &PgPool,
        req: &CreateBusinessRequest,
    ) -> Result<BusinessResponse, DirectoryError> {
        req.check_coordinates()?;
        let slug = Self::next_slug(pool, &req.name).await?;
        let business =
            BusinessRepository::create(pool, req, &slug, ModerationStatus::Pending, false).await?;

        log::info!("Listing '{}' submitted for review", business.slug);
        Ok(business.to_response(Utc::now()))
    }

    /// Unused slug derived from `name`
    pub async fn next_slug(pool: &PgPool, name: &str) -> Result<String, DirectoryError> {
        let base = slugify(name);
        let taken = BusinessRepository::taken_slugs(pool, &base).await?;
        Ok(unique_slug(&base, &taken))
    }

    /// Clustered markers for a city's approved businesses
    pub async fn city_map(
        pool: &PgPool,
        city_slug: &str,
        query: &CityMapQuery,
    ) -> Result<CityMapResponse, DirectoryError> {
        let zoom = query.zoom.unwrap_or(DEFAULT_ZOOM);
        if zoom > MAX_ZOOM {
            return Err(DirectoryError::InvalidInput(format!(
                "zoom must be between 0 and {}",
                MAX_ZOOM
            )));
        }
        let view = parse_viewport(query)?;

        let city = LocationRepository::get_city_by_slug(pool, city_slug).await?;
        let filter = ListingFilter {
            city_slug: Some(city.slug.clone()),
            category_slug: non_blank(query.category.as_deref()),
            with_coordinates: true,
            ..Default::default()
        };
        let businesses = BusinessRepository::list_public(pool, &filter).await?;

        Ok(build_city_map(&city, &businesses, zoom, view, Utc::now()))
    }
}

/// Assemble the map payload from already-fetched businesses
pub fn build_city_map(
    city: &City,
    businesses: &[BusinessView],
    zoom: u8,
    view: Option<geo_types::Rect<f64>>,
    now: DateTime<Utc>,
) -> CityMapResponse {
    let points = map_points(businesses, now);
    let features = cluster_points(&points, zoom, view, &ClusterOptions::default());
    let extent = bounds(&points);

    log::debug!(
        "City map {} at zoom {}: {} points, {} features",
        city.slug,
        zoom,
        points.len(),
        features.len()
    );

    CityMapResponse {
        city_id: city.id,
        city_slug: city.slug.clone(),
        zoom,
        center: map_center(extent.as_ref(), city.coordinates()),
        bounds: extent.as_ref().map(rect_to_lat_lng_array),
        marker_count: points.len(),
        markers: to_feature_collection(&features),
    }
}

/// Businesses that can be placed on the map
pub fn map_points(businesses: &[BusinessView], now: DateTime<Utc>) -> Vec<MapPoint> {
    businesses
        .iter()
        .filter_map(|b| {
            let (lat, lng) = b.latitude.zip(b.longitude)?;
            Some(MapPoint {
                id: b.id,
                name: b.name.clone(),
                slug: b.slug.clone(),
                category: b.category_name.clone(),
                location: Point::new(lng, lat),
                is_sponsored: b.is_effectively_sponsored(now),
            })
        })
        .collect()
}

/// All four viewport edges or none
fn parse_viewport(query: &CityMapQuery) -> Result<Option<geo_types::Rect<f64>>, DirectoryError> {
    match (query.min_lat, query.min_lng, query.max_lat, query.max_lng) {
        (None, None, None, None) => Ok(None),
        (Some(min_lat), Some(min_lng), Some(max_lat), Some(max_lng)) => {
            if min_lat > max_lat || min_lng > max_lng {
                return Err(DirectoryError::InvalidInput(
                    "viewport minimum must not exceed maximum".to_string(),
                ));
            }
            Ok(Some(viewport(min_lat, min_lng, max_lat, max_lng)))
        }
        _ => Err(DirectoryError::InvalidInput(
            "min_lat, min_lng, max_lat and max_lng must be given together".to_string(),
        )),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::business::sample_business;
    use chrono::Duration;
    use serde_json::json;
    use uuid::Uuid;

    fn casablanca() -> City {
        let now = Utc::now();
        City {
            id: Uuid::new_v4(),
            country_id: Uuid::new_v4(),
            country_name: "Morocco".to_string(),
            country_code: "MA".to_string(),
            name: "Casablanca".to_string(),
            slug: "casablanca".to_string(),
            latitude: Some(33.5731),
            longitude: Some(-7.5898),
            translations: json!({}),
            created_at: now,
            updated_at: now,
            business_count: 0,
        }
    }

    fn placed(name: &str, lat: f64, lng: f64) -> BusinessView {
        let mut business = sample_business(name);
        business.latitude = Some(lat);
        business.longitude = Some(lng);
        business
    }

    #[test]
    fn test_listing_filter_from_query() {
        let query = BusinessSearchQuery {
            q: Some("  Grand  Cafe ".to_string()),
            category: Some(" ".to_string()),
            city: Some("rabat".to_string()),
            sponsored_only: Some(true),
            ..Default::default()
        };
        let filter = BusinessService::listing_filter(&query).unwrap();
        assert_eq!(filter.tokens, vec!["grand", "cafe"]);
        assert_eq!(filter.category_slug, None);
        assert_eq!(filter.city_slug.as_deref(), Some("rabat"));
        assert!(filter.sponsored_only);
        assert!(!filter.with_coordinates);
    }

    #[test]
    fn test_listing_filter_rejects_bad_rating() {
        let query = BusinessSearchQuery {
            min_rating: Some(6.0),
            ..Default::default()
        };
        assert!(matches!(
            BusinessService::listing_filter(&query),
            Err(DirectoryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_map_points_skip_unplaced_and_flag_sponsors() {
        let now = Utc::now();
        let mut sponsored = placed("Dar Zellij", 33.59, -7.61);
        sponsored.is_sponsored = true;
        let mut expired = placed("Cafe Maure", 33.58, -7.62);
        expired.is_sponsored = true;
        expired.sponsored_until = Some(now - Duration::hours(1));
        let unplaced = sample_business("Hammam Sidi");

        let points = map_points(&[sponsored, expired, unplaced], now);
        assert_eq!(points.len(), 2);
        assert!(points[0].is_sponsored);
        assert!(!points[1].is_sponsored);
        assert_eq!(points[0].lat(), 33.59);
        assert_eq!(points[0].lng(), -7.61);
    }

    #[test]
    fn test_city_map_centres_on_city_without_markers() {
        let city = casablanca();
        let map = build_city_map(&city, &[], DEFAULT_ZOOM, None, Utc::now());
        assert_eq!(map.center, [33.5731, -7.5898]);
        assert_eq!(map.bounds, None);
        assert_eq!(map.marker_count, 0);
        assert!(map.markers.features.is_empty());
    }

    #[test]
    fn test_city_map_clusters_close_businesses() {
        let city = casablanca();
        let businesses = vec![
            placed("Cafe A", 33.5900, -7.6100),
            placed("Cafe B", 33.5901, -7.6101),
            placed("Cafe C", 33.5000, -7.5000),
        ];

        let low = build_city_map(&city, &businesses, 10, None, Utc::now());
        assert_eq!(low.marker_count, 3);
        assert_eq!(low.markers.features.len(), 2);
        assert_eq!(low.bounds, Some([33.5, -7.61, 33.5901, -7.5]));

        let high = build_city_map(&city, &businesses, 18, None, Utc::now());
        assert_eq!(high.markers.features.len(), 3);
    }

    #[test]
    fn test_parse_viewport() {
        let mut query = CityMapQuery::default();
        assert!(parse_viewport(&query).unwrap().is_none());

        query.min_lat = Some(33.0);
        assert!(parse_viewport(&query).is_err());

        query.min_lng = Some(-8.0);
        query.max_lat = Some(34.0);
        query.max_lng = Some(-7.0);
        assert!(parse_viewport(&query).unwrap().is_some());

        query.max_lat = Some(32.0);
        assert!(parse_viewport(&query).is_err());
    }
}

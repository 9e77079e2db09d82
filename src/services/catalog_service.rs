// src/services/catalog_service.rs
// DOCUMENTATION: Categories, countries and cities
// PURPOSE: Localized, cached public listings plus the admin catalog mutations
// that invalidate them

use crate::db::{
    BusinessRepository, CatalogEntry, CategoryRepository, ListingFilter, LocationRepository,
    LocationTable,
};
use crate::errors::DirectoryError;
use crate::models::{
    Category, CategoryDetailResponse, CategoryResponse, City, CityDetailResponse,
    CityListingQuery, CityResponse, Country, CountryResponse, CreateCategoryRequest,
    CreateCityRequest, CreateCountryRequest, PageParams, Paginated, UpdateCategoryRequest,
    UpdateCityRequest, UpdateCountryRequest,
};
use crate::services::{
    slugify, text_direction, unique_slug, validate_translations, DirectoryCache, GeocodingClient,
    CATEGORIES_PREFIX, CITIES_PREFIX, COUNTRIES_PREFIX,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

pub struct CatalogService;

impl CatalogService {
    // ---- public ----

    pub async fn list_categories(
        pool: &PgPool,
        cache: &DirectoryCache,
        locale: &str,
    ) -> Result<Vec<CategoryResponse>, DirectoryError> {
        cache
            .get_or_load(&DirectoryCache::categories_key(locale), || async {
                let categories = CategoryRepository::list_active(pool).await?;
                Ok(categories.iter().map(|c| c.to_response(locale)).collect())
            })
            .await
    }

    pub async fn category_detail(
        pool: &PgPool,
        slug: &str,
        locale: &str,
        page: PageParams,
    ) -> Result<CategoryDetailResponse, DirectoryError> {
        let category = CategoryRepository::get_active_by_slug(pool, slug).await?;
        let filter = ListingFilter {
            category_slug: Some(category.slug.clone()),
            ..Default::default()
        };
        let (businesses, total) = BusinessRepository::search(pool, &filter, page).await?;
        let now = Utc::now();

        Ok(CategoryDetailResponse {
            category: category.to_response(locale),
            businesses: Paginated::new(
                businesses.iter().map(|b| b.to_response(now)).collect(),
                total,
                page,
            ),
            locale: locale.to_string(),
            direction: text_direction(locale),
        })
    }

    pub async fn list_countries(
        pool: &PgPool,
        cache: &DirectoryCache,
        locale: &str,
    ) -> Result<Vec<CountryResponse>, DirectoryError> {
        cache
            .get_or_load(&DirectoryCache::countries_key(locale), || async {
                let countries = LocationRepository::list_countries(pool).await?;
                Ok(countries.iter().map(|c| c.to_response(locale)).collect())
            })
            .await
    }

    pub async fn list_cities(
        pool: &PgPool,
        cache: &DirectoryCache,
        country_code: &str,
        locale: &str,
    ) -> Result<Vec<CityResponse>, DirectoryError> {
        let code = country_code.trim().to_uppercase();
        cache
            .get_or_load(&DirectoryCache::cities_key(&code, locale), || async {
                let country = LocationRepository::get_country_by_code(pool, &code).await?;
                let cities = LocationRepository::list_cities_by_country(pool, country.id).await?;
                Ok(cities.iter().map(|c| c.to_response(locale)).collect())
            })
            .await
    }

    pub async fn city_detail(
        pool: &PgPool,
        slug: &str,
        query: &CityListingQuery,
        locale: &str,
    ) -> Result<CityDetailResponse, DirectoryError> {
        let city = LocationRepository::get_city_by_slug(pool, slug).await?;
        let page = PageParams::new(query.page, query.limit);
        let filter = ListingFilter {
            city_slug: Some(city.slug.clone()),
            category_slug: query
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            ..Default::default()
        };
        let (businesses, total) = BusinessRepository::search(pool, &filter, page).await?;
        let now = Utc::now();

        Ok(CityDetailResponse {
            city: city.to_response(locale),
            businesses: Paginated::new(
                businesses.iter().map(|b| b.to_response(now)).collect(),
                total,
                page,
            ),
            locale: locale.to_string(),
            direction: text_direction(locale),
        })
    }

    // ---- admin: categories ----

    pub async fn admin_categories(pool: &PgPool) -> Result<Vec<Category>, DirectoryError> {
        CategoryRepository::list_all(pool).await
    }

    pub async fn create_category(
        pool: &PgPool,
        cache: &DirectoryCache,
        req: &CreateCategoryRequest,
    ) -> Result<Category, DirectoryError> {
        check_translations(req.translations.as_ref())?;
        let base = slugify(&req.name);
        let taken = CategoryRepository::taken_slugs(pool, &base).await?;
        let category = CategoryRepository::create(pool, req, &unique_slug(&base, &taken)).await?;

        cache.invalidate_prefix(CATEGORIES_PREFIX).await;
        Ok(category)
    }

    pub async fn update_category(
        pool: &PgPool,
        cache: &DirectoryCache,
        id: Uuid,
        req: &UpdateCategoryRequest,
    ) -> Result<Category, DirectoryError> {
        check_translations(req.translations.as_ref())?;
        let current = CategoryRepository::get_by_id(pool, id).await?;

        let new_slug = match req.name.as_deref() {
            Some(name) if name != current.name => {
                let base = slugify(name);
                let taken = CategoryRepository::taken_slugs(pool, &base).await?;
                Some(unique_slug(&base, &without(&taken, &current.slug)))
            }
            _ => None,
        };

        let category = CategoryRepository::update(pool, id, req, new_slug.as_deref()).await?;
        cache.invalidate_prefix(CATEGORIES_PREFIX).await;
        Ok(category)
    }

    pub async fn delete_category(
        pool: &PgPool,
        cache: &DirectoryCache,
        id: Uuid,
    ) -> Result<(), DirectoryError> {
        BusinessRepository::remove_catalog_entry(pool, CatalogEntry::Category, id).await?;
        cache.invalidate_prefix(CATEGORIES_PREFIX).await;
        Ok(())
    }

    // ---- admin: countries ----

    pub async fn admin_countries(pool: &PgPool) -> Result<Vec<Country>, DirectoryError> {
        LocationRepository::list_countries(pool).await
    }

    pub async fn create_country(
        pool: &PgPool,
        cache: &DirectoryCache,
        req: &CreateCountryRequest,
    ) -> Result<Country, DirectoryError> {
        check_translations(req.translations.as_ref())?;
        if !req.code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DirectoryError::ValidationError(
                "country code must be two letters".to_string(),
            ));
        }

        let base = slugify(&req.name);
        let taken = LocationRepository::taken_slugs(pool, LocationTable::Countries, &base).await?;
        let country =
            LocationRepository::create_country(pool, req, &unique_slug(&base, &taken)).await?;

        cache.invalidate_prefix(COUNTRIES_PREFIX).await;
        Ok(country)
    }

    pub async fn update_country(
        pool: &PgPool,
        cache: &DirectoryCache,
        id: Uuid,
        req: &UpdateCountryRequest,
    ) -> Result<Country, DirectoryError> {
        check_translations(req.translations.as_ref())?;
        let country = LocationRepository::update_country(pool, id, req).await?;

        // City payloads carry the country name
        cache.invalidate_prefix(COUNTRIES_PREFIX).await;
        cache.invalidate_prefix(CITIES_PREFIX).await;
        Ok(country)
    }

    pub async fn delete_country(
        pool: &PgPool,
        cache: &DirectoryCache,
        id: Uuid,
    ) -> Result<(), DirectoryError> {
        let cities = LocationRepository::count_cities(pool, id).await?;
        if cities > 0 {
            return Err(DirectoryError::AlreadyExists(format!(
                "country {} still has {} cities",
                id, cities
            )));
        }

        LocationRepository::delete_country(pool, id).await?;
        cache.invalidate_prefix(COUNTRIES_PREFIX).await;
        cache.invalidate_prefix(CITIES_PREFIX).await;
        Ok(())
    }

    // ---- admin: cities ----

    pub async fn admin_cities(pool: &PgPool) -> Result<Vec<City>, DirectoryError> {
        LocationRepository::list_all_cities(pool).await
    }

    /// Create a city, geocoding it when no coordinates are supplied
    /// DOCUMENTATION: A failed lookup is logged and the city is stored unplaced
    pub async fn create_city(
        pool: &PgPool,
        cache: &DirectoryCache,
        geocoder: &GeocodingClient,
        req: &CreateCityRequest,
    ) -> Result<City, DirectoryError> {
        check_translations(req.translations.as_ref())?;
        crate::models::check_coordinate_pair(req.latitude, req.longitude)?;
        let country = LocationRepository::get_country(pool, req.country_id).await?;

        let coordinates = match req.latitude.zip(req.longitude) {
            Some(coords) => Some(coords),
            None => {
                let query = format!("{}, {}", req.name, country.name);
                match geocoder.search(&query).await {
                    Ok(found) => {
                        if found.is_none() {
                            log::warn!("No geocoding match for '{}'", query);
                        }
                        found
                    }
                    Err(e) => {
                        log::warn!("Geocoding '{}' failed, storing without coordinates: {}", query, e);
                        None
                    }
                }
            }
        };

        let base = slugify(&req.name);
        let taken = LocationRepository::taken_slugs(pool, LocationTable::Cities, &base).await?;
        let city =
            LocationRepository::create_city(pool, req, &unique_slug(&base, &taken), coordinates)
                .await?;

        cache.invalidate_prefix(CITIES_PREFIX).await;
        Ok(city)
    }

    pub async fn update_city(
        pool: &PgPool,
        cache: &DirectoryCache,
        id: Uuid,
        req: &UpdateCityRequest,
    ) -> Result<City, DirectoryError> {
        check_translations(req.translations.as_ref())?;
        crate::models::check_coordinate_pair(req.latitude, req.longitude)?;
        let current = LocationRepository::get_city(pool, id).await?;

        let new_slug = match req.name.as_deref() {
            Some(name) if name != current.name => {
                let base = slugify(name);
                let taken =
                    LocationRepository::taken_slugs(pool, LocationTable::Cities, &base).await?;
                Some(unique_slug(&base, &without(&taken, &current.slug)))
            }
            _ => None,
        };

        let city = LocationRepository::update_city(pool, id, req, new_slug.as_deref()).await?;
        cache.invalidate_prefix(CITIES_PREFIX).await;
        Ok(city)
    }

    pub async fn delete_city(
        pool: &PgPool,
        cache: &DirectoryCache,
        id: Uuid,
    ) -> Result<(), DirectoryError> {
        BusinessRepository::remove_catalog_entry(pool, CatalogEntry::City, id).await?;
        cache.invalidate_prefix(CITIES_PREFIX).await;
        Ok(())
    }
}

fn check_translations(translations: Option<&Value>) -> Result<(), DirectoryError> {
    match translations {
        Some(value) => validate_translations(value).map_err(DirectoryError::ValidationError),
        None => Ok(()),
    }
}

/// A record may keep its own slug when renamed to something that slugifies the same
fn without(taken: &[String], own: &str) -> Vec<String> {
    taken.iter().filter(|s| s.as_str() != own).cloned().collect()
}

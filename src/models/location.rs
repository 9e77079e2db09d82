// src/models/location.rs
// DOCUMENTATION: Countries and cities of the directory
// PURPOSE: Database rows, localized responses and admin DTOs for locations

use chrono::{DateTime, Utc};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::not_blank;

use super::{BusinessResponse, Paginated};
use crate::services::localized_name;

/// Country record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Country {
    pub id: Uuid,
    pub name: String,

    /// ISO-3166 alpha-2, upper-case
    pub code: String,

    pub slug: String,
    pub translations: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(default)]
    pub business_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryResponse {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub slug: String,
    pub business_count: i64,
}

impl Country {
    pub fn to_response(&self, locale: &str) -> CountryResponse {
        CountryResponse {
            id: self.id,
            name: localized_name(&self.translations, &self.name, locale),
            code: self.code.clone(),
            slug: self.slug.clone(),
            business_count: self.business_count,
        }
    }
}

/// City record joined with its country
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct City {
    pub id: Uuid,
    pub country_id: Uuid,
    pub country_name: String,
    pub country_code: String,
    pub name: String,
    pub slug: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub translations: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(default)]
    pub business_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub country_name: String,
    pub country_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub business_count: i64,
}

impl City {
    pub fn to_response(&self, locale: &str) -> CityResponse {
        CityResponse {
            id: self.id,
            name: localized_name(&self.translations, &self.name, locale),
            slug: self.slug.clone(),
            country_name: self.country_name.clone(),
            country_code: self.country_code.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            business_count: self.business_count,
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// GET /cities/{slug}
#[derive(Debug, Serialize)]
pub struct CityDetailResponse {
    pub city: CityResponse,
    pub businesses: Paginated<BusinessResponse>,
    pub locale: String,
    pub direction: &'static str,
}

/// Query for GET /cities/{slug}
#[derive(Debug, Default, Deserialize)]
pub struct CityListingQuery {
    /// Category slug
    pub category: Option<String>,
    pub lang: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Query for GET /cities/{slug}/map
#[derive(Debug, Default, Deserialize)]
pub struct CityMapQuery {
    pub zoom: Option<u8>,
    pub min_lat: Option<f64>,
    pub min_lng: Option<f64>,
    pub max_lat: Option<f64>,
    pub max_lng: Option<f64>,
    /// Category slug
    pub category: Option<String>,
}

/// Clustered markers for the city map
#[derive(Debug, Serialize)]
pub struct CityMapResponse {
    pub city_id: Uuid,
    pub city_slug: String,
    pub zoom: u8,

    /// [lat, lng]
    pub center: [f64; 2],

    /// [min_lat, min_lng, max_lat, max_lng]
    pub bounds: Option<[f64; 4]>,

    pub marker_count: usize,
    pub markers: FeatureCollection,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCountryRequest {
    #[validate(length(min = 1, max = 120), custom = "not_blank")]
    pub name: String,

    #[validate(length(equal = 2))]
    pub code: String,

    pub translations: Option<Value>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCountryRequest {
    #[validate(length(min = 1, max = 120), custom = "not_blank")]
    pub name: Option<String>,

    pub translations: Option<Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCityRequest {
    pub country_id: Uuid,

    #[validate(length(min = 1, max = 120), custom = "not_blank")]
    pub name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    pub translations: Option<Value>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCityRequest {
    #[validate(length(min = 1, max = 120), custom = "not_blank")]
    pub name: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,

    pub translations: Option<Value>,
}

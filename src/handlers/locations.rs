// src/handlers/locations.rs
// DOCUMENTATION: HTTP handlers for countries, cities and the city map
// PURPOSE: Parse requests, call services, return responses

use crate::config::Config;
use crate::errors::DirectoryError;
use crate::handlers::request_locale;
use crate::models::{CityListingQuery, CityMapQuery, LocalizedQuery};
use crate::services::{text_direction, BusinessService, CatalogService, DirectoryCache};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// GET /countries
pub async fn list_countries(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    cache: web::Data<Arc<DirectoryCache>>,
    http: HttpRequest,
    query: web::Query<LocalizedQuery>,
) -> Result<impl Responder, DirectoryError> {
    let locale = request_locale(&http, query.lang.as_deref(), &config);
    let countries = CatalogService::list_countries(pool.get_ref(), &cache, &locale).await?;

    Ok(HttpResponse::Ok().json(json!({
        "data": countries,
        "locale": locale,
        "direction": text_direction(&locale)
    })))
}

/// GET /countries/{code}/cities
pub async fn list_cities(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    cache: web::Data<Arc<DirectoryCache>>,
    http: HttpRequest,
    path: web::Path<String>,
    query: web::Query<LocalizedQuery>,
) -> Result<impl Responder, DirectoryError> {
    let code = path.into_inner();
    if code.trim().len() != 2 {
        return Err(DirectoryError::InvalidInput(format!(
            "'{}' is not a two-letter country code",
            code
        )));
    }

    let locale = request_locale(&http, query.lang.as_deref(), &config);
    let cities = CatalogService::list_cities(pool.get_ref(), &cache, &code, &locale).await?;

    Ok(HttpResponse::Ok().json(json!({
        "data": cities,
        "locale": locale,
        "direction": text_direction(&locale)
    })))
}

/// GET /cities/{slug}
/// City with its approved businesses, optionally narrowed to one category
pub async fn get_city(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    path: web::Path<String>,
    query: web::Query<CityListingQuery>,
) -> Result<impl Responder, DirectoryError> {
    let locale = request_locale(&http, query.lang.as_deref(), &config);
    let detail =
        CatalogService::city_detail(pool.get_ref(), &path.into_inner(), &query, &locale).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// GET /cities/{slug}/map
/// Clustered GeoJSON markers for the city's businesses
pub async fn get_city_map(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
    query: web::Query<CityMapQuery>,
) -> Result<impl Responder, DirectoryError> {
    let map = BusinessService::city_map(pool.get_ref(), &path.into_inner(), &query).await?;
    Ok(HttpResponse::Ok().json(map))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/countries")
            .route("", web::get().to(list_countries))
            .route("/{code}/cities", web::get().to(list_cities)),
    )
    .service(
        web::scope("/cities")
            .route("/{slug}", web::get().to(get_city))
            .route("/{slug}/map", web::get().to(get_city_map)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::test_config;
    use crate::handlers::test_support::lazy_pool;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    #[actix_rt::test]
    async fn test_map_rejects_partial_viewport() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/cities/casablanca/map?zoom=12&min_lat=33.5")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/cities/casablanca/map?zoom=21")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_bad_country_code() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(test_config()))
                .app_data(web::Data::new(Arc::new(DirectoryCache::new(60))))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/countries/morocco/cities")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

// src/handlers/admin_catalog.rs
// DOCUMENTATION: Admin handlers for categories, countries and cities
// PURPOSE: Catalog CRUD; every mutation drops the cached public lists it affects
//
// Registered inside the /admin scope by handlers::admin::config, behind its token gate.

use crate::errors::DirectoryError;
use crate::models::{
    CreateCategoryRequest, CreateCityRequest, CreateCountryRequest, UpdateCategoryRequest,
    UpdateCityRequest, UpdateCountryRequest,
};
use crate::services::{CatalogService, DirectoryCache, GeocodingClient};
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

// ---- categories ----

/// GET /admin/categories
/// Includes inactive categories
pub async fn list_categories(
    pool: web::Data<PgPool>,
) -> Result<impl Responder, DirectoryError> {
    let categories = CatalogService::admin_categories(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(categories))
}

/// POST /admin/categories
pub async fn create_category(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    body: web::Json<CreateCategoryRequest>,
) -> Result<impl Responder, DirectoryError> {
    body.validate()?;
    let category = CatalogService::create_category(pool.get_ref(), &cache, &body).await?;
    Ok(HttpResponse::Created().json(category))
}

/// PUT /admin/categories/{id}
pub async fn update_category(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCategoryRequest>,
) -> Result<impl Responder, DirectoryError> {
    body.validate()?;
    let category =
        CatalogService::update_category(pool.get_ref(), &cache, path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(category))
}

/// DELETE /admin/categories/{id}
/// 409 while active businesses still use it
pub async fn delete_category(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, DirectoryError> {
    CatalogService::delete_category(pool.get_ref(), &cache, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---- countries ----

/// GET /admin/countries
pub async fn list_countries(
    pool: web::Data<PgPool>,
) -> Result<impl Responder, DirectoryError> {
    let countries = CatalogService::admin_countries(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(countries))
}

/// POST /admin/countries
pub async fn create_country(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    body: web::Json<CreateCountryRequest>,
) -> Result<impl Responder, DirectoryError> {
    body.validate()?;
    let country = CatalogService::create_country(pool.get_ref(), &cache, &body).await?;
    Ok(HttpResponse::Created().json(country))
}

/// PUT /admin/countries/{id}
pub async fn update_country(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCountryRequest>,
) -> Result<impl Responder, DirectoryError> {
    body.validate()?;
    let country =
        CatalogService::update_country(pool.get_ref(), &cache, path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(country))
}

/// DELETE /admin/countries/{id}
pub async fn delete_country(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, DirectoryError> {
    CatalogService::delete_country(pool.get_ref(), &cache, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---- cities ----

/// GET /admin/cities
pub async fn list_cities(
    pool: web::Data<PgPool>,
) -> Result<impl Responder, DirectoryError> {
    let cities = CatalogService::admin_cities(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(cities))
}

/// POST /admin/cities
/// DOCUMENTATION: Coordinates are geocoded from "{city}, {country}" when omitted
pub async fn create_city(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    geocoder: web::Data<GeocodingClient>,
    body: web::Json<CreateCityRequest>,
) -> Result<impl Responder, DirectoryError> {
    body.validate()?;
    let city = CatalogService::create_city(pool.get_ref(), &cache, &geocoder, &body).await?;
    Ok(HttpResponse::Created().json(city))
}

/// PUT /admin/cities/{id}
pub async fn update_city(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCityRequest>,
) -> Result<impl Responder, DirectoryError> {
    body.validate()?;
    let city = CatalogService::update_city(pool.get_ref(), &cache, path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(city))
}

/// DELETE /admin/cities/{id}
/// 409 while active businesses are listed in it
pub async fn delete_city(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, DirectoryError> {
    CatalogService::delete_city(pool.get_ref(), &cache, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Catalog routes, relative to the /admin scope
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/categories", web::get().to(list_categories))
        .route("/categories", web::post().to(create_category))
        .route("/categories/{id}", web::put().to(update_category))
        .route("/categories/{id}", web::delete().to(delete_category))
        .route("/countries", web::get().to(list_countries))
        .route("/countries", web::post().to(create_country))
        .route("/countries/{id}", web::put().to(update_country))
        .route("/countries/{id}", web::delete().to(delete_country))
        .route("/cities", web::get().to(list_cities))
        .route("/cities", web::post().to(create_city))
        .route("/cities/{id}", web::put().to(update_city))
        .route("/cities/{id}", web::delete().to(delete_city));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::test_config;
    use crate::handlers::test_support::lazy_pool;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_rt::test]
    async fn test_catalog_payloads_are_validated() {
        let config = test_config();
        let geocoder = GeocodingClient::new(&config).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(config))
                .app_data(web::Data::new(Arc::new(DirectoryCache::new(60))))
                .app_data(web::Data::new(geocoder))
                .configure(crate::handlers::admin::config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/admin/countries")
            .insert_header(("X-Admin-Token", "secret-token"))
            .set_json(json!({"name": "Morocco", "code": "MAR"}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::post()
            .uri("/admin/categories")
            .insert_header(("X-Admin-Token", "secret-token"))
            .set_json(json!({"name": "Plumbers", "translations": ["fr", "Plombiers"]}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::post()
            .uri("/admin/cities")
            .insert_header(("X-Admin-Token", "secret-token"))
            .set_json(json!({
                "country_id": Uuid::new_v4(),
                "name": "Rabat",
                "latitude": 34.02
            }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }
}

// src/handlers/categories.rs
// DOCUMENTATION: HTTP handlers for public category pages

use crate::config::Config;
use crate::errors::DirectoryError;
use crate::handlers::request_locale;
use crate::models::{LocalizedQuery, PageParams};
use crate::services::{text_direction, CatalogService, DirectoryCache};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// GET /categories
/// Active categories with localized names and business counts
pub async fn list_categories(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    cache: web::Data<Arc<DirectoryCache>>,
    http: HttpRequest,
    query: web::Query<LocalizedQuery>,
) -> Result<impl Responder, DirectoryError> {
    let locale = request_locale(&http, query.lang.as_deref(), &config);
    let categories = CatalogService::list_categories(pool.get_ref(), &cache, &locale).await?;

    Ok(HttpResponse::Ok().json(json!({
        "data": categories,
        "locale": locale,
        "direction": text_direction(&locale)
    })))
}

/// GET /categories/{slug}
/// Category with its approved businesses, sponsored first
pub async fn get_category(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    http: HttpRequest,
    path: web::Path<String>,
    query: web::Query<LocalizedQuery>,
) -> Result<impl Responder, DirectoryError> {
    let locale = request_locale(&http, query.lang.as_deref(), &config);
    let page = PageParams::new(query.page, query.limit);

    let detail =
        CatalogService::category_detail(pool.get_ref(), &path.into_inner(), &locale, page).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .route("", web::get().to(list_categories))
            .route("/{slug}", web::get().to(get_category)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::test_config;
    use crate::handlers::test_support::lazy_pool;
    use crate::models::CategoryResponse;
    use actix_web::{test, App};
    use uuid::Uuid;

    #[actix_rt::test]
    async fn test_cached_categories_are_served_in_requested_locale() {
        let cache = Arc::new(DirectoryCache::new(60));
        let cached = vec![CategoryResponse {
            id: Uuid::new_v4(),
            name: "مطاعم".to_string(),
            slug: "restaurants".to_string(),
            description: None,
            icon: None,
            business_count: 12,
        }];
        cache
            .set(
                DirectoryCache::categories_key("ar"),
                serde_json::to_string(&cached).unwrap(),
            )
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(test_config()))
                .app_data(web::Data::new(cache))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/categories")
            .insert_header(("Accept-Language", "ar-MA,ar;q=0.9,fr;q=0.5"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["locale"], "ar");
        assert_eq!(body["direction"], "rtl");
        assert_eq!(body["data"][0]["slug"], "restaurants");
        assert_eq!(body["data"][0]["business_count"], 12);
    }
}

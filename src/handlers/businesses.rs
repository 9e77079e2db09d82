// src/handlers/businesses.rs
// DOCUMENTATION: HTTP handlers for public business listings
// PURPOSE: Parse requests, call services, return responses

use crate::errors::DirectoryError;
use crate::handlers::{client_address, submissions};
use crate::models::{BusinessSearchQuery, CreateBusinessRequest};
use crate::services::{BusinessService, SubmissionKind, SubmissionLimiter};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

/// GET /businesses/search
/// Approved businesses matching text and filters, sponsored first
pub async fn search_businesses(
    pool: web::Data<PgPool>,
    query: web::Query<BusinessSearchQuery>,
) -> Result<impl Responder, DirectoryError> {
    let result = BusinessService::search(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /businesses/{id_or_slug}
pub async fn get_business(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
) -> Result<impl Responder, DirectoryError> {
    let identifier = path.into_inner();
    let business = BusinessService::get_detail(pool.get_ref(), &identifier).await?;
    Ok(HttpResponse::Ok().json(business))
}

/// POST /businesses
/// Public listing submission; stored pending until an admin approves it
pub async fn submit_business(
    pool: web::Data<PgPool>,
    limiter: web::Data<Arc<SubmissionLimiter>>,
    http: HttpRequest,
    req: web::Json<CreateBusinessRequest>,
) -> Result<impl Responder, DirectoryError> {
    req.validate()?;
    limiter.check(SubmissionKind::Business, &client_address(&http))?;

    let business = BusinessService::submit(pool.get_ref(), &req).await?;
    Ok(HttpResponse::Created().json(business))
}

/// Configuration for business routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/businesses")
            .route("", web::post().to(submit_business))
            .route("/search", web::get().to(search_businesses))
            .route("/{id}/reviews", web::get().to(submissions::list_reviews))
            .route("/{id}/reviews", web::post().to(submissions::create_review))
            .route("/{id}/claims", web::post().to(submissions::create_claim))
            .route("/{id_or_slug}", web::get().to(get_business)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::lazy_pool;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_rt::test]
    async fn test_invalid_submission_is_rejected_before_storage() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(Arc::new(SubmissionLimiter::new(5))))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/businesses")
            .set_json(json!({
                "name": "",
                "category_id": uuid::Uuid::new_v4(),
                "city_id": uuid::Uuid::new_v4(),
                "website": "not a url"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[actix_rt::test]
    async fn test_submission_rate_limit() {
        let limiter = Arc::new(SubmissionLimiter::new(1));
        limiter
            .check(SubmissionKind::Business, "198.51.100.7")
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(limiter))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/businesses")
            .insert_header(("X-Forwarded-For", "198.51.100.7"))
            .set_json(json!({
                "name": "Pharmacie Centrale",
                "category_id": uuid::Uuid::new_v4(),
                "city_id": uuid::Uuid::new_v4()
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

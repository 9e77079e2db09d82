// src/handlers/submissions.rs
// DOCUMENTATION: HTTP handlers for public forms: reviews, listing claims, contact
// PURPOSE: Validate, rate limit per client, then hand over to the submission service

use crate::errors::DirectoryError;
use crate::handlers::client_address;
use crate::models::{
    CreateClaimRequest, CreateContactMessageRequest, CreateReviewRequest, PageParams, PageQuery,
};
use crate::services::{SubmissionKind, SubmissionLimiter, SubmissionService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// POST /businesses/{id}/reviews
pub async fn create_review(
    pool: web::Data<PgPool>,
    limiter: web::Data<Arc<SubmissionLimiter>>,
    http: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<CreateReviewRequest>,
) -> Result<impl Responder, DirectoryError> {
    req.validate()?;
    limiter.check(SubmissionKind::Review, &client_address(&http))?;

    let review = SubmissionService::submit_review(pool.get_ref(), path.into_inner(), &req).await?;
    Ok(HttpResponse::Created().json(json!({
        "review": review,
        "status": "pending",
        "message": "Review received and awaiting moderation"
    })))
}

/// GET /businesses/{id}/reviews
pub async fn list_reviews(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, DirectoryError> {
    let page = PageParams::new(query.page, query.limit);
    let reviews = SubmissionService::list_reviews(pool.get_ref(), path.into_inner(), page).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// POST /businesses/{id}/claims
pub async fn create_claim(
    pool: web::Data<PgPool>,
    limiter: web::Data<Arc<SubmissionLimiter>>,
    http: HttpRequest,
    path: web::Path<Uuid>,
    req: web::Json<CreateClaimRequest>,
) -> Result<impl Responder, DirectoryError> {
    req.validate()?;
    limiter.check(SubmissionKind::Claim, &client_address(&http))?;

    let receipt = SubmissionService::submit_claim(pool.get_ref(), path.into_inner(), &req).await?;
    Ok(HttpResponse::Created().json(receipt))
}

/// POST /contact
pub async fn create_contact_message(
    pool: web::Data<PgPool>,
    limiter: web::Data<Arc<SubmissionLimiter>>,
    http: HttpRequest,
    req: web::Json<CreateContactMessageRequest>,
) -> Result<impl Responder, DirectoryError> {
    req.validate()?;
    limiter.check(SubmissionKind::Contact, &client_address(&http))?;

    let message = SubmissionService::submit_contact(pool.get_ref(), &req).await?;
    Ok(HttpResponse::Created().json(json!({
        "id": message.id,
        "created_at": message.created_at
    })))
}

/// Review and claim routes live under the /businesses scope
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/contact", web::post().to(create_contact_message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::lazy_pool;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    macro_rules! submission_app {
        ($limiter:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .app_data(web::Data::new($limiter))
                    .configure(config)
                    .configure(crate::handlers::businesses::config),
            )
            .await
        };
    }

    #[actix_rt::test]
    async fn test_review_rating_out_of_range() {
        let app = submission_app!(Arc::new(SubmissionLimiter::new(5)));

        let req = test::TestRequest::post()
            .uri(&format!("/businesses/{}/reviews", Uuid::new_v4()))
            .set_json(json!({"author_name": "Salma", "rating": 6}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_claim_requires_valid_email() {
        let app = submission_app!(Arc::new(SubmissionLimiter::new(5)));

        let req = test::TestRequest::post()
            .uri(&format!("/businesses/{}/claims", Uuid::new_v4()))
            .set_json(json!({"claimant_name": "Omar", "claimant_email": "omar-at-example"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[actix_rt::test]
    async fn test_contact_form_is_rate_limited_per_client() {
        let limiter = Arc::new(SubmissionLimiter::new(1));
        limiter.check(SubmissionKind::Contact, "192.0.2.44").unwrap();
        let app = submission_app!(limiter);

        let req = test::TestRequest::post()
            .uri("/contact")
            .insert_header(("X-Forwarded-For", "192.0.2.44"))
            .set_json(json!({
                "name": "Nadia",
                "email": "nadia@example.com",
                "message": "Please update my opening hours"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}

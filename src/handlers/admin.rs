// src/handlers/admin.rs
// DOCUMENTATION: Admin dashboard handlers
// PURPOSE: Moderation queues, business management, sponsorship, admin registry and cache control
//
// The whole /admin scope sits behind the X-Admin-Token gate, checked before any extractor runs.

use crate::config::Config;
use crate::errors::DirectoryError;
use crate::handlers::admin_catalog;
use crate::models::{
    AdminBusinessQuery, AdminCheckQuery, AdminCreateBusinessRequest, BusinessStatusRequest,
    ClaimDecisionRequest, CreateAdminUserRequest, MessageQuery, QueueQuery, ReviewStatusRequest,
    SponsorshipRequest, UpdateBusinessRequest,
};
use crate::services::{DirectoryCache, ModerationService};
use actix_web::dev::{Service, ServiceRequest};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Helper function to verify admin authentication
/// DOCUMENTATION: Checks X-Admin-Token header against configured admin token
pub(crate) fn verify_admin_token(req: &HttpRequest, config: &Config) -> Result<(), DirectoryError> {
    let token = req
        .headers()
        .get("X-Admin-Token")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            log::warn!("Admin request without token");
            DirectoryError::Unauthorized
        })?;

    if token != config.admin_token {
        log::warn!("Admin request with invalid token");
        return Err(DirectoryError::Forbidden);
    }

    Ok(())
}

/// Token check for every request entering the /admin scope
fn admin_gate(req: &ServiceRequest) -> Result<(), DirectoryError> {
    let config = req.app_data::<web::Data<Config>>().ok_or_else(|| {
        log::error!("Admin gate has no configuration registered");
        DirectoryError::InternalError
    })?;
    verify_admin_token(req.request(), config)
}

/// GET /admin/stats
pub async fn dashboard_stats(
    pool: web::Data<PgPool>,
) -> Result<impl Responder, DirectoryError> {
    let stats = ModerationService::stats(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

// ---- businesses ----

/// GET /admin/businesses
/// DOCUMENTATION: Multi-field search over every active business
pub async fn list_businesses(
    pool: web::Data<PgPool>,
    query: web::Query<AdminBusinessQuery>,
) -> Result<impl Responder, DirectoryError> {
    let result = ModerationService::list_businesses(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /admin/businesses/{id}
pub async fn get_business(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, DirectoryError> {
    let business = ModerationService::get_business(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(business))
}

/// POST /admin/businesses
pub async fn create_business(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    body: web::Json<AdminCreateBusinessRequest>,
) -> Result<impl Responder, DirectoryError> {
    body.validate()?;

    let business = ModerationService::create_business(pool.get_ref(), &cache, &body).await?;
    Ok(HttpResponse::Created().json(business))
}

/// PUT /admin/businesses/{id}
pub async fn update_business(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateBusinessRequest>,
) -> Result<impl Responder, DirectoryError> {
    body.validate()?;

    let business =
        ModerationService::update_business(pool.get_ref(), &cache, path.into_inner(), &body)
            .await?;
    Ok(HttpResponse::Ok().json(business))
}

/// DELETE /admin/businesses/{id}
/// Soft delete
pub async fn delete_business(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, DirectoryError> {
    ModerationService::delete_business(pool.get_ref(), &cache, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /admin/businesses/{id}/status
pub async fn set_business_status(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<DirectoryCache>>,
    path: web::Path<Uuid>,
    body: web::Json<BusinessStatusRequest>,
) -> Result<impl Responder, DirectoryError> {
    let business = ModerationService::set_business_status(
        pool.get_ref(),
        &cache,
        path.into_inner(),
        &body.status,
    )
    .await?;
    Ok(HttpResponse::Ok().json(business))
}

/// POST /admin/businesses/{id}/sponsored
pub async fn set_sponsorship(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    body: web::Json<SponsorshipRequest>,
) -> Result<impl Responder, DirectoryError> {
    let business =
        ModerationService::set_sponsorship(pool.get_ref(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(business))
}

// ---- reviews ----

/// GET /admin/reviews
pub async fn list_reviews(
    pool: web::Data<PgPool>,
    query: web::Query<QueueQuery>,
) -> Result<impl Responder, DirectoryError> {
    let reviews = ModerationService::list_reviews(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// POST /admin/reviews/{id}/status
pub async fn set_review_status(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    body: web::Json<ReviewStatusRequest>,
) -> Result<impl Responder, DirectoryError> {
    let review =
        ModerationService::set_review_status(pool.get_ref(), path.into_inner(), &body.status)
            .await?;
    Ok(HttpResponse::Ok().json(review))
}

/// DELETE /admin/reviews/{id}
pub async fn delete_review(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, DirectoryError> {
    ModerationService::delete_review(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---- claims ----

/// GET /admin/claims
pub async fn list_claims(
    pool: web::Data<PgPool>,
    query: web::Query<QueueQuery>,
) -> Result<impl Responder, DirectoryError> {
    let claims = ModerationService::list_claims(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(claims))
}

/// POST /admin/claims/{id}/approve
/// DOCUMENTATION: Makes the claimant the verified owner; competing claims are rejected
pub async fn approve_claim(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    body: Option<web::Json<ClaimDecisionRequest>>,
) -> Result<impl Responder, DirectoryError> {
    let decision = body.map(|b| b.into_inner()).unwrap_or_default();
    decision.validate()?;

    let claim = ModerationService::approve_claim(
        pool.get_ref(),
        path.into_inner(),
        decision.admin_notes.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(claim))
}

/// POST /admin/claims/{id}/reject
pub async fn reject_claim(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    body: Option<web::Json<ClaimDecisionRequest>>,
) -> Result<impl Responder, DirectoryError> {
    let decision = body.map(|b| b.into_inner()).unwrap_or_default();
    decision.validate()?;

    let claim = ModerationService::reject_claim(
        pool.get_ref(),
        path.into_inner(),
        decision.admin_notes.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(claim))
}

// ---- messages ----

/// GET /admin/messages
pub async fn list_messages(
    pool: web::Data<PgPool>,
    query: web::Query<MessageQuery>,
) -> Result<impl Responder, DirectoryError> {
    let messages = ModerationService::list_messages(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// POST /admin/messages/{id}/read
pub async fn mark_message_read(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, DirectoryError> {
    let message = ModerationService::mark_message_read(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message))
}

/// DELETE /admin/messages/{id}
pub async fn delete_message(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, DirectoryError> {
    ModerationService::delete_message(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---- admin users ----

/// GET /admin/users
pub async fn list_admin_users(
    pool: web::Data<PgPool>,
) -> Result<impl Responder, DirectoryError> {
    let users = ModerationService::list_admins(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// POST /admin/users
pub async fn create_admin_user(
    pool: web::Data<PgPool>,
    body: web::Json<CreateAdminUserRequest>,
) -> Result<impl Responder, DirectoryError> {
    body.validate()?;
    let user = ModerationService::add_admin(pool.get_ref(), &body).await?;
    Ok(HttpResponse::Created().json(user))
}

/// DELETE /admin/users/{id}
pub async fn delete_admin_user(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, DirectoryError> {
    ModerationService::remove_admin(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /admin/users/check?email=
pub async fn check_admin_user(
    pool: web::Data<PgPool>,
    query: web::Query<AdminCheckQuery>,
) -> Result<impl Responder, DirectoryError> {
    let result = ModerationService::check_admin(pool.get_ref(), &query.email).await?;
    Ok(HttpResponse::Ok().json(result))
}

// ---- cache ----

/// GET /admin/cache/stats
pub async fn cache_stats(
    cache: web::Data<Arc<DirectoryCache>>,
) -> Result<impl Responder, DirectoryError> {
    Ok(HttpResponse::Ok().json(cache.stats().await))
}

/// POST /admin/cache/clear
pub async fn clear_cache(
    cache: web::Data<Arc<DirectoryCache>>,
) -> Result<impl Responder, DirectoryError> {
    cache.clear().await;
    Ok(HttpResponse::Ok().json(json!({"cleared": true})))
}

/// Configuration for admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap_fn(|req, srv| {
                let call = admin_gate(&req).map(|()| srv.call(req));
                async move {
                    match call {
                        Ok(fut) => fut.await,
                        Err(e) => Err(e.into()),
                    }
                }
            })
            .route("/stats", web::get().to(dashboard_stats))
            .route("/businesses", web::get().to(list_businesses))
            .route("/businesses", web::post().to(create_business))
            .route("/businesses/{id}", web::get().to(get_business))
            .route("/businesses/{id}", web::put().to(update_business))
            .route("/businesses/{id}", web::delete().to(delete_business))
            .route("/businesses/{id}/status", web::post().to(set_business_status))
            .route("/businesses/{id}/sponsored", web::post().to(set_sponsorship))
            .route("/reviews", web::get().to(list_reviews))
            .route("/reviews/{id}/status", web::post().to(set_review_status))
            .route("/reviews/{id}", web::delete().to(delete_review))
            .route("/claims", web::get().to(list_claims))
            .route("/claims/{id}/approve", web::post().to(approve_claim))
            .route("/claims/{id}/reject", web::post().to(reject_claim))
            .route("/messages", web::get().to(list_messages))
            .route("/messages/{id}/read", web::post().to(mark_message_read))
            .route("/messages/{id}", web::delete().to(delete_message))
            .route("/users", web::get().to(list_admin_users))
            .route("/users", web::post().to(create_admin_user))
            .route("/users/check", web::get().to(check_admin_user))
            .route("/users/{id}", web::delete().to(delete_admin_user))
            .route("/cache/stats", web::get().to(cache_stats))
            .route("/cache/clear", web::post().to(clear_cache))
            .configure(admin_catalog::config),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::test_config;
    use crate::handlers::test_support::lazy_pool;
    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use actix_web::App;

    #[test]
    fn test_verify_admin_token() {
        let config = test_config();

        let missing = TestRequest::default().to_http_request();
        assert!(matches!(
            verify_admin_token(&missing, &config),
            Err(DirectoryError::Unauthorized)
        ));

        let wrong = TestRequest::default()
            .insert_header(("X-Admin-Token", "guess"))
            .to_http_request();
        assert!(matches!(
            verify_admin_token(&wrong, &config),
            Err(DirectoryError::Forbidden)
        ));

        let good = TestRequest::default()
            .insert_header(("X-Admin-Token", "secret-token"))
            .to_http_request();
        assert!(verify_admin_token(&good, &config).is_ok());
    }

    #[actix_rt::test]
    async fn test_admin_routes_require_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(test_config()))
                .app_data(web::Data::new(Arc::new(DirectoryCache::new(60))))
                .configure(config),
        )
        .await;

        let req = TestRequest::get().uri("/admin/stats").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let req = TestRequest::delete()
            .uri(&format!("/admin/categories/{}", Uuid::new_v4()))
            .insert_header(("X-Admin-Token", "wrong"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[actix_rt::test]
    async fn test_token_is_checked_before_extractors() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(test_config()))
                .app_data(web::Data::new(Arc::new(DirectoryCache::new(60))))
                .configure(config),
        )
        .await;

        let req = TestRequest::post()
            .uri("/admin/businesses")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = TestRequest::get()
            .uri("/admin/businesses/not-a-uuid")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = TestRequest::get()
            .uri("/admin/businesses/not-a-uuid")
            .insert_header(("X-Admin-Token", "wrong"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        // with a valid token the extractor decides
        let req = TestRequest::get()
            .uri("/admin/businesses/not-a-uuid")
            .insert_header(("X-Admin-Token", "secret-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_cache_endpoints() {
        let cache = Arc::new(DirectoryCache::new(60));
        cache
            .set(DirectoryCache::countries_key("fr"), "[]".to_string())
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(test_config()))
                .app_data(web::Data::new(cache.clone()))
                .configure(config),
        )
        .await;

        let req = TestRequest::get()
            .uri("/admin/cache/stats")
            .insert_header(("X-Admin-Token", "secret-token"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["active_entries"], 1);

        let req = TestRequest::post()
            .uri("/admin/cache/clear")
            .insert_header(("X-Admin-Token", "secret-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(cache.stats().await.total_entries, 0);
    }

    #[actix_rt::test]
    async fn test_sponsorship_in_the_past_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(test_config()))
                .configure(config),
        )
        .await;

        let req = TestRequest::post()
            .uri(&format!("/admin/businesses/{}/sponsored", Uuid::new_v4()))
            .insert_header(("X-Admin-Token", "secret-token"))
            .set_json(json!({
                "is_sponsored": true,
                "sponsored_until": "2020-01-01T00:00:00Z"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

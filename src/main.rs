// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, shared services and start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::{
    start_cleanup_task, start_limiter_cleanup_task, DirectoryCache, GeocodingClient,
    SubmissionLimiter,
};
use std::io;
use std::sync::Arc;

/// Interval of the cache and rate limiter housekeeping tasks
const CLEANUP_INTERVAL_SECONDS: u64 = 300;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting pages-directory service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );
    log::info!(
        "Locales: {} (default {})",
        config.supported_locales.join(","),
        config.default_locale
    );

    // 4. Initialize database connection pool and schema
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config::run_migrations(&pool).await {
        log::error!("Failed to apply migrations: {}", e);
        std::process::exit(1);
    }

    // 5. Shared services
    let cache = Arc::new(DirectoryCache::new(config.cache_ttl_seconds));
    start_cleanup_task(cache.clone(), CLEANUP_INTERVAL_SECONDS);
    log::info!(
        "Initialized directory cache (TTL: {}s)",
        config.cache_ttl_seconds
    );

    let limiter = Arc::new(SubmissionLimiter::new(
        config.submission_rate_limit_per_minute,
    ));
    start_limiter_cleanup_task(limiter.clone(), CLEANUP_INTERVAL_SECONDS);

    let geocoder = match GeocodingClient::new(&config) {
        Ok(client) => web::Data::new(client),
        Err(e) => {
            log::error!("Failed to build geocoding client: {}", e);
            std::process::exit(1);
        }
    };

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(limiter.clone()))
            .app_data(geocoder.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::categories_config)
            .configure(handlers::locations_config)
            .configure(handlers::businesses_config)
            .configure(handlers::submissions_config)
            .configure(handlers::admin_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}

// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod business_filter;
pub mod business_service;
pub mod cache;
pub mod catalog_service;
pub mod geocoding_client;
pub mod locale;
pub mod map_cluster;
pub mod moderation_service;
pub mod rate_limiter;
pub mod slug;
pub mod submission_service;

pub use business_filter::{BusinessFilter, BusinessSort};
pub use business_service::BusinessService;
pub use cache::*;
pub use catalog_service::CatalogService;
pub use geocoding_client::*;
pub use locale::*;
pub use moderation_service::ModerationService;
pub use rate_limiter::*;
pub use slug::*;
pub use submission_service::SubmissionService;

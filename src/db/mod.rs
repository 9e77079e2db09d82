// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod admin_user_repository;
pub mod business_repository;
pub mod category_repository;
pub mod claim_repository;
pub mod contact_repository;
pub mod location_repository;
pub mod review_repository;
pub mod stats_repository;

pub use admin_user_repository::*;
pub use business_repository::*;
pub use category_repository::*;
pub use claim_repository::*;
pub use contact_repository::*;
pub use location_repository::*;
pub use review_repository::*;
pub use stats_repository::*;

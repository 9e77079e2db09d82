// src/models/admin_user.rs
// DOCUMENTATION: Registry of people allowed into the admin dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::errors::DirectoryError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    /// Stored lower-case
    pub email: String,
    pub display_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    Admin,
    Moderator,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::Moderator => "moderator",
        }
    }
}

impl FromStr for AdminRole {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(AdminRole::Admin),
            "moderator" => Ok(AdminRole::Moderator),
            other => Err(DirectoryError::InvalidInput(format!("unknown role '{}'", other))),
        }
    }
}

/// The registry must keep at least one `admin`
/// `admin_count` includes the user being removed
pub fn check_admin_removal(role: &str, admin_count: usize) -> Result<(), DirectoryError> {
    if role == AdminRole::Admin.as_str() && admin_count <= 1 {
        return Err(DirectoryError::AlreadyExists(
            "cannot remove the last admin".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminUserRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(max = 120))]
    pub display_name: Option<String>,

    /// Defaults to moderator
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminCheckQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AdminCheckResponse {
    pub email: String,
    pub is_admin: bool,
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("ADMIN".parse::<AdminRole>().unwrap(), AdminRole::Admin);
        assert_eq!(" moderator".parse::<AdminRole>().unwrap(), AdminRole::Moderator);
        assert!("owner".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_last_admin_is_kept() {
        assert!(check_admin_removal("admin", 2).is_ok());
        assert!(matches!(
            check_admin_removal("admin", 1),
            Err(DirectoryError::AlreadyExists(_))
        ));
        assert!(check_admin_removal("moderator", 1).is_ok());
        assert!(check_admin_removal("moderator", 0).is_ok());
    }
}

// src/models/moderation.rs
// DOCUMENTATION: Moderation status shared by businesses, reviews and claims

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DirectoryError;

/// Moderation state of a listing, review or claim
/// Stored as lower-case TEXT in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
    /// Only valid for businesses
    Suspended,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
            ModerationStatus::Suspended => "suspended",
        }
    }

    /// Parse a status for a review or claim, where suspension does not exist
    pub fn parse_for_queue(raw: &str) -> Result<Self, DirectoryError> {
        match raw.parse()? {
            ModerationStatus::Suspended => Err(DirectoryError::InvalidInput(
                "status 'suspended' only applies to businesses".to_string(),
            )),
            status => Ok(status),
        }
    }
}

impl FromStr for ModerationStatus {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ModerationStatus::Pending),
            "approved" => Ok(ModerationStatus::Approved),
            "rejected" => Ok(ModerationStatus::Rejected),
            "suspended" => Ok(ModerationStatus::Suspended),
            other => Err(DirectoryError::InvalidInput(format!(
                "unknown status '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(" Approved ".parse::<ModerationStatus>().unwrap(), ModerationStatus::Approved);
        assert!("archived".parse::<ModerationStatus>().is_err());
    }

    #[test]
    fn test_queue_status_excludes_suspended() {
        assert!(ModerationStatus::parse_for_queue("suspended").is_err());
        assert_eq!(
            ModerationStatus::parse_for_queue("rejected").unwrap(),
            ModerationStatus::Rejected
        );
    }
}

// src/services/business_filter.rs
// DOCUMENTATION: Multi-field search and filtering for the admin business table
// PURPOSE: One synchronous pass over already-fetched businesses per request

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::DirectoryError;
use crate::models::{AdminBusinessQuery, BusinessView, ModerationStatus};

/// Minimum digits in a token before it is also matched against phone numbers
const PHONE_TOKEN_MIN_DIGITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusinessSort {
    #[default]
    Newest,
    Oldest,
    Name,
    Rating,
}

impl FromStr for BusinessSort {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "newest" => Ok(BusinessSort::Newest),
            "oldest" => Ok(BusinessSort::Oldest),
            "name" => Ok(BusinessSort::Name),
            "rating" => Ok(BusinessSort::Rating),
            other => Err(DirectoryError::InvalidInput(format!(
                "unknown sort '{}'",
                other
            ))),
        }
    }
}

/// Parsed admin filter
#[derive(Debug, Clone, Default)]
pub struct BusinessFilter {
    /// Lower-cased search words; all must match
    pub tokens: Vec<String>,
    pub status: Option<ModerationStatus>,
    pub category_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
    /// Effective sponsorship
    pub sponsored: Option<bool>,
    pub sort: BusinessSort,
}

impl BusinessFilter {
    pub fn from_query(query: &AdminBusinessQuery) -> Result<Self, DirectoryError> {
        Ok(BusinessFilter {
            tokens: tokenize(query.q.as_deref().unwrap_or("")),
            status: query.status.as_deref().map(str::parse).transpose()?,
            category_id: query.category_id,
            city_id: query.city_id,
            sponsored: query.sponsored,
            sort: query
                .sort
                .as_deref()
                .map(str::parse)
                .transpose()?
                .unwrap_or_default(),
        })
    }

    pub fn matches(&self, business: &BusinessView, now: DateTime<Utc>) -> bool {
        if let Some(status) = self.status {
            if business.status != status.as_str() {
                return false;
            }
        }
        if self.category_id.is_some_and(|id| id != business.category_id) {
            return false;
        }
        if self.city_id.is_some_and(|id| id != business.city_id) {
            return false;
        }
        if let Some(sponsored) = self.sponsored {
            if business.is_effectively_sponsored(now) != sponsored {
                return false;
            }
        }

        let haystack = searchable_text(business);
        let phone_digits = business.phone.as_deref().map(digits_only).unwrap_or_default();

        self.tokens.iter().all(|token| {
            if haystack.contains(token.as_str()) {
                return true;
            }
            let token_digits = digits_only(token);
            token_digits.len() >= PHONE_TOKEN_MIN_DIGITS
                && !phone_digits.is_empty()
                && phone_digits.contains(&token_digits)
        })
    }

    /// Filter and sort in one pass
    pub fn apply(&self, businesses: Vec<BusinessView>, now: DateTime<Utc>) -> Vec<BusinessView> {
        let mut matched: Vec<BusinessView> = businesses
            .into_iter()
            .filter(|b| self.matches(b, now))
            .collect();

        match self.sort {
            BusinessSort::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            BusinessSort::Oldest => matched.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            BusinessSort::Name => {
                matched.sort_by_cached_key(|b| b.name.to_lowercase());
            }
            BusinessSort::Rating => matched.sort_by(|a, b| {
                compare_rating(b.average_rating, a.average_rating)
                    .then(b.review_count.cmp(&a.review_count))
            }),
        }

        matched
    }
}

/// Trim, lower-case and split on whitespace
pub fn tokenize(q: &str) -> Vec<String> {
    q.split_whitespace().map(|t| t.to_lowercase()).collect()
}

fn searchable_text(business: &BusinessView) -> String {
    let fields = [
        Some(business.name.as_str()),
        Some(business.slug.as_str()),
        business.email.as_deref(),
        business.address.as_deref(),
        business.website.as_deref(),
        Some(business.category_name.as_str()),
        Some(business.city_name.as_str()),
        Some(business.country_name.as_str()),
    ];

    fields
        .iter()
        .flatten()
        .map(|f| f.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n")
}

fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Unrated sorts below every rating
fn compare_rating(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::business::sample_business;
    use chrono::Duration;

    fn fixtures() -> Vec<BusinessView> {
        let now = Utc::now();

        let mut atlas = sample_business("Atlas Plumbing");
        atlas.phone = Some("+212 (522) 45-67-89".to_string());
        atlas.email = Some("contact@atlas.ma".to_string());
        atlas.category_name = "Plumbers".to_string();
        atlas.created_at = now - Duration::days(3);
        atlas.average_rating = Some(4.0);
        atlas.review_count = 3;

        let mut marina = sample_business("Marina Cafe");
        marina.city_name = "Rabat".to_string();
        marina.status = "pending".to_string();
        marina.is_sponsored = true;
        marina.created_at = now - Duration::days(1);
        marina.average_rating = Some(4.0);
        marina.review_count = 10;

        let mut old_sponsor = sample_business("blue door bakery");
        old_sponsor.is_sponsored = true;
        old_sponsor.sponsored_until = Some(now - Duration::days(2));
        old_sponsor.created_at = now - Duration::days(9);

        vec![atlas, marina, old_sponsor]
    }

    fn names(list: &[BusinessView]) -> Vec<&str> {
        list.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything_newest_first() {
        let result = BusinessFilter::default().apply(fixtures(), Utc::now());
        assert_eq!(names(&result), vec!["Marina Cafe", "Atlas Plumbing", "blue door bakery"]);
    }

    #[test]
    fn test_all_tokens_must_match_across_fields() {
        let filter = BusinessFilter {
            tokens: tokenize("  PLUMB  casablanca "),
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(fixtures(), Utc::now())), vec!["Atlas Plumbing"]);

        let filter = BusinessFilter {
            tokens: tokenize("plumb rabat"),
            ..Default::default()
        };
        assert!(filter.apply(fixtures(), Utc::now()).is_empty());
    }

    #[test]
    fn test_phone_matches_on_digits() {
        let filter = BusinessFilter {
            tokens: tokenize("522-456"),
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(fixtures(), Utc::now())), vec!["Atlas Plumbing"]);

        // Too short to be treated as a phone fragment
        let filter = BusinessFilter {
            tokens: tokenize("45"),
            ..Default::default()
        };
        assert!(filter.apply(fixtures(), Utc::now()).is_empty());
    }

    #[test]
    fn test_status_and_effective_sponsorship() {
        let filter = BusinessFilter {
            sponsored: Some(true),
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(fixtures(), Utc::now())), vec!["Marina Cafe"]);

        let filter = BusinessFilter {
            status: Some(ModerationStatus::Approved),
            sponsored: Some(false),
            ..Default::default()
        };
        assert_eq!(
            names(&filter.apply(fixtures(), Utc::now())),
            vec!["Atlas Plumbing", "blue door bakery"]
        );
    }

    #[test]
    fn test_category_filter() {
        let list = fixtures();
        let filter = BusinessFilter {
            category_id: Some(list[1].category_id),
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(list, Utc::now())), vec!["Marina Cafe"]);
    }

    #[test]
    fn test_sorts() {
        let by_name = BusinessFilter {
            sort: BusinessSort::Name,
            ..Default::default()
        };
        assert_eq!(
            names(&by_name.apply(fixtures(), Utc::now())),
            vec!["Atlas Plumbing", "blue door bakery", "Marina Cafe"]
        );

        let by_rating = BusinessFilter {
            sort: BusinessSort::Rating,
            ..Default::default()
        };
        assert_eq!(
            names(&by_rating.apply(fixtures(), Utc::now())),
            vec!["Marina Cafe", "Atlas Plumbing", "blue door bakery"]
        );

        let oldest = BusinessFilter {
            sort: BusinessSort::Oldest,
            ..Default::default()
        };
        assert_eq!(names(&oldest.apply(fixtures(), Utc::now()))[0], "blue door bakery");
    }

    #[test]
    fn test_from_query_rejects_unknown_values() {
        let query = AdminBusinessQuery {
            sort: Some("popularity".to_string()),
            ..Default::default()
        };
        assert!(BusinessFilter::from_query(&query).is_err());

        let query = AdminBusinessQuery {
            status: Some("archived".to_string()),
            ..Default::default()
        };
        assert!(BusinessFilter::from_query(&query).is_err());

        let query = AdminBusinessQuery {
            q: Some("Atlas".to_string()),
            status: Some("Pending".to_string()),
            ..Default::default()
        };
        let filter = BusinessFilter::from_query(&query).unwrap();
        assert_eq!(filter.tokens, vec!["atlas"]);
        assert_eq!(filter.status, Some(ModerationStatus::Pending));
    }
}

// src/models/category.rs
// DOCUMENTATION: Business categories shown on the home page and in filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::not_blank;

use super::{BusinessResponse, Paginated};
use crate::services::localized_name;

/// Category record with its count of approved, active businesses
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,

    /// Icon identifier understood by the front end
    pub icon: Option<String>,

    /// Locale -> translated name
    pub translations: Value,

    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(default)]
    pub business_count: i64,
}

/// Localized category for public listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub business_count: i64,
}

impl Category {
    pub fn to_response(&self, locale: &str) -> CategoryResponse {
        CategoryResponse {
            id: self.id,
            name: localized_name(&self.translations, &self.name, locale),
            slug: self.slug.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            business_count: self.business_count,
        }
    }
}

/// GET /categories/{slug}
#[derive(Debug, Serialize)]
pub struct CategoryDetailResponse {
    pub category: CategoryResponse,
    pub businesses: Paginated<BusinessResponse>,
    pub locale: String,
    pub direction: &'static str,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 120), custom = "not_blank")]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(length(max = 60))]
    pub icon: Option<String>,

    /// JSON object of locale -> name
    pub translations: Option<Value>,

    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 120), custom = "not_blank")]
    pub name: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(length(max = 60))]
    pub icon: Option<String>,

    pub translations: Option<Value>,

    pub display_order: Option<i32>,

    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_response_is_localized() {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: "Restaurants".to_string(),
            slug: "restaurants".to_string(),
            description: None,
            icon: Some("utensils".to_string()),
            translations: json!({"fr": "Restaurants", "ar": "مطاعم"}),
            display_order: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
            business_count: 12,
        };

        assert_eq!(category.to_response("ar").name, "مطاعم");
        assert_eq!(category.to_response("en").name, "Restaurants");
        assert_eq!(category.to_response("en").business_count, 12);
    }
}

// src/db/category_repository.rs
// DOCUMENTATION: Category database operations

use crate::errors::DirectoryError;
use crate::models::{Category, CreateCategoryRequest, UpdateCategoryRequest};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

const CATEGORY_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.slug, c.description, c.icon, c.translations,
        c.display_order, c.is_active, c.created_at, c.updated_at,
        (
            SELECT COUNT(*) FROM businesses b
            WHERE b.category_id = c.id AND b.is_active = true AND b.status = 'approved'
        ) AS business_count
    FROM categories c
"#;

pub struct CategoryRepository;

impl CategoryRepository {
    /// Active categories in display order
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Category>, DirectoryError> {
        let sql = format!(
            "{} WHERE c.is_active = true ORDER BY c.display_order ASC, c.name ASC",
            CATEGORY_SELECT
        );
        sqlx::query_as::<_, Category>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| DirectoryError::from_db("List categories", e))
    }

    /// Every category including inactive ones (admin)
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Category>, DirectoryError> {
        let sql = format!("{} ORDER BY c.display_order ASC, c.name ASC", CATEGORY_SELECT);
        sqlx::query_as::<_, Category>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| DirectoryError::from_db("List categories", e))
    }

    pub async fn get_active_by_slug(pool: &PgPool, slug: &str) -> Result<Category, DirectoryError> {
        let sql = format!("{} WHERE c.slug = $1 AND c.is_active = true", CATEGORY_SELECT);
        sqlx::query_as::<_, Category>(&sql)
            .bind(slug)
            .fetch_optional(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Fetch category", e))?
            .ok_or_else(|| {
                log::warn!("Category not found: {}", slug);
                DirectoryError::NotFound(format!("category '{}'", slug))
            })
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Category, DirectoryError> {
        let sql = format!("{} WHERE c.id = $1", CATEGORY_SELECT);
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Fetch category", e))?
            .ok_or_else(|| DirectoryError::NotFound(format!("category {}", id)))
    }

    pub async fn taken_slugs(pool: &PgPool, base: &str) -> Result<Vec<String>, DirectoryError> {
        sqlx::query_scalar::<_, String>(
            "SELECT slug FROM categories WHERE slug = $1 OR slug LIKE $1 || '-%'",
        )
        .bind(base)
        .fetch_all(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Check category slugs", e))
    }

    pub async fn create(
        pool: &PgPool,
        req: &CreateCategoryRequest,
        slug: &str,
    ) -> Result<Category, DirectoryError> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO categories (name, slug, description, icon, translations, display_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&req.name)
        .bind(slug)
        .bind(&req.description)
        .bind(&req.icon)
        .bind(req.translations.clone().unwrap_or_else(|| Value::Object(Default::default())))
        .bind(req.display_order)
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Create category", e))?;

        log::info!("Created category {} ({})", slug, id);
        Self::get_by_id(pool, id).await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateCategoryRequest,
        new_slug: Option<&str>,
    ) -> Result<Category, DirectoryError> {
        let rows = sqlx::query(
            r#"
            UPDATE categories
            SET name = COALESCE($1, name),
                slug = COALESCE($2, slug),
                description = COALESCE($3, description),
                icon = COALESCE($4, icon),
                translations = COALESCE($5, translations),
                display_order = COALESCE($6, display_order),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind(&req.name)
        .bind(new_slug)
        .bind(&req.description)
        .bind(&req.icon)
        .bind(&req.translations)
        .bind(req.display_order)
        .bind(req.is_active)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Update category", e))?
        .rows_affected();

        if rows == 0 {
            return Err(DirectoryError::NotFound(format!("category {}", id)));
        }

        log::info!("Updated category: {}", id);
        Self::get_by_id(pool, id).await
    }
}

// src/db/location_repository.rs
// DOCUMENTATION: Country and city database operations
// PURPOSE: Reference data for listings, maps and admin catalog screens

use crate::errors::DirectoryError;
use crate::models::{
    City, Country, CreateCityRequest, CreateCountryRequest, UpdateCityRequest,
    UpdateCountryRequest,
};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

const COUNTRY_SELECT: &str = r#"
    SELECT
        co.id, co.name, co.code, co.slug, co.translations, co.created_at, co.updated_at,
        (
            SELECT COUNT(*) FROM businesses b
            JOIN cities ci ON ci.id = b.city_id
            JOIN categories c ON c.id = b.category_id
            WHERE ci.country_id = co.id AND b.is_active = true AND b.status = 'approved'
              AND c.is_active = true
        ) AS business_count
    FROM countries co
"#;

const CITY_SELECT: &str = r#"
    SELECT
        ci.id, ci.country_id, co.name AS country_name, co.code AS country_code,
        ci.name, ci.slug, ci.latitude, ci.longitude, ci.translations,
        ci.created_at, ci.updated_at,
        (
            SELECT COUNT(*) FROM businesses b
            JOIN categories c ON c.id = b.category_id
            WHERE b.city_id = ci.id AND b.is_active = true AND b.status = 'approved'
              AND c.is_active = true
        ) AS business_count
    FROM cities ci
    JOIN countries co ON co.id = ci.country_id
"#;

fn empty_translations() -> Value {
    Value::Object(Default::default())
}

pub struct LocationRepository;

impl LocationRepository {
    pub async fn list_countries(pool: &PgPool) -> Result<Vec<Country>, DirectoryError> {
        let sql = format!("{} ORDER BY co.name ASC", COUNTRY_SELECT);
        sqlx::query_as::<_, Country>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| DirectoryError::from_db("List countries", e))
    }

    pub async fn get_country_by_code(pool: &PgPool, code: &str) -> Result<Country, DirectoryError> {
        let sql = format!("{} WHERE co.code = $1", COUNTRY_SELECT);
        sqlx::query_as::<_, Country>(&sql)
            .bind(code.to_uppercase())
            .fetch_optional(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Fetch country", e))?
            .ok_or_else(|| {
                log::warn!("Country not found: {}", code);
                DirectoryError::NotFound(format!("country '{}'", code))
            })
    }

    pub async fn get_country(pool: &PgPool, id: Uuid) -> Result<Country, DirectoryError> {
        let sql = format!("{} WHERE co.id = $1", COUNTRY_SELECT);
        sqlx::query_as::<_, Country>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Fetch country", e))?
            .ok_or_else(|| DirectoryError::NotFound(format!("country {}", id)))
    }

    pub async fn create_country(
        pool: &PgPool,
        req: &CreateCountryRequest,
        slug: &str,
    ) -> Result<Country, DirectoryError> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO countries (name, code, slug, translations)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&req.name)
        .bind(req.code.to_uppercase())
        .bind(slug)
        .bind(req.translations.clone().unwrap_or_else(empty_translations))
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Create country", e))?;

        log::info!("Created country {} ({})", req.code.to_uppercase(), id);
        Self::get_country(pool, id).await
    }

    pub async fn update_country(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateCountryRequest,
    ) -> Result<Country, DirectoryError> {
        let rows = sqlx::query(
            r#"
            UPDATE countries
            SET name = COALESCE($1, name),
                translations = COALESCE($2, translations),
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(&req.name)
        .bind(&req.translations)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Update country", e))?
        .rows_affected();

        if rows == 0 {
            return Err(DirectoryError::NotFound(format!("country {}", id)));
        }
        Self::get_country(pool, id).await
    }

    /// Fails with a reference error while cities still belong to it
    pub async fn delete_country(pool: &PgPool, id: Uuid) -> Result<(), DirectoryError> {
        let rows = sqlx::query("DELETE FROM countries WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Delete country", e))?
            .rows_affected();

        if rows == 0 {
            return Err(DirectoryError::NotFound(format!("country {}", id)));
        }

        log::info!("Deleted country: {}", id);
        Ok(())
    }

    pub async fn count_cities(pool: &PgPool, country_id: Uuid) -> Result<i64, DirectoryError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cities WHERE country_id = $1")
            .bind(country_id)
            .fetch_one(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Count cities", e))
    }

    pub async fn list_cities_by_country(
        pool: &PgPool,
        country_id: Uuid,
    ) -> Result<Vec<City>, DirectoryError> {
        let sql = format!("{} WHERE ci.country_id = $1 ORDER BY ci.name ASC", CITY_SELECT);
        sqlx::query_as::<_, City>(&sql)
            .bind(country_id)
            .fetch_all(pool)
            .await
            .map_err(|e| DirectoryError::from_db("List cities", e))
    }

    pub async fn list_all_cities(pool: &PgPool) -> Result<Vec<City>, DirectoryError> {
        let sql = format!("{} ORDER BY co.name ASC, ci.name ASC", CITY_SELECT);
        sqlx::query_as::<_, City>(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| DirectoryError::from_db("List cities", e))
    }

    pub async fn get_city_by_slug(pool: &PgPool, slug: &str) -> Result<City, DirectoryError> {
        let sql = format!("{} WHERE ci.slug = $1", CITY_SELECT);
        sqlx::query_as::<_, City>(&sql)
            .bind(slug)
            .fetch_optional(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Fetch city", e))?
            .ok_or_else(|| {
                log::warn!("City not found: {}", slug);
                DirectoryError::NotFound(format!("city '{}'", slug))
            })
    }

    pub async fn get_city(pool: &PgPool, id: Uuid) -> Result<City, DirectoryError> {
        let sql = format!("{} WHERE ci.id = $1", CITY_SELECT);
        sqlx::query_as::<_, City>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Fetch city", e))?
            .ok_or_else(|| DirectoryError::NotFound(format!("city {}", id)))
    }

    /// Existing slugs in `table` equal to `base` or of the form `base-N`
    pub async fn taken_slugs(
        pool: &PgPool,
        table: LocationTable,
        base: &str,
    ) -> Result<Vec<String>, DirectoryError> {
        let sql = format!(
            "SELECT slug FROM {} WHERE slug = $1 OR slug LIKE $1 || '-%'",
            table.name()
        );
        sqlx::query_scalar::<_, String>(&sql)
            .bind(base)
            .fetch_all(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Check location slugs", e))
    }

    pub async fn create_city(
        pool: &PgPool,
        req: &CreateCityRequest,
        slug: &str,
        coordinates: Option<(f64, f64)>,
    ) -> Result<City, DirectoryError> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO cities (country_id, name, slug, latitude, longitude, translations)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(req.country_id)
        .bind(&req.name)
        .bind(slug)
        .bind(coordinates.map(|(lat, _)| lat))
        .bind(coordinates.map(|(_, lng)| lng))
        .bind(req.translations.clone().unwrap_or_else(empty_translations))
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Create city", e))?;

        log::info!("Created city {} ({})", slug, id);
        Self::get_city(pool, id).await
    }

    pub async fn update_city(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateCityRequest,
        new_slug: Option<&str>,
    ) -> Result<City, DirectoryError> {
        let rows = sqlx::query(
            r#"
            UPDATE cities
            SET name = COALESCE($1, name),
                slug = COALESCE($2, slug),
                latitude = COALESCE($3, latitude),
                longitude = COALESCE($4, longitude),
                translations = COALESCE($5, translations),
                updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(&req.name)
        .bind(new_slug)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(&req.translations)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Update city", e))?
        .rows_affected();

        if rows == 0 {
            return Err(DirectoryError::NotFound(format!("city {}", id)));
        }

        log::info!("Updated city: {}", id);
        Self::get_city(pool, id).await
    }
}

/// Tables whose slugs are checked through `taken_slugs`
#[derive(Debug, Clone, Copy)]
pub enum LocationTable {
    Countries,
    Cities,
}

impl LocationTable {
    fn name(&self) -> &'static str {
        match self {
            LocationTable::Countries => "countries",
            LocationTable::Cities => "cities",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_follow_public_visibility() {
        for sql in [COUNTRY_SELECT, CITY_SELECT] {
            assert!(sql.contains("JOIN categories c ON c.id = b.category_id"));
            assert!(sql.contains("c.is_active = true"));
            assert!(sql.contains("b.status = 'approved'"));
        }
    }
}

// src/db/admin_user_repository.rs
// DOCUMENTATION: Admin user registry operations

use crate::errors::DirectoryError;
use crate::models::{check_admin_removal, AdminRole, AdminUser};
use sqlx::PgPool;
use uuid::Uuid;

pub struct AdminUserRepository;

impl AdminUserRepository {
    pub async fn list(pool: &PgPool) -> Result<Vec<AdminUser>, DirectoryError> {
        sqlx::query_as::<_, AdminUser>(
            "SELECT id, email, display_name, role, created_at FROM admin_users ORDER BY email ASC",
        )
        .fetch_all(pool)
        .await
        .map_err(|e| DirectoryError::from_db("List admin users", e))
    }

    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<AdminUser>, DirectoryError> {
        sqlx::query_as::<_, AdminUser>(
            "SELECT id, email, display_name, role, created_at FROM admin_users WHERE email = $1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Fetch admin user", e))
    }

    pub async fn create(
        pool: &PgPool,
        email: &str,
        display_name: Option<&str>,
        role: AdminRole,
    ) -> Result<AdminUser, DirectoryError> {
        let user = sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO admin_users (email, display_name, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, display_name, role, created_at
            "#,
        )
        .bind(email.trim().to_lowercase())
        .bind(display_name)
        .bind(role.as_str())
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Create admin user", e))?;

        log::info!("Added admin user {} as {}", user.email, user.role);
        Ok(user)
    }

    /// Remove an admin user, keeping at least one `admin`
    /// DOCUMENTATION: Every admin row is locked first so concurrent removals
    /// see each other's deletes
    pub async fn remove(pool: &PgPool, id: Uuid) -> Result<(), DirectoryError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| DirectoryError::from_db("Begin admin removal", e))?;

        let admins = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM admin_users WHERE role = 'admin' ORDER BY id FOR UPDATE",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| DirectoryError::from_db("Lock admin users", e))?;

        let role = sqlx::query_scalar::<_, String>(
            "SELECT role FROM admin_users WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DirectoryError::from_db("Fetch admin user", e))?
        .ok_or_else(|| DirectoryError::NotFound(format!("admin user {}", id)))?;

        check_admin_removal(&role, admins.len())?;

        sqlx::query("DELETE FROM admin_users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DirectoryError::from_db("Delete admin user", e))?;

        tx.commit()
            .await
            .map_err(|e| DirectoryError::from_db("Commit admin removal", e))?;

        log::info!("Removed admin user: {}", id);
        Ok(())
    }
}

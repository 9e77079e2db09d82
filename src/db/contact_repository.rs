// src/db/contact_repository.rs
// DOCUMENTATION: Contact message database operations

use crate::errors::DirectoryError;
use crate::models::{ContactMessage, CreateContactMessageRequest, PageParams};
use sqlx::PgPool;
use uuid::Uuid;

pub struct ContactRepository;

impl ContactRepository {
    pub async fn create(
        pool: &PgPool,
        req: &CreateContactMessageRequest,
    ) -> Result<ContactMessage, DirectoryError> {
        let message = sqlx::query_as::<_, ContactMessage>(
            r#"
            INSERT INTO contact_messages (name, email, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, subject, message, is_read, created_at
            "#,
        )
        .bind(req.name.trim())
        .bind(req.email.trim())
        .bind(&req.subject)
        .bind(&req.message)
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Create contact message", e))?;

        log::info!("Contact message {} received", message.id);
        Ok(message)
    }

    pub async fn list(
        pool: &PgPool,
        unread_only: bool,
        page: PageParams,
    ) -> Result<(Vec<ContactMessage>, i64), DirectoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contact_messages WHERE ($1 = false OR is_read = false)",
        )
        .bind(unread_only)
        .fetch_one(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Count contact messages", e))?;

        let messages = sqlx::query_as::<_, ContactMessage>(
            r#"
            SELECT id, name, email, subject, message, is_read, created_at
            FROM contact_messages
            WHERE ($1 = false OR is_read = false)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(unread_only)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Fetch contact messages", e))?;

        Ok((messages, total))
    }

    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<ContactMessage, DirectoryError> {
        sqlx::query_as::<_, ContactMessage>(
            r#"
            UPDATE contact_messages SET is_read = true
            WHERE id = $1
            RETURNING id, name, email, subject, message, is_read, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| DirectoryError::from_db("Mark message read", e))?
        .ok_or_else(|| DirectoryError::NotFound(format!("message {}", id)))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), DirectoryError> {
        let rows = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| DirectoryError::from_db("Delete message", e))?
            .rows_affected();

        if rows == 0 {
            return Err(DirectoryError::NotFound(format!("message {}", id)));
        }

        log::info!("Deleted contact message: {}", id);
        Ok(())
    }
}

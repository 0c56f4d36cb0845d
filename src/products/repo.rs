use sqlx::PgPool;
use uuid::Uuid;

use crate::products::repo_types::Product;

const PRODUCT_COLUMNS: &str = "id, name, slogan, description, tags, admin_id, created_at";

impl Product {
    pub async fn create(
        db: &PgPool,
        name: &str,
        slogan: Option<&str>,
        description: &str,
        tags: &[String],
        admin_id: Uuid,
    ) -> anyhow::Result<Product> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, slogan, description, tags, admin_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(name)
        .bind(slogan)
        .bind(description)
        .bind(tags)
        .bind(admin_id)
        .fetch_one(db)
        .await?;
        Ok(product)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }

    pub async fn find_by_admin(db: &PgPool, admin_id: Uuid) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE admin_id = $1
             ORDER BY created_at DESC
             LIMIT 1"
        ))
        .bind(admin_id)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }
}

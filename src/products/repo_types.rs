use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Product record. `admin_id` points at the owning user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slogan: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub admin_id: Uuid,
    pub created_at: OffsetDateTime,
}

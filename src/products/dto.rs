use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::products::repo_types::Product;

/// Request body for creating a product. The admin is the authenticated user.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub slogan: Option<String>,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Query string for the by-admin lookup.
#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    #[serde(rename = "adminId")]
    pub admin_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub status: &'static str,
    pub data: ProductData,
}

#[derive(Debug, Serialize)]
pub struct ProductData {
    pub product: Product,
}

impl ProductResponse {
    pub fn new(product: Product) -> Self {
        Self {
            status: "success",
            data: ProductData { product },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_tags_default_to_empty() {
        let body = r#"{"name": "Feedbacia", "description": "Feedback boards"}"#;
        let req: CreateProductRequest = serde_json::from_str(body).expect("deserialize");
        assert!(req.tags.is_empty());
        assert!(req.slogan.is_none());
    }

    #[test]
    fn admin_query_uses_camel_case() {
        let query = format!(r#"{{"adminId": "{}"}}"#, Uuid::new_v4());
        assert!(serde_json::from_str::<AdminQuery>(&query).is_ok());
    }
}

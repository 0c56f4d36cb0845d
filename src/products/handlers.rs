use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::ApiError,
    products::{
        dto::{AdminQuery, CreateProductRequest, ProductResponse},
        repo_types::Product,
    },
    state::AppState,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/product", post(create_product).get(get_product_by_admin))
        .route("/product/:product_id", get(get_product_by_id))
}

#[instrument(skip(state, current, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Product name is required".into()));
    }
    if payload.description.trim().is_empty() {
        return Err(ApiError::Validation(
            "Product description is required".into(),
        ));
    }

    let product = Product::create(
        &state.db,
        payload.name.trim(),
        payload.slogan.as_deref(),
        payload.description.trim(),
        &payload.tags,
        current.0.id,
    )
    .await
    .map_err(ApiError::internal)?;

    info!(product_id = %product.id, admin_id = %product.admin_id, "product created");
    Ok((StatusCode::CREATED, Json(ProductResponse::new(product))))
}

#[instrument(skip(state))]
pub async fn get_product_by_admin(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = Product::find_by_admin(&state.db, query.admin_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    Ok(Json(ProductResponse::new(product)))
}

#[instrument(skip(state))]
pub async fn get_product_by_id(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = Product::find_by_id(&state.db, product_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    Ok(Json(ProductResponse::new(product)))
}

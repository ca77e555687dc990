//! Product handlers
//!
//! Thin translation between HTTP and the service layer: reads go through
//! the search façade, mutations through the catalog, and `/store/*` routes
//! expose the authoritative rows for callers that must bypass the cache.

use crate::services::SearchOutcome;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use stockroom_core::{Product, ProductInput, StockError};

fn status_for(err: &StockError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn validate(input: &ProductInput) -> Result<(), StatusCode> {
    if input.name.trim().is_empty() || !input.price.is_finite() || input.price < 0.0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    product: Product,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    synced: usize,
}

pub async fn find_all(
    State(state): State<AppState>,
) -> Result<Json<SearchOutcome>, StatusCode> {
    match state.search.find_all().await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            tracing::error!("Failed to query products: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn find_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SearchOutcome>, StatusCode> {
    // Zero hits is a valid empty outcome, not a 404
    match state.search.find_by_id(id).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            tracing::error!("Failed to query product {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductResponse>, StatusCode> {
    validate(&input)?;

    match state.catalog.create(&input).await {
        Ok(product) => Ok(Json(ProductResponse { product })),
        Err(e) => {
            tracing::error!("Failed to create product: {}", e);
            Err(status_for(&e))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    name: String,
    price: f64,
    description: String,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, StatusCode> {
    let product = Product {
        id,
        name: req.name,
        price: req.price,
        description: req.description,
    };
    validate(&ProductInput {
        name: product.name.clone(),
        price: product.price,
        description: product.description.clone(),
    })?;

    match state.catalog.update(&product).await {
        Ok(stored) => Ok(Json(ProductResponse { product: stored })),
        Err(e) => {
            if !e.is_not_found() {
                tracing::error!("Failed to update product {}: {}", id, e);
            }
            Err(status_for(&e))
        }
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    match state.catalog.delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            if !e.is_not_found() {
                tracing::error!("Failed to delete product {}: {}", id, e);
            }
            Err(status_for(&e))
        }
    }
}

pub async fn reconcile(
    State(state): State<AppState>,
) -> Result<Json<ReconcileResponse>, StatusCode> {
    match state.synchronizer.reconcile().await {
        Ok(synced) => Ok(Json(ReconcileResponse { synced })),
        Err(e) => {
            tracing::error!("Reconciliation failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn list_store(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, StatusCode> {
    match state.catalog.list_all().await {
        Ok(products) => Ok(Json(ProductListResponse { products })),
        Err(e) => {
            tracing::error!("Failed to list products: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_store(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, StatusCode> {
    match state.catalog.get_by_id(id).await {
        Ok(Some(product)) => Ok(Json(ProductResponse { product })),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to get product {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

//! Storefront endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::validate_slug;
use super::{ApiError, ApiResponse, AppState, SearchParams};
use crate::models::Category;
use crate::services::SearchResults;
use crate::services::catalog_service::{
    CategoryModelsPage, CategoryProductsPage, ModelProductsPage, ProductPage,
};

/// GET /categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state.catalog().categories_page().await?;
    Ok(Json(ApiResponse::success(categories)))
}

/// POST /categories/refresh
pub async fn refresh_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state.catalog_store().fetch_categories().await?;
    Ok(Json(ApiResponse::success(categories)))
}

/// GET /categories/{category}
pub async fn category_models(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<CategoryModelsPage>>, ApiError> {
    let slug = validate_slug(&category)?;
    let page = state.catalog().category_models_page(slug).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /categories/{category}/products
pub async fn category_products(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<CategoryProductsPage>>, ApiError> {
    let slug = validate_slug(&category)?;
    let page = state.catalog().category_products_page(slug).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /categories/{category}/{model}
pub async fn model_products(
    State(state): State<Arc<AppState>>,
    Path((category, model)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ModelProductsPage>>, ApiError> {
    let category = validate_slug(&category)?;
    let model = validate_slug(&model)?;
    let page = state.catalog().model_products_page(category, model).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /products/{product}
pub async fn product_detail(
    State(state): State<Arc<AppState>>,
    Path(product): Path<String>,
) -> Result<Json<ApiResponse<ProductPage>>, ApiError> {
    let slug = validate_slug(&product)?;
    let page = state.catalog().product_page(slug).await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /search?q=
/// `data` is `null` when the query is too short to search.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Option<SearchResults>>>, ApiError> {
    let results = state.catalog_store().fetch_search_results(&params.q).await?;
    Ok(Json(ApiResponse {
        success: true,
        data: Some(results),
        error: None,
    }))
}

//! Admin endpoints. Create and update take `multipart/form-data` so a file
//! can travel with the row fields.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use std::collections::HashMap;
use std::sync::Arc;

use super::validation::{parse_id_field, parse_price_field, validate_id};
use super::{ApiError, ApiResponse, AppState, MessageResponse, ProductFilter};
use crate::models::{Category, Model, Product};
use crate::services::admin::{ModelDetail, ProductListing};
use crate::services::{CategoryForm, ModelForm, ProductForm, Upload};

/// Text fields (possibly repeated) and files of one submitted form.
#[derive(Debug, Default)]
struct FormFields {
    text: HashMap<String, Vec<String>>,
    files: HashMap<String, Upload>,
}

impl FormFields {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(format!("Invalid form data: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("Failed to read '{name}': {e}")))?;

                // Browsers send an empty part for an untouched file input.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                fields.files.insert(
                    name,
                    Upload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    },
                );
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Failed to read '{name}': {e}")))?;
                fields.text.entry(name).or_default().push(value);
            }
        }

        Ok(fields)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.text.get(name).and_then(|values| values.first()).cloned()
    }

    fn title(&self) -> String {
        self.text("title").unwrap_or_default()
    }

    fn id(&self, name: &str) -> Result<Option<i32>, ApiError> {
        match self.text(name) {
            Some(value) => parse_id_field(name, &value),
            None => Ok(None),
        }
    }

    /// Repeated fields and comma separated lists are both accepted.
    fn ids(&self, name: &str) -> Result<Vec<i32>, ApiError> {
        let mut ids = Vec::new();
        for value in self.text.get(name).into_iter().flatten() {
            for part in value.split(',') {
                if let Some(id) = parse_id_field(name, part)? {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    fn price(&self) -> Result<Option<f64>, ApiError> {
        match self.text("price") {
            Some(value) => parse_price_field(&value),
            None => Ok(None),
        }
    }

    fn file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(name)
    }

    fn into_category_form(mut self) -> CategoryForm {
        CategoryForm {
            title: self.title(),
            image: self.file("image"),
        }
    }

    fn into_model_form(mut self) -> Result<ModelForm, ApiError> {
        Ok(ModelForm {
            title: self.title(),
            description: self.text("description"),
            rating_value: self.text("rating_value"),
            rating_unit: self.text("rating_unit"),
            category_ids: self.ids("category_ids")?,
            image: self.file("image"),
            datasheet: self.file("datasheet"),
        })
    }

    fn into_product_form(mut self) -> Result<ProductForm, ApiError> {
        Ok(ProductForm {
            title: self.title(),
            description: self.text("description"),
            price: self.price()?,
            rating_value: self.text("rating_value"),
            rating_unit: self.text("rating_unit"),
            category_id: self.id("category_id")?,
            model_id: self.id("model_id")?,
            image: self.file("image"),
        })
    }
}

fn deleted(kind: &str, id: i32) -> Json<ApiResponse<MessageResponse>> {
    Json(ApiResponse::success(MessageResponse {
        message: format!("Deleted {kind} {id}"),
    }))
}

// ============================================================================
// Categories
// ============================================================================

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state.admin().list_categories().await?;
    Ok(Json(ApiResponse::success(categories)))
}

pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let id = validate_id("category", id)?;
    let category = state.admin().get_category(id).await?;
    Ok(Json(ApiResponse::success(category)))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let form = FormFields::read(multipart).await?.into_category_form();
    let category = state.admin().add_category(form).await?;
    Ok(Json(ApiResponse::success(category)))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let id = validate_id("category", id)?;
    let form = FormFields::read(multipart).await?.into_category_form();
    let category = state.admin().edit_category(id, form).await?;
    Ok(Json(ApiResponse::success(category)))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("category", id)?;
    state.admin().delete_category(id).await?;
    Ok(deleted("category", id))
}

// ============================================================================
// Models
// ============================================================================

pub async fn list_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Model>>>, ApiError> {
    let models = state.admin().list_models().await?;
    Ok(Json(ApiResponse::success(models)))
}

pub async fn get_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ModelDetail>>, ApiError> {
    let id = validate_id("model", id)?;
    let model = state.admin().get_model(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

pub async fn create_model(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ModelDetail>>, ApiError> {
    let form = FormFields::read(multipart).await?.into_model_form()?;
    let model = state.admin().add_model(form).await?;
    Ok(Json(ApiResponse::success(model)))
}

pub async fn update_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ModelDetail>>, ApiError> {
    let id = validate_id("model", id)?;
    let form = FormFields::read(multipart).await?.into_model_form()?;
    let model = state.admin().edit_model(id, form).await?;
    Ok(Json(ApiResponse::success(model)))
}

pub async fn delete_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("model", id)?;
    state.admin().delete_model(id).await?;
    Ok(deleted("model", id))
}

// ============================================================================
// Products
// ============================================================================

/// GET /admin/products?category_id=
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<ApiResponse<ProductListing>>, ApiError> {
    let category_id = filter
        .category_id
        .map(|id| validate_id("category", id))
        .transpose()?;
    let listing = state.admin().list_products(category_id).await?;
    Ok(Json(ApiResponse::success(listing)))
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let id = validate_id("product", id)?;
    let product = state.admin().get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let form = FormFields::read(multipart).await?.into_product_form()?;
    let product = state.admin().add_product(form).await?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let id = validate_id("product", id)?;
    let form = FormFields::read(multipart).await?.into_product_form()?;
    let product = state.admin().edit_product(id, form).await?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_id("product", id)?;
    state.admin().delete_product(id).await?;
    Ok(deleted("product", id))
}

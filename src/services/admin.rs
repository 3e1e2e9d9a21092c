//! Admin forms: add, edit and delete catalog rows.
//!
//! A form optionally uploads a file to object storage first and only writes
//! the row once the upload succeeded. Model writes touch two tables and are
//! not transactional; a failed link insert deletes the freshly inserted
//! model again.

use crate::backend::{BackendError, CatalogBackend, Query};
use crate::config::{Config, SlugStyle};
use crate::models::{
    Category, CategoryChanges, CategoryModel, Model, ModelChanges, ModelGroup, NewCategory,
    NewModel, NewProduct, Product, ProductChanges,
};
use crate::services::catalog_store::{
    CATEGORIES_ERROR, CatalogStore, FetchError, MODELS_ERROR, PRODUCTS_ERROR,
};
use crate::services::grouping::{group_all_by_model, group_products_by_model};
use crate::services::slug::slugify;
use crate::storage::{ObjectStorage, object_name};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

pub const IMAGE_UPLOAD_ERROR: &str = "Failed to upload image. Please try again later.";
pub const DATASHEET_UPLOAD_ERROR: &str = "Failed to upload data sheet. Please try again later.";

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Upload(&'static str),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Data service error: {0}")]
    Backend(BackendError),
}

impl From<BackendError> for AdminError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(what) => Self::NotFound(what),
            other => Self::Backend(other),
        }
    }
}

/// Maps a failed admin read to its "Failed to fetch ..." message.
fn read_failed(message: &'static str) -> impl Fn(BackendError) -> AdminError {
    move |err| match err {
        BackendError::NotFound(what) => AdminError::NotFound(what),
        other => {
            error!(error = %other, "Admin read failed");
            AdminError::Fetch(FetchError(message))
        }
    }
}

/// A file received from an admin form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    fn resolved_content_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|c| !c.is_empty() && c != "application/octet-stream")
            .unwrap_or_else(|| {
                mime_guess::from_path(&self.file_name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    pub title: String,
    pub image: Option<Upload>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelForm {
    pub title: String,
    pub description: Option<String>,
    pub rating_value: Option<String>,
    pub rating_unit: Option<String>,
    pub category_ids: Vec<i32>,
    pub image: Option<Upload>,
    pub datasheet: Option<Upload>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub rating_value: Option<String>,
    pub rating_unit: Option<String>,
    pub category_id: Option<i32>,
    pub model_id: Option<i32>,
    pub image: Option<Upload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelDetail {
    #[serde(flatten)]
    pub model: Model,
    pub category_ids: Vec<i32>,
}

/// Products of one category, grouped by model.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSection {
    pub category_id: i32,
    pub groups: Vec<ModelGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductListing {
    pub sections: Vec<ProductSection>,
    /// Set when there is nothing to show.
    pub empty_message: Option<&'static str>,
}

pub const NO_PRODUCTS: &str = "No products found";

pub struct AdminService {
    backend: Arc<dyn CatalogBackend>,
    storage: Arc<dyn ObjectStorage>,
    store: Arc<CatalogStore>,
    slug_style: SlugStyle,
    images_bucket: String,
    datasheets_bucket: String,
    max_upload_bytes: usize,
}

fn required_title(title: &str) -> Result<String, AdminError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AdminError::Validation("Title is required".to_string()));
    }
    Ok(title.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Absent field: untouched. Blank field: cleared to null.
fn edited_text(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| optional_text(Some(v)))
}

impl AdminService {
    #[must_use]
    pub fn new(
        backend: Arc<dyn CatalogBackend>,
        storage: Arc<dyn ObjectStorage>,
        store: Arc<CatalogStore>,
        config: &Config,
    ) -> Self {
        Self {
            backend,
            storage,
            store,
            slug_style: config.catalog.slug_style,
            images_bucket: config.storage.images_bucket.clone(),
            datasheets_bucket: config.storage.datasheets_bucket.clone(),
            max_upload_bytes: config.storage.max_upload_mb * 1024 * 1024,
        }
    }

    fn check_upload(&self, upload: &Upload, datasheet: bool) -> Result<(), AdminError> {
        if upload.bytes.is_empty() {
            return Err(AdminError::Validation(format!(
                "Uploaded file '{}' is empty",
                upload.file_name
            )));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(AdminError::Validation(format!(
                "Uploaded file '{}' is too large",
                upload.file_name
            )));
        }

        let content_type = upload.resolved_content_type();
        if datasheet && content_type != "application/pdf" {
            return Err(AdminError::Validation("Data sheet must be a PDF".to_string()));
        }
        if !datasheet && !content_type.starts_with("image/") {
            return Err(AdminError::Validation("Image must be an image file".to_string()));
        }
        Ok(())
    }

    /// Uploads a file and returns its public URL.
    async fn upload(
        &self,
        bucket: &str,
        upload: Upload,
        failure: &'static str,
    ) -> Result<String, AdminError> {
        let path = object_name(&upload.file_name);
        let content_type = upload.resolved_content_type();

        if let Err(e) = self
            .storage
            .upload(bucket, &path, upload.bytes, &content_type)
            .await
        {
            error!(bucket, path = %path, error = %e, "Upload failed");
            return Err(AdminError::Upload(failure));
        }

        Ok(self.storage.public_url(bucket, &path))
    }

    async fn upload_image(&self, image: Option<Upload>) -> Result<Option<String>, AdminError> {
        match image {
            Some(upload) => {
                let bucket = self.images_bucket.clone();
                self.upload(&bucket, upload, IMAGE_UPLOAD_ERROR)
                    .await
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    async fn upload_datasheet(&self, sheet: Option<Upload>) -> Result<Option<String>, AdminError> {
        match sheet {
            Some(upload) => {
                let bucket = self.datasheets_bucket.clone();
                self.upload(&bucket, upload, DATASHEET_UPLOAD_ERROR)
                    .await
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    // Categories

    pub async fn list_categories(&self) -> Result<Vec<Category>, AdminError> {
        self.backend
            .categories(&Query::new().order_by("id", true))
            .await
            .map_err(read_failed(CATEGORIES_ERROR))
    }

    pub async fn get_category(&self, id: i32) -> Result<Category, AdminError> {
        let rows = self
            .backend
            .categories(&Query::new().eq("id", id))
            .await
            .map_err(read_failed(CATEGORIES_ERROR))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AdminError::NotFound(format!("category {id}")))
    }

    pub async fn add_category(&self, form: CategoryForm) -> Result<Category, AdminError> {
        let title = required_title(&form.title)?;
        if let Some(image) = &form.image {
            self.check_upload(image, false)?;
        }
        let image = self.upload_image(form.image).await?;

        let category = self
            .backend
            .insert_category(&NewCategory {
                slug: slugify(&title, self.slug_style),
                title,
                image,
            })
            .await?;

        info!(id = category.id, slug = %category.slug, "Category added");
        self.store.upsert_category(category.clone()).await;
        Ok(category)
    }

    pub async fn edit_category(&self, id: i32, form: CategoryForm) -> Result<Category, AdminError> {
        let title = required_title(&form.title)?;
        if let Some(image) = &form.image {
            self.check_upload(image, false)?;
        }
        let image = self.upload_image(form.image).await?;

        let category = self
            .backend
            .update_category(
                id,
                &CategoryChanges {
                    slug: Some(slugify(&title, self.slug_style)),
                    title: Some(title),
                    image,
                },
            )
            .await?;

        info!(id, "Category updated");
        self.store.upsert_category(category.clone()).await;
        Ok(category)
    }

    pub async fn delete_category(&self, id: i32) -> Result<(), AdminError> {
        self.backend.delete_category(id).await?;
        info!(id, "Category deleted");
        self.store.remove_category(id).await;
        Ok(())
    }

    // Models

    pub async fn list_models(&self) -> Result<Vec<Model>, AdminError> {
        self.backend
            .models(&Query::new().order_by("id", true))
            .await
            .map_err(read_failed(MODELS_ERROR))
    }

    pub async fn get_model(&self, id: i32) -> Result<ModelDetail, AdminError> {
        let model = self
            .backend
            .models(&Query::new().eq("id", id))
            .await
            .map_err(read_failed(MODELS_ERROR))?
            .into_iter()
            .next()
            .ok_or_else(|| AdminError::NotFound(format!("model {id}")))?;

        let category_ids = self
            .backend
            .category_models(&Query::new().eq("model_id", id))
            .await
            .map_err(read_failed(MODELS_ERROR))?
            .into_iter()
            .map(|l| l.category_id)
            .collect();

        Ok(ModelDetail {
            model,
            category_ids,
        })
    }

    fn validate_model_form(&self, form: &ModelForm) -> Result<(String, Vec<i32>), AdminError> {
        let title = required_title(&form.title)?;

        let mut category_ids = form.category_ids.clone();
        category_ids.sort_unstable();
        category_ids.dedup();
        if category_ids.is_empty() {
            return Err(AdminError::Validation(
                "Select at least one category".to_string(),
            ));
        }

        if let Some(image) = &form.image {
            self.check_upload(image, false)?;
        }
        if let Some(sheet) = &form.datasheet {
            self.check_upload(sheet, true)?;
        }
        Ok((title, category_ids))
    }

    async fn ensure_categories_exist(&self, ids: &[i32]) -> Result<(), AdminError> {
        let found = self
            .backend
            .categories(&Query::new().is_in("id", ids.to_vec()))
            .await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|c| c.id == **id)) {
            return Err(AdminError::Validation(format!(
                "Category {missing} does not exist"
            )));
        }
        Ok(())
    }

    async fn link_categories(&self, model_id: i32, category_ids: &[i32]) -> Result<(), BackendError> {
        for category_id in category_ids {
            self.backend
                .insert_category_model(CategoryModel {
                    category_id: *category_id,
                    model_id,
                })
                .await?;
        }
        Ok(())
    }

    pub async fn add_model(&self, form: ModelForm) -> Result<ModelDetail, AdminError> {
        let (title, category_ids) = self.validate_model_form(&form)?;
        self.ensure_categories_exist(&category_ids).await?;

        let image = self.upload_image(form.image).await?;
        let datasheet_url = self.upload_datasheet(form.datasheet).await?;

        let model = self
            .backend
            .insert_model(&NewModel {
                slug: slugify(&title, self.slug_style),
                title,
                description: optional_text(form.description),
                image,
                datasheet_url,
                rating_value: optional_text(form.rating_value),
                rating_unit: optional_text(form.rating_unit),
            })
            .await?;

        if let Err(e) = self.link_categories(model.id, &category_ids).await {
            warn!(model_id = model.id, error = %e, "Linking model to categories failed, removing model");
            if let Err(cleanup) = self
                .backend
                .delete_category_models(&Query::new().eq("model_id", model.id))
                .await
            {
                error!(model_id = model.id, error = %cleanup, "Failed to remove partial model links");
            }
            if let Err(cleanup) = self.backend.delete_model(model.id).await {
                error!(model_id = model.id, error = %cleanup, "Failed to remove orphaned model");
            }
            return Err(e.into());
        }

        info!(id = model.id, slug = %model.slug, categories = ?category_ids, "Model added");
        self.store.invalidate_models(&category_ids).await;
        Ok(ModelDetail {
            model,
            category_ids,
        })
    }

    pub async fn edit_model(&self, id: i32, form: ModelForm) -> Result<ModelDetail, AdminError> {
        let (title, category_ids) = self.validate_model_form(&form)?;
        self.ensure_categories_exist(&category_ids).await?;
        let previous = self.get_model(id).await?;

        let image = self.upload_image(form.image).await?;
        let datasheet_url = self.upload_datasheet(form.datasheet).await?;

        let model = self
            .backend
            .update_model(
                id,
                &ModelChanges {
                    slug: Some(slugify(&title, self.slug_style)),
                    title: Some(title),
                    description: edited_text(form.description),
                    image,
                    datasheet_url,
                    rating_value: edited_text(form.rating_value),
                    rating_unit: edited_text(form.rating_unit),
                },
            )
            .await?;

        if previous.category_ids != category_ids {
            self.backend
                .delete_category_models(&Query::new().eq("model_id", id))
                .await?;
            self.link_categories(id, &category_ids).await?;
        }

        info!(id, categories = ?category_ids, "Model updated");
        let mut touched = previous.category_ids;
        touched.extend(&category_ids);
        self.store.invalidate_models(&touched).await;

        Ok(ModelDetail {
            model,
            category_ids,
        })
    }

    pub async fn delete_model(&self, id: i32) -> Result<(), AdminError> {
        self.backend
            .delete_category_models(&Query::new().eq("model_id", id))
            .await?;
        self.backend.delete_model(id).await?;
        info!(id, "Model deleted");
        self.store.remove_model(id).await;
        Ok(())
    }

    // Products

    /// Products grouped by model, optionally for one category only.
    pub async fn list_products(&self, category_id: Option<i32>) -> Result<ProductListing, AdminError> {
        let query = match category_id {
            Some(id) => Query::new().eq("category_id", id),
            None => Query::new(),
        }
        .order_by("id", true);

        let products = self
            .backend
            .products(&query)
            .await
            .map_err(read_failed(PRODUCTS_ERROR))?;
        let sections = if products.is_empty() {
            Vec::new()
        } else {
            let mut model_ids: Vec<i32> = products.iter().map(|p| p.model_id).collect();
            model_ids.sort_unstable();
            model_ids.dedup();
            let models = self
                .backend
                .models(&Query::new().is_in("id", model_ids).order_by("id", true))
                .await
                .map_err(read_failed(MODELS_ERROR))?;

            match category_id {
                Some(id) => vec![ProductSection {
                    category_id: id,
                    groups: group_products_by_model(id, &products, &models),
                }],
                None => group_all_by_model(&products, &models)
                    .into_iter()
                    .map(|(category_id, groups)| ProductSection {
                        category_id,
                        groups,
                    })
                    .collect(),
            }
        };

        let empty = sections.iter().all(|s| s.groups.is_empty());
        Ok(ProductListing {
            sections: if empty { Vec::new() } else { sections },
            empty_message: empty.then_some(NO_PRODUCTS),
        })
    }

    pub async fn get_product(&self, id: i32) -> Result<Product, AdminError> {
        self.backend
            .products(&Query::new().eq("id", id))
            .await
            .map_err(read_failed(PRODUCTS_ERROR))?
            .into_iter()
            .next()
            .ok_or_else(|| AdminError::NotFound(format!("product {id}")))
    }

    async fn ensure_linked(&self, category_id: i32, model_id: i32) -> Result<(), AdminError> {
        let links = self
            .backend
            .category_models(
                &Query::new()
                    .eq("category_id", category_id)
                    .eq("model_id", model_id),
            )
            .await?;
        if links.is_empty() {
            return Err(AdminError::Validation(format!(
                "Model {model_id} is not linked to category {category_id}"
            )));
        }
        Ok(())
    }

    fn validate_product_form(&self, form: &ProductForm) -> Result<(String, i32, i32), AdminError> {
        let title = required_title(&form.title)?;
        let category_id = form
            .category_id
            .ok_or_else(|| AdminError::Validation("Category is required".to_string()))?;
        let model_id = form
            .model_id
            .ok_or_else(|| AdminError::Validation("Model is required".to_string()))?;
        if form.price.is_some_and(|p| !p.is_finite() || p < 0.0) {
            return Err(AdminError::Validation(
                "Price must be a non-negative number".to_string(),
            ));
        }
        if let Some(image) = &form.image {
            self.check_upload(image, false)?;
        }
        Ok((title, category_id, model_id))
    }

    pub async fn add_product(&self, form: ProductForm) -> Result<Product, AdminError> {
        let (title, category_id, model_id) = self.validate_product_form(&form)?;
        self.ensure_linked(category_id, model_id).await?;

        let image = self.upload_image(form.image).await?;

        let product = self
            .backend
            .insert_product(&NewProduct {
                slug: slugify(&title, self.slug_style),
                title,
                description: optional_text(form.description),
                image,
                price: form.price,
                rating_value: optional_text(form.rating_value),
                rating_unit: optional_text(form.rating_unit),
                category_id,
                model_id,
            })
            .await?;

        info!(id = product.id, slug = %product.slug, "Product added");
        Ok(product)
    }

    pub async fn edit_product(&self, id: i32, form: ProductForm) -> Result<Product, AdminError> {
        let (title, category_id, model_id) = self.validate_product_form(&form)?;
        self.ensure_linked(category_id, model_id).await?;

        let image = self.upload_image(form.image).await?;

        let product = self
            .backend
            .update_product(
                id,
                &ProductChanges {
                    slug: Some(slugify(&title, self.slug_style)),
                    title: Some(title),
                    description: edited_text(form.description),
                    image,
                    price: form.price,
                    rating_value: edited_text(form.rating_value),
                    rating_unit: edited_text(form.rating_unit),
                    category_id: Some(category_id),
                    model_id: Some(model_id),
                },
            )
            .await?;

        info!(id, "Product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: i32) -> Result<(), AdminError> {
        self.backend.delete_product(id).await?;
        info!(id, "Product deleted");
        Ok(())
    }
}

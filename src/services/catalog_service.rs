//! Storefront pages.

use crate::backend::{BackendError, CatalogBackend, Query};
use crate::config::ContactConfig;
use crate::models::{Category, Model, ModelGroup, Product};
use crate::services::admin::NO_PRODUCTS;
use crate::services::catalog_store::{CatalogStore, FetchError, MODELS_ERROR, PRODUCTS_ERROR};
use crate::services::contact::contact_link;
use crate::services::grouping::group_products_by_model;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryModelsPage {
    pub category: Category,
    pub models: Vec<Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryProductsPage {
    pub category: Category,
    pub groups: Vec<ModelGroup>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelProductsPage {
    pub category: Category,
    pub model: Model,
    pub products: Vec<Product>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub product: Product,
    pub category: Option<Category>,
    pub model: Option<Model>,
    pub contact_link: Option<String>,
}

pub struct CatalogService {
    backend: Arc<dyn CatalogBackend>,
    store: Arc<CatalogStore>,
    contact: ContactConfig,
}

fn products_failed(e: &BackendError) -> CatalogError {
    error!(error = %e, "Failed to fetch products");
    CatalogError::Fetch(FetchError(PRODUCTS_ERROR))
}

fn models_failed(e: &BackendError) -> CatalogError {
    error!(error = %e, "Failed to fetch models");
    CatalogError::Fetch(FetchError(MODELS_ERROR))
}

impl CatalogService {
    #[must_use]
    pub fn new(
        backend: Arc<dyn CatalogBackend>,
        store: Arc<CatalogStore>,
        contact: ContactConfig,
    ) -> Self {
        Self {
            backend,
            store,
            contact,
        }
    }

    /// Categories from the store, fetched on first use.
    pub async fn categories_page(&self) -> Result<Vec<Category>, CatalogError> {
        let cached = self.store.categories().await;
        if !cached.is_empty() {
            return Ok(cached);
        }
        Ok(self.store.fetch_categories().await?)
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Category, CatalogError> {
        if let Some(found) = self
            .store
            .categories()
            .await
            .into_iter()
            .find(|c| c.slug == slug)
        {
            return Ok(found);
        }

        self.store
            .fetch_categories()
            .await?
            .into_iter()
            .find(|c| c.slug == slug)
            .ok_or_else(|| CatalogError::NotFound(format!("category '{slug}'")))
    }

    pub async fn category_models_page(&self, slug: &str) -> Result<CategoryModelsPage, CatalogError> {
        let category = self.category_by_slug(slug).await?;
        let models = self.store.fetch_models_for_category(category.id).await?;
        Ok(CategoryModelsPage { category, models })
    }

    /// Products are grouped against the models they reference, so a product
    /// stays visible after its model is unlinked from the category.
    pub async fn category_products_page(
        &self,
        slug: &str,
    ) -> Result<CategoryProductsPage, CatalogError> {
        let category = self.category_by_slug(slug).await?;

        let products = self
            .backend
            .products(
                &Query::new()
                    .eq("category_id", category.id)
                    .order_by("id", true),
            )
            .await
            .map_err(|e| products_failed(&e))?;

        let models = self.referenced_models(&products).await?;
        let groups = group_products_by_model(category.id, &products, &models);
        let empty_message = groups.is_empty().then_some(NO_PRODUCTS);
        Ok(CategoryProductsPage {
            category,
            groups,
            empty_message,
        })
    }

    async fn referenced_models(&self, products: &[Product]) -> Result<Vec<Model>, CatalogError> {
        let mut model_ids: Vec<i32> = products.iter().map(|p| p.model_id).collect();
        model_ids.sort_unstable();
        model_ids.dedup();
        if model_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.backend
            .models(&Query::new().is_in("id", model_ids).order_by("id", true))
            .await
            .map_err(|e| models_failed(&e))
    }

    pub async fn model_products_page(
        &self,
        category_slug: &str,
        model_slug: &str,
    ) -> Result<ModelProductsPage, CatalogError> {
        let category = self.category_by_slug(category_slug).await?;
        let models = self.store.fetch_models_for_category(category.id).await?;
        let model = models
            .into_iter()
            .find(|m| m.slug == model_slug)
            .ok_or_else(|| CatalogError::NotFound(format!("model '{model_slug}'")))?;

        let products = self
            .backend
            .products(
                &Query::new()
                    .eq("category_id", category.id)
                    .eq("model_id", model.id)
                    .order_by("id", true),
            )
            .await
            .map_err(|e| products_failed(&e))?;

        let empty_message = products.is_empty().then_some(NO_PRODUCTS);
        Ok(ModelProductsPage {
            category,
            model,
            products,
            empty_message,
        })
    }

    pub async fn product_page(&self, slug: &str) -> Result<ProductPage, CatalogError> {
        let product = self
            .backend
            .products(&Query::new().eq("slug", slug).limit(1))
            .await
            .map_err(|e| products_failed(&e))?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound(format!("product '{slug}'")))?;

        let category_query = Query::new().eq("id", product.category_id);
        let model_query = Query::new().eq("id", product.model_id);
        let (categories, models) = tokio::try_join!(
            self.backend.categories(&category_query),
            self.backend.models(&model_query),
        )
        .map_err(|e| products_failed(&e))?;

        let contact_link = contact_link(&self.contact, &product.title);
        Ok(ProductPage {
            category: categories.into_iter().next(),
            model: models.into_iter().next(),
            contact_link,
            product,
        })
    }
}

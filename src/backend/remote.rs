use super::{BackendError, CatalogBackend, Query, single};
use crate::clients::rest::RestClient;
use crate::models::{
    Category, CategoryChanges, CategoryModel, Model, ModelChanges, NewCategory, NewModel,
    NewProduct, Product, ProductChanges,
};
use async_trait::async_trait;

const CATEGORIES: &str = "categories";
const MODELS: &str = "models";
const PRODUCTS: &str = "products";
const CATEGORY_MODELS: &str = "category_models";

/// [`CatalogBackend`] over the hosted data service's REST API.
pub struct RestBackend {
    rest: RestClient,
}

impl RestBackend {
    #[must_use]
    pub const fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    fn by_id(id: i32) -> Query {
        Query::new().eq("id", id)
    }
}

#[async_trait]
impl CatalogBackend for RestBackend {
    async fn categories(&self, query: &Query) -> Result<Vec<Category>, BackendError> {
        self.rest.select(CATEGORIES, query).await
    }

    async fn models(&self, query: &Query) -> Result<Vec<Model>, BackendError> {
        self.rest.select(MODELS, query).await
    }

    async fn products(&self, query: &Query) -> Result<Vec<Product>, BackendError> {
        self.rest.select(PRODUCTS, query).await
    }

    async fn category_models(&self, query: &Query) -> Result<Vec<CategoryModel>, BackendError> {
        self.rest.select(CATEGORY_MODELS, query).await
    }

    async fn insert_category(&self, row: &NewCategory) -> Result<Category, BackendError> {
        let rows = self.rest.insert(CATEGORIES, row).await?;
        single(rows, "inserted category")
    }

    async fn update_category(
        &self,
        id: i32,
        changes: &CategoryChanges,
    ) -> Result<Category, BackendError> {
        let rows = self.rest.update(CATEGORIES, &Self::by_id(id), changes).await?;
        single(rows, format!("category {id}"))
    }

    async fn delete_category(&self, id: i32) -> Result<(), BackendError> {
        let rows: Vec<Category> = self.rest.delete(CATEGORIES, &Self::by_id(id)).await?;
        single(rows, format!("category {id}")).map(|_| ())
    }

    async fn insert_model(&self, row: &NewModel) -> Result<Model, BackendError> {
        let rows = self.rest.insert(MODELS, row).await?;
        single(rows, "inserted model")
    }

    async fn update_model(&self, id: i32, changes: &ModelChanges) -> Result<Model, BackendError> {
        let rows = self.rest.update(MODELS, &Self::by_id(id), changes).await?;
        single(rows, format!("model {id}"))
    }

    async fn delete_model(&self, id: i32) -> Result<(), BackendError> {
        let rows: Vec<Model> = self.rest.delete(MODELS, &Self::by_id(id)).await?;
        single(rows, format!("model {id}")).map(|_| ())
    }

    async fn insert_product(&self, row: &NewProduct) -> Result<Product, BackendError> {
        let rows = self.rest.insert(PRODUCTS, row).await?;
        single(rows, "inserted product")
    }

    async fn update_product(
        &self,
        id: i32,
        changes: &ProductChanges,
    ) -> Result<Product, BackendError> {
        let rows = self.rest.update(PRODUCTS, &Self::by_id(id), changes).await?;
        single(rows, format!("product {id}"))
    }

    async fn delete_product(&self, id: i32) -> Result<(), BackendError> {
        let rows: Vec<Product> = self.rest.delete(PRODUCTS, &Self::by_id(id)).await?;
        single(rows, format!("product {id}")).map(|_| ())
    }

    async fn insert_category_model(&self, link: CategoryModel) -> Result<(), BackendError> {
        let _rows: Vec<CategoryModel> = self.rest.insert(CATEGORY_MODELS, &link).await?;
        Ok(())
    }

    async fn delete_category_models(&self, query: &Query) -> Result<u64, BackendError> {
        let rows: Vec<CategoryModel> = self.rest.delete(CATEGORY_MODELS, query).await?;
        Ok(rows.len() as u64)
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let _rows: Vec<Category> = self
            .rest
            .select(CATEGORIES, &Query::new().limit(1))
            .await?;
        Ok(())
    }
}

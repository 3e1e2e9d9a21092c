use crate::backend::{BackendError, Query};
use crate::entities::{prelude::*, products};
use crate::models::{NewProduct, Product, ProductChanges};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};
use tracing::info;

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            description: model.description,
            image: model.image,
            price: model.price,
            rating_value: model.rating_value,
            rating_unit: model.rating_unit,
            category_id: model.category_id,
            model_id: model.model_id,
        }
    }
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, query: &Query) -> Result<Vec<Product>, BackendError> {
        let rows = super::query::select::<Products, _>(&self.conn, query, "id").await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn insert(&self, row: &NewProduct) -> Result<Product, BackendError> {
        let active = products::ActiveModel {
            title: Set(row.title.clone()),
            slug: Set(row.slug.clone()),
            description: Set(row.description.clone()),
            image: Set(row.image.clone()),
            price: Set(row.price),
            rating_value: Set(row.rating_value.clone()),
            rating_unit: Set(row.rating_unit.clone()),
            category_id: Set(row.category_id),
            model_id: Set(row.model_id),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        info!(
            id = model.id,
            slug = %model.slug,
            category_id = model.category_id,
            model_id = model.model_id,
            "Inserted product"
        );
        Ok(model.into())
    }

    pub async fn update(&self, id: i32, changes: &ProductChanges) -> Result<Product, BackendError> {
        let model = Products::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| BackendError::NotFound(format!("product {id}")))?;

        let mut active = model.into_active_model();
        if let Some(title) = &changes.title {
            active.title = Set(title.clone());
        }
        if let Some(slug) = &changes.slug {
            active.slug = Set(slug.clone());
        }
        if let Some(description) = &changes.description {
            active.description = Set(description.clone());
        }
        if let Some(image) = &changes.image {
            active.image = Set(Some(image.clone()));
        }
        if let Some(price) = changes.price {
            active.price = Set(Some(price));
        }
        if let Some(value) = &changes.rating_value {
            active.rating_value = Set(value.clone());
        }
        if let Some(unit) = &changes.rating_unit {
            active.rating_unit = Set(unit.clone());
        }
        if let Some(category_id) = changes.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(model_id) = changes.model_id {
            active.model_id = Set(model_id);
        }

        let model = active.update(&self.conn).await?;
        Ok(model.into())
    }

    pub async fn delete(&self, id: i32) -> Result<(), BackendError> {
        let result = Products::delete_by_id(id).exec(&self.conn).await?;
        if result.rows_affected == 0 {
            return Err(BackendError::NotFound(format!("product {id}")));
        }
        info!(id, "Deleted product");
        Ok(())
    }
}

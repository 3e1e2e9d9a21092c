use crate::backend::{BackendError, Query};
use crate::entities::{categories, prelude::*};
use crate::models::{Category, CategoryChanges, NewCategory};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};
use tracing::info;

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            image: model.image,
        }
    }
}

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, query: &Query) -> Result<Vec<Category>, BackendError> {
        let rows = super::query::select::<Categories, _>(&self.conn, query, "id").await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn insert(&self, row: &NewCategory) -> Result<Category, BackendError> {
        let active = categories::ActiveModel {
            title: Set(row.title.clone()),
            slug: Set(row.slug.clone()),
            image: Set(row.image.clone()),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        info!(id = model.id, slug = %model.slug, "Inserted category");
        Ok(model.into())
    }

    pub async fn update(
        &self,
        id: i32,
        changes: &CategoryChanges,
    ) -> Result<Category, BackendError> {
        let model = Categories::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| BackendError::NotFound(format!("category {id}")))?;

        let mut active = model.into_active_model();
        if let Some(title) = &changes.title {
            active.title = Set(title.clone());
        }
        if let Some(slug) = &changes.slug {
            active.slug = Set(slug.clone());
        }
        if let Some(image) = &changes.image {
            active.image = Set(Some(image.clone()));
        }

        let model = active.update(&self.conn).await?;
        Ok(model.into())
    }

    pub async fn delete(&self, id: i32) -> Result<(), BackendError> {
        let result = Categories::delete_by_id(id).exec(&self.conn).await?;
        if result.rows_affected == 0 {
            return Err(BackendError::NotFound(format!("category {id}")));
        }
        info!(id, "Deleted category");
        Ok(())
    }
}

use crate::backend::{BackendError, Query};
use crate::entities::{models, prelude::*};
use crate::models::{Model, ModelChanges, NewModel};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};
use tracing::info;

impl From<models::Model> for Model {
    fn from(model: models::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            description: model.description,
            image: model.image,
            datasheet_url: model.datasheet_url,
            rating_value: model.rating_value,
            rating_unit: model.rating_unit,
        }
    }
}

pub struct ModelRepository {
    conn: DatabaseConnection,
}

impl ModelRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, query: &Query) -> Result<Vec<Model>, BackendError> {
        let rows = super::query::select::<Models, _>(&self.conn, query, "id").await?;
        Ok(rows.into_iter().map(Model::from).collect())
    }

    pub async fn insert(&self, row: &NewModel) -> Result<Model, BackendError> {
        let active = models::ActiveModel {
            title: Set(row.title.clone()),
            slug: Set(row.slug.clone()),
            description: Set(row.description.clone()),
            image: Set(row.image.clone()),
            datasheet_url: Set(row.datasheet_url.clone()),
            rating_value: Set(row.rating_value.clone()),
            rating_unit: Set(row.rating_unit.clone()),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        info!(id = model.id, slug = %model.slug, "Inserted model");
        Ok(model.into())
    }

    pub async fn update(&self, id: i32, changes: &ModelChanges) -> Result<Model, BackendError> {
        let model = Models::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| BackendError::NotFound(format!("model {id}")))?;

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
        if let Some(url) = &changes.datasheet_url {
            active.datasheet_url = Set(Some(url.clone()));
        }
        if let Some(value) = &changes.rating_value {
            active.rating_value = Set(value.clone());
        }
        if let Some(unit) = &changes.rating_unit {
            active.rating_unit = Set(unit.clone());
        }

        let model = active.update(&self.conn).await?;
        Ok(model.into())
    }

    pub async fn delete(&self, id: i32) -> Result<(), BackendError> {
        let result = Models::delete_by_id(id).exec(&self.conn).await?;
        if result.rows_affected == 0 {
            return Err(BackendError::NotFound(format!("model {id}")));
        }
        info!(id, "Deleted model");
        Ok(())
    }
}

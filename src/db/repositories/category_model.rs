use crate::backend::{BackendError, Query};
use crate::entities::{category_models, prelude::*};
use crate::models::CategoryModel;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, QueryFilter, Set};

impl From<category_models::Model> for CategoryModel {
    fn from(model: category_models::Model) -> Self {
        Self {
            category_id: model.category_id,
            model_id: model.model_id,
        }
    }
}

pub struct CategoryModelRepository {
    conn: DatabaseConnection,
}

impl CategoryModelRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, query: &Query) -> Result<Vec<CategoryModel>, BackendError> {
        let rows =
            super::query::select::<CategoryModels, _>(&self.conn, query, "category_id").await?;
        Ok(rows.into_iter().map(CategoryModel::from).collect())
    }

    /// Linking an already linked pair is a no-op.
    pub async fn insert(&self, link: CategoryModel) -> Result<(), BackendError> {
        let active = category_models::ActiveModel {
            category_id: Set(link.category_id),
            model_id: Set(link.model_id),
        };

        CategoryModels::insert(active)
            .on_conflict(
                OnConflict::columns([
                    category_models::Column::CategoryId,
                    category_models::Column::ModelId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn delete_matching(&self, query: &Query) -> Result<u64, BackendError> {
        if query.filters().is_empty() {
            return Err(BackendError::InvalidQuery(
                "refusing unfiltered delete on category_models".to_string(),
            ));
        }

        let cond = super::query::condition::<CategoryModels>(query.filters())?;
        let result = CategoryModels::delete_many()
            .filter(cond)
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}

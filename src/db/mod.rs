use crate::backend::{BackendError, CatalogBackend, Query};
use crate::config::AuthConfig;
use crate::models::{
    Category, CategoryChanges, CategoryModel, Model, ModelChanges, NewCategory, NewModel,
    NewProduct, Product, ProductChanges,
};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::user::User;

/// Local SQLite catalog database.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        // Every pooled connection must see the same in-memory database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    fn model_repo(&self) -> repositories::model::ModelRepository {
        repositories::model::ModelRepository::new(self.conn.clone())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn category_model_repo(&self) -> repositories::category_model::CategoryModelRepository {
        repositories::category_model::CategoryModelRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn create_user(&self, email: &str, password: &str, config: &AuthConfig) -> Result<User> {
        self.user_repo().create(email, password, config).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }
}

#[async_trait]
impl CatalogBackend for Store {
    async fn categories(&self, query: &Query) -> Result<Vec<Category>, BackendError> {
        self.category_repo().list(query).await
    }

    async fn models(&self, query: &Query) -> Result<Vec<Model>, BackendError> {
        self.model_repo().list(query).await
    }

    async fn products(&self, query: &Query) -> Result<Vec<Product>, BackendError> {
        self.product_repo().list(query).await
    }

    async fn category_models(&self, query: &Query) -> Result<Vec<CategoryModel>, BackendError> {
        self.category_model_repo().list(query).await
    }

    async fn insert_category(&self, row: &NewCategory) -> Result<Category, BackendError> {
        self.category_repo().insert(row).await
    }

    async fn update_category(
        &self,
        id: i32,
        changes: &CategoryChanges,
    ) -> Result<Category, BackendError> {
        self.category_repo().update(id, changes).await
    }

    async fn delete_category(&self, id: i32) -> Result<(), BackendError> {
        self.category_repo().delete(id).await
    }

    async fn insert_model(&self, row: &NewModel) -> Result<Model, BackendError> {
        self.model_repo().insert(row).await
    }

    async fn update_model(&self, id: i32, changes: &ModelChanges) -> Result<Model, BackendError> {
        self.model_repo().update(id, changes).await
    }

    async fn delete_model(&self, id: i32) -> Result<(), BackendError> {
        self.model_repo().delete(id).await
    }

    async fn insert_product(&self, row: &NewProduct) -> Result<Product, BackendError> {
        self.product_repo().insert(row).await
    }

    async fn update_product(
        &self,
        id: i32,
        changes: &ProductChanges,
    ) -> Result<Product, BackendError> {
        self.product_repo().update(id, changes).await
    }

    async fn delete_product(&self, id: i32) -> Result<(), BackendError> {
        self.product_repo().delete(id).await
    }

    async fn insert_category_model(&self, link: CategoryModel) -> Result<(), BackendError> {
        self.category_model_repo().insert(link).await
    }

    async fn delete_category_models(&self, query: &Query) -> Result<u64, BackendError> {
        self.category_model_repo().delete_matching(query).await
    }

    async fn ping(&self) -> Result<(), BackendError> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    fn new_category(title: &str, slug: &str) -> NewCategory {
        NewCategory {
            title: title.to_string(),
            slug: slug.to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn category_crud_round() {
        let store = memory_store().await;

        let created = store
            .insert_category(&new_category("Batteries", "batteries"))
            .await
            .unwrap();
        assert_eq!(created.slug, "batteries");

        let updated = store
            .update_category(
                created.id,
                &CategoryChanges {
                    title: Some("Car Batteries".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Car Batteries");
        assert_eq!(updated.slug, "batteries");

        store.delete_category(created.id).await.unwrap();
        let err = store.delete_category(created.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn search_style_filters_work_against_sqlite() {
        let store = memory_store().await;
        let category = store
            .insert_category(&new_category("Inverters", "inverters"))
            .await
            .unwrap();
        let model = store
            .insert_model(&NewModel {
                title: "Sine Pro".to_string(),
                slug: "sine-pro".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        for (title, unit) in [("Sine Pro 1000", "VA"), ("Sine Pro 2000", "W")] {
            store
                .insert_product(&NewProduct {
                    title: title.to_string(),
                    slug: title.to_lowercase(),
                    rating_unit: Some(unit.to_string()),
                    category_id: category.id,
                    model_id: model.id,
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let by_unit = store
            .products(&Query::new().ilike("rating_unit", "%va%"))
            .await
            .unwrap();
        assert_eq!(by_unit.len(), 1);
        assert_eq!(by_unit[0].title, "Sine Pro 1000");

        let any = store
            .products(&Query::new().or(vec![
                crate::backend::Filter::contains("title", "2000"),
                crate::backend::Filter::contains("rating_unit", "va"),
            ]))
            .await
            .unwrap();
        assert_eq!(any.len(), 2);

        let none = store
            .products(&Query::new().is_in("id", Vec::<i32>::new()))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn linking_twice_is_a_noop() {
        let store = memory_store().await;
        let category = store
            .insert_category(&new_category("UPS", "ups"))
            .await
            .unwrap();
        let model = store
            .insert_model(&NewModel {
                title: "Line Interactive".to_string(),
                slug: "line-interactive".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let link = CategoryModel {
            category_id: category.id,
            model_id: model.id,
        };
        store.insert_category_model(link).await.unwrap();
        store.insert_category_model(link).await.unwrap();

        let links = store
            .category_models(&Query::new().eq("category_id", category.id))
            .await
            .unwrap();
        assert_eq!(links, vec![link]);

        let removed = store
            .delete_category_models(&Query::new().eq("model_id", model.id))
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }
}

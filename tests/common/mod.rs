//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use voltshop::backend::{BackendError, CatalogBackend, Query};
use voltshop::config::{AuthConfig, Config};
use voltshop::db::Store;
use voltshop::models::{
    Category, CategoryChanges, CategoryModel, Model, ModelChanges, NewCategory, NewModel,
    NewProduct, Product, ProductChanges,
};
use voltshop::storage::{ObjectStorage, StorageError};

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.storage.local_path = std::env::temp_dir()
        .join(format!("voltshop-test-{}", uuid::Uuid::new_v4()))
        .display()
        .to_string();
    config.server.secure_cookies = false;
    config.contact.phone_number = "254700000000".to_string();
    config.auth = AuthConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        ..AuthConfig::default()
    };
    config
}

pub async fn memory_store() -> Store {
    Store::new("sqlite::memory:")
        .await
        .expect("failed to open in-memory store")
}

/// Wraps a [`Store`], counting calls per operation and failing the ones
/// that were switched off.
pub struct RecordingBackend {
    inner: Store,
    calls: Mutex<HashMap<&'static str, usize>>,
    pub fail_links: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl RecordingBackend {
    pub fn new(inner: Store) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
            fail_links: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, op: &'static str) {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
    }

    fn read_guard(&self) -> Result<(), BackendError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogBackend for RecordingBackend {
    async fn categories(&self, query: &Query) -> Result<Vec<Category>, BackendError> {
        self.record("categories");
        self.read_guard()?;
        self.inner.categories(query).await
    }

    async fn models(&self, query: &Query) -> Result<Vec<Model>, BackendError> {
        self.record("models");
        self.read_guard()?;
        self.inner.models(query).await
    }

    async fn products(&self, query: &Query) -> Result<Vec<Product>, BackendError> {
        self.record("products");
        self.read_guard()?;
        self.inner.products(query).await
    }

    async fn category_models(&self, query: &Query) -> Result<Vec<CategoryModel>, BackendError> {
        self.record("category_models");
        self.read_guard()?;
        self.inner.category_models(query).await
    }

    async fn insert_category(&self, row: &NewCategory) -> Result<Category, BackendError> {
        self.record("insert_category");
        self.inner.insert_category(row).await
    }

    async fn update_category(
        &self,
        id: i32,
        changes: &CategoryChanges,
    ) -> Result<Category, BackendError> {
        self.record("update_category");
        self.inner.update_category(id, changes).await
    }

    async fn delete_category(&self, id: i32) -> Result<(), BackendError> {
        self.record("delete_category");
        self.inner.delete_category(id).await
    }

    async fn insert_model(&self, row: &NewModel) -> Result<Model, BackendError> {
        self.record("insert_model");
        self.inner.insert_model(row).await
    }

    async fn update_model(&self, id: i32, changes: &ModelChanges) -> Result<Model, BackendError> {
        self.record("update_model");
        self.inner.update_model(id, changes).await
    }

    async fn delete_model(&self, id: i32) -> Result<(), BackendError> {
        self.record("delete_model");
        self.inner.delete_model(id).await
    }

    async fn insert_product(&self, row: &NewProduct) -> Result<Product, BackendError> {
        self.record("insert_product");
        self.inner.insert_product(row).await
    }

    async fn update_product(
        &self,
        id: i32,
        changes: &ProductChanges,
    ) -> Result<Product, BackendError> {
        self.record("update_product");
        self.inner.update_product(id, changes).await
    }

    async fn delete_product(&self, id: i32) -> Result<(), BackendError> {
        self.record("delete_product");
        self.inner.delete_product(id).await
    }

    async fn insert_category_model(&self, link: CategoryModel) -> Result<(), BackendError> {
        self.record("insert_category_model");
        if self.fail_links.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 409,
                message: "link rejected".to_string(),
            });
        }
        self.inner.insert_category_model(link).await
    }

    async fn delete_category_models(&self, query: &Query) -> Result<u64, BackendError> {
        self.record("delete_category_models");
        self.inner.delete_category_models(query).await
    }

    async fn ping(&self) -> Result<(), BackendError> {
        self.inner.ping().await
    }
}

/// Object storage that rejects every upload.
pub struct FailingStorage;

#[async_trait]
impl ObjectStorage for FailingStorage {
    async fn upload(
        &self,
        _bucket: &str,
        _path: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        Err(StorageError::Status {
            status: 500,
            message: "bucket unavailable".to_string(),
        })
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://storage.invalid/{bucket}/{path}")
    }
}

/// Minimal `multipart/form-data` body.
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: format!("voltshop-{}", uuid::Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (self.content_type(), self.body)
    }
}

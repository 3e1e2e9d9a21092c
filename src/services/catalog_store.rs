//! Process-wide catalog cache.
//!
//! Holds the category list, the models fetched per category, the latest
//! search results, a loading flag and one shared error message. Fetches
//! always go to the backend; the lock is released before every backend call
//! so concurrent fetches race and the last response wins.

use crate::backend::{BackendError, CatalogBackend, Query};
use crate::models::{Category, Model};
use crate::services::search::{self, SearchResults};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

pub const CATEGORIES_ERROR: &str = "Failed to fetch categories. Please try again later.";
pub const MODELS_ERROR: &str = "Failed to fetch models. Please try again later.";
pub const PRODUCTS_ERROR: &str = "Failed to fetch products. Please try again later.";
pub const SEARCH_ERROR: &str = "Failed to fetch search results. Please try again later.";

/// User-facing fetch failure. The cause is logged, not carried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FetchError(pub &'static str);

#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogState {
    pub categories: Vec<Category>,
    pub models_by_category: HashMap<i32, Vec<Model>>,
    pub search_results: Option<SearchResults>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct CatalogStore {
    backend: Arc<dyn CatalogBackend>,
    search_min_chars: usize,
    state: RwLock<CatalogState>,
}

impl CatalogStore {
    #[must_use]
    pub fn new(backend: Arc<dyn CatalogBackend>, search_min_chars: usize) -> Self {
        Self {
            backend,
            search_min_chars,
            state: RwLock::new(CatalogState::default()),
        }
    }

    pub async fn snapshot(&self) -> CatalogState {
        self.state.read().await.clone()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.state.read().await.categories.clone()
    }

    pub async fn cached_models(&self, category_id: i32) -> Option<Vec<Model>> {
        self.state
            .read()
            .await
            .models_by_category
            .get(&category_id)
            .cloned()
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn fail(&self, what: &'static str, message: &'static str, cause: &BackendError) -> FetchError {
        error!(error = %cause, "Catalog fetch of {} failed", what);
        metrics::counter!("catalog_fetch_total", "kind" => what, "outcome" => "error").increment(1);

        let mut state = self.state.write().await;
        state.loading = false;
        state.error = Some(message.to_string());
        FetchError(message)
    }

    async fn finish(&self, what: &'static str, apply: impl FnOnce(&mut CatalogState)) {
        metrics::counter!("catalog_fetch_total", "kind" => what, "outcome" => "ok").increment(1);
        let mut state = self.state.write().await;
        apply(&mut state);
        state.loading = false;
    }

    /// Replaces the category list with every category, ordered by id.
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, FetchError> {
        self.begin().await;

        let query = Query::new().order_by("id", true);
        match self.backend.categories(&query).await {
            Ok(categories) => {
                info!(count = categories.len(), "Fetched categories");
                let result = categories.clone();
                self.finish("categories", |s| s.categories = categories)
                    .await;
                Ok(result)
            }
            Err(e) => Err(self.fail("categories", CATEGORIES_ERROR, &e).await),
        }
    }

    /// Fetches the models linked to `category_id` and caches them under it.
    pub async fn fetch_models_for_category(&self, category_id: i32) -> Result<Vec<Model>, FetchError> {
        self.begin().await;

        let models = match self.load_models(category_id).await {
            Ok(models) => models,
            Err(e) => return Err(self.fail("models", MODELS_ERROR, &e).await),
        };

        debug!(category_id, count = models.len(), "Fetched models for category");
        let result = models.clone();
        self.finish("models", |s| {
            s.models_by_category.insert(category_id, models);
        })
        .await;
        Ok(result)
    }

    async fn load_models(&self, category_id: i32) -> Result<Vec<Model>, BackendError> {
        let links = self
            .backend
            .category_models(&Query::new().eq("category_id", category_id))
            .await?;

        if links.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = links.iter().map(|l| l.model_id).collect();
        self.backend
            .models(&Query::new().is_in("id", ids).order_by("id", true))
            .await
    }

    /// Runs the four search queries concurrently.
    ///
    /// Queries shorter than the configured minimum clear the results and
    /// return `Ok(None)` without touching the backend. One failing query
    /// discards all results.
    pub async fn fetch_search_results(&self, raw: &str) -> Result<Option<SearchResults>, FetchError> {
        let Some(query) = search::searchable(raw, self.search_min_chars) else {
            self.state.write().await.search_results = None;
            return Ok(None);
        };

        self.begin().await;
        let plan = search::plan(query);

        let outcome = tokio::try_join!(
            self.backend.categories(&plan.categories),
            self.backend.models(&plan.models),
            self.backend.products(&plan.products),
            self.backend.products(&plan.products_by_rating),
        );

        match outcome {
            Ok((categories, models, products, products_by_rating)) => {
                let results = SearchResults {
                    categories,
                    models,
                    products,
                    products_by_rating,
                };
                info!(query, empty = results.is_empty(), "Search completed");
                let returned = results.clone();
                self.finish("search", |s| s.search_results = Some(results))
                    .await;
                Ok(Some(returned))
            }
            Err(e) => {
                self.state.write().await.search_results = None;
                Err(self.fail("search", SEARCH_ERROR, &e).await)
            }
        }
    }

    /// Inserts or replaces a category in the local list, keeping id order.
    pub async fn upsert_category(&self, category: Category) {
        let mut state = self.state.write().await;
        match state.categories.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => *existing = category,
            None => {
                let at = state
                    .categories
                    .partition_point(|c| c.id < category.id);
                state.categories.insert(at, category);
            }
        }
    }

    /// Drops a category and its cached models without re-fetching.
    pub async fn remove_category(&self, category_id: i32) {
        let mut state = self.state.write().await;
        state.categories.retain(|c| c.id != category_id);
        state.models_by_category.remove(&category_id);
    }

    /// Drops a model from every cached per-category list.
    pub async fn remove_model(&self, model_id: i32) {
        let mut state = self.state.write().await;
        for models in state.models_by_category.values_mut() {
            models.retain(|m| m.id != model_id);
        }
    }

    /// Forgets cached models for the given categories so the next page load re-fetches.
    pub async fn invalidate_models(&self, category_ids: &[i32]) {
        let mut state = self.state.write().await;
        for id in category_ids {
            state.models_by_category.remove(id);
        }
    }
}

mod common;

use common::{RecordingBackend, memory_store};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use voltshop::backend::CatalogBackend;
use voltshop::models::{Category, CategoryModel, NewCategory, NewModel, NewProduct};
use voltshop::services::CatalogStore;
use voltshop::services::catalog_store::{CATEGORIES_ERROR, MODELS_ERROR, SEARCH_ERROR};

async fn seeded() -> (Arc<RecordingBackend>, Category, Category) {
    let backend = Arc::new(RecordingBackend::new(memory_store().await));

    let batteries = backend
        .insert_category(&NewCategory {
            title: "Batteries".to_string(),
            slug: "batteries".to_string(),
            image: None,
        })
        .await
        .unwrap();
    let cables = backend
        .insert_category(&NewCategory {
            title: "Cables".to_string(),
            slug: "cables".to_string(),
            image: None,
        })
        .await
        .unwrap();

    let gel = backend
        .insert_model(&NewModel {
            title: "Gel 12V".to_string(),
            slug: "gel-12v".to_string(),
            rating_value: Some("100".to_string()),
            rating_unit: Some("Ah".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    backend
        .insert_category_model(CategoryModel {
            category_id: batteries.id,
            model_id: gel.id,
        })
        .await
        .unwrap();
    backend
        .insert_product(&NewProduct {
            title: "Gel 12V 100Ah".to_string(),
            slug: "gel-12v-100ah".to_string(),
            rating_value: Some("100".to_string()),
            rating_unit: Some("Ah".to_string()),
            category_id: batteries.id,
            model_id: gel.id,
            ..Default::default()
        })
        .await
        .unwrap();

    backend.reset();
    (backend, batteries, cables)
}

#[tokio::test]
async fn unlinked_category_has_no_models_and_skips_model_query() {
    let (backend, _batteries, cables) = seeded().await;
    let store = CatalogStore::new(backend.clone(), 3);

    let categories = store.fetch_categories().await.unwrap();
    assert_eq!(categories.len(), 2);

    let models = store.fetch_models_for_category(cables.id).await.unwrap();
    assert!(models.is_empty());
    assert_eq!(backend.calls("category_models"), 1);
    assert_eq!(backend.calls("models"), 0);

    let state = store.snapshot().await;
    assert_eq!(state.models_by_category.get(&cables.id), Some(&Vec::new()));
    assert!(state.error.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn models_are_cached_per_category_and_refetched_on_demand() {
    let (backend, batteries, _cables) = seeded().await;
    let store = CatalogStore::new(backend.clone(), 3);

    let models = store.fetch_models_for_category(batteries.id).await.unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].slug, "gel-12v");
    assert_eq!(store.cached_models(batteries.id).await, Some(models));

    store.fetch_models_for_category(batteries.id).await.unwrap();
    assert_eq!(backend.calls("category_models"), 2);
    assert_eq!(backend.calls("models"), 2);
}

#[tokio::test]
async fn search_needs_three_characters() {
    let (backend, _batteries, _cables) = seeded().await;
    let store = CatalogStore::new(backend.clone(), 3);

    let none = store.fetch_search_results("ge").await.unwrap();
    assert!(none.is_none());
    assert_eq!(backend.calls("categories"), 0);
    assert_eq!(backend.calls("products"), 0);

    let results = store.fetch_search_results("gel").await.unwrap().unwrap();
    assert_eq!(backend.calls("categories"), 1);
    assert_eq!(backend.calls("models"), 1);
    assert_eq!(backend.calls("products"), 2);
    assert_eq!(results.models.len(), 1);
    assert_eq!(results.products.len(), 1);
    assert_eq!(results.products_by_rating.len(), 1);
    assert!(results.categories.is_empty());

    assert!(store.snapshot().await.search_results.is_some());
    store.fetch_search_results("  a ").await.unwrap();
    assert!(store.snapshot().await.search_results.is_none());
}

#[tokio::test]
async fn search_matches_rating_terms() {
    let (backend, _batteries, _cables) = seeded().await;
    let store = CatalogStore::new(backend, 3);

    let results = store.fetch_search_results("100 ah").await.unwrap().unwrap();
    assert!(results.products.is_empty());
    assert_eq!(results.products_by_rating.len(), 1);
    assert_eq!(results.products_by_rating[0].slug, "gel-12v-100ah");
}

#[tokio::test]
async fn failures_set_the_shared_error() {
    let (backend, batteries, _cables) = seeded().await;
    let store = CatalogStore::new(backend.clone(), 3);
    store.fetch_categories().await.unwrap();
    store.fetch_search_results("gel").await.unwrap();

    backend.fail_reads.store(true, Ordering::SeqCst);

    let err = store.fetch_categories().await.unwrap_err();
    assert_eq!(err.to_string(), CATEGORIES_ERROR);
    let state = store.snapshot().await;
    assert_eq!(state.error.as_deref(), Some(CATEGORIES_ERROR));
    assert!(!state.loading);
    assert_eq!(state.categories.len(), 2, "previous list is kept");

    let err = store.fetch_models_for_category(batteries.id).await.unwrap_err();
    assert_eq!(err.to_string(), MODELS_ERROR);

    let err = store.fetch_search_results("gel").await.unwrap_err();
    assert_eq!(err.to_string(), SEARCH_ERROR);
    assert!(store.snapshot().await.search_results.is_none());

    backend.fail_reads.store(false, Ordering::SeqCst);
    store.fetch_categories().await.unwrap();
    assert!(store.snapshot().await.error.is_none());
}

#[tokio::test]
async fn local_mutations_do_not_refetch() {
    let (backend, batteries, cables) = seeded().await;
    let store = CatalogStore::new(backend.clone(), 3);
    store.fetch_categories().await.unwrap();
    let models = store.fetch_models_for_category(batteries.id).await.unwrap();
    backend.reset();

    store.remove_category(cables.id).await;
    let remaining: Vec<i32> = store.categories().await.iter().map(|c| c.id).collect();
    assert_eq!(remaining, vec![batteries.id]);

    store.remove_model(models[0].id).await;
    assert_eq!(store.cached_models(batteries.id).await, Some(Vec::new()));

    store
        .upsert_category(Category {
            id: batteries.id,
            title: "Deep Cycle Batteries".to_string(),
            slug: "deep-cycle batteries".to_string(),
            image: None,
        })
        .await;
    assert_eq!(store.categories().await[0].title, "Deep Cycle Batteries");

    assert_eq!(backend.calls("categories"), 0);
    assert_eq!(backend.calls("models"), 0);
}

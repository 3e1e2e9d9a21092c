use crate::models::{Model, ModelGroup, Product};
use std::collections::HashSet;

/// Products of `category_id`, grouped under their models.
///
/// Group order follows `models`; only models with at least one product in
/// the category appear. Products keep their input order inside a group.
#[must_use]
pub fn group_products_by_model(
    category_id: i32,
    products: &[Product],
    models: &[Model],
) -> Vec<ModelGroup> {
    let in_category: Vec<&Product> = products
        .iter()
        .filter(|p| p.category_id == category_id)
        .collect();

    let mut seen = HashSet::new();
    let model_ids: Vec<i32> = in_category
        .iter()
        .map(|p| p.model_id)
        .filter(|id| seen.insert(*id))
        .collect();

    models
        .iter()
        .filter(|m| model_ids.contains(&m.id))
        .map(|model| ModelGroup {
            model: model.clone(),
            products: in_category
                .iter()
                .filter(|p| p.model_id == model.id)
                .map(|p| (*p).clone())
                .collect(),
        })
        .collect()
}

/// Groups every product regardless of category, one block per category in
/// order of first appearance.
#[must_use]
pub fn group_all_by_model(products: &[Product], models: &[Model]) -> Vec<(i32, Vec<ModelGroup>)> {
    let mut seen = HashSet::new();
    products
        .iter()
        .map(|p| p.category_id)
        .filter(|id| seen.insert(*id))
        .collect::<Vec<_>>()
        .into_iter()
        .map(|category_id| (category_id, group_products_by_model(category_id, products, models)))
        .collect()
}

//! Search query preparation.
//!
//! A search runs four independent table queries. No ranking and no
//! de-duplication: a product matching both by title and by rating appears in
//! both result lists.

use crate::backend::{Filter, Query};
use crate::models::{Category, Model, Product};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub categories: Vec<Category>,
    pub models: Vec<Model>,
    pub products: Vec<Product>,
    /// Products where any term matched title, rating unit or rating value.
    pub products_by_rating: Vec<Product>,
}

impl SearchResults {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.models.is_empty()
            && self.products.is_empty()
            && self.products_by_rating.is_empty()
    }
}

/// The four queries for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub categories: Query,
    pub models: Query,
    pub products: Query,
    pub products_by_rating: Query,
}

/// Trimmed query text if it is long enough to search.
#[must_use]
pub fn searchable(raw: &str, min_chars: usize) -> Option<&str> {
    let trimmed = raw.trim();
    (trimmed.chars().count() >= min_chars).then_some(trimmed)
}

/// Whitespace separated terms with the characters that would break an
/// `or=(...)` list removed.
#[must_use]
pub fn terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.chars().filter(|c| !matches!(c, ',' | '(' | ')')).collect::<String>())
        .filter(|t| !t.is_empty())
        .collect()
}

#[must_use]
pub fn plan(query: &str) -> SearchPlan {
    let rating_filters: Vec<Filter> = terms(query)
        .iter()
        .flat_map(|term| {
            [
                Filter::contains("title", term),
                Filter::contains("rating_unit", term),
                Filter::contains("rating_value", term),
            ]
        })
        .collect();

    let products_by_rating = if rating_filters.is_empty() {
        Query::new().or(vec![Filter::contains("title", query)])
    } else {
        Query::new().or(rating_filters)
    };

    SearchPlan {
        categories: Query::new().ilike("title", format!("%{query}%")),
        models: Query::new().ilike("title", format!("%{query}%")),
        products: Query::new().ilike("title", format!("%{query}%")),
        products_by_rating,
    }
}

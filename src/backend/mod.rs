//! Table access for the catalog data service.
//!
//! Every page and the catalog store talk to the data service through
//! [`CatalogBackend`]. A [`Query`] carries the filter predicates the data
//! service understands (`eq`, `in`, `ilike`, `or`) plus optional ordering
//! and a row limit; each implementation translates it to its own wire or SQL
//! form.

pub mod remote;

use crate::models::{
    Category, CategoryChanges, CategoryModel, Model, ModelChanges, NewCategory, NewModel,
    NewProduct, Product, ProductChanges,
};
use std::fmt;
use thiserror::Error;

pub use remote::RestBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("data service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl From<sea_orm::DbErr> for BackendError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl BackendError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<FilterValue> for sea_orm::Value {
    fn from(v: FilterValue) -> Self {
        match v {
            FilterValue::Int(i) => i.into(),
            FilterValue::Text(s) => s.into(),
        }
    }
}

/// A single predicate. Column names are the table's column names.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(&'static str, FilterValue),
    In(&'static str, Vec<FilterValue>),
    /// Case-insensitive pattern match; `%` is the wildcard.
    ILike(&'static str, String),
    Or(Vec<Filter>),
}

impl Filter {
    /// `column ILIKE %needle%`
    #[must_use]
    pub fn contains(column: &'static str, needle: &str) -> Self {
        Self::ILike(column, format!("%{needle}%"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub ascending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Filter>,
    order: Option<OrderBy>,
    limit: Option<u64>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, column: &'static str, value: impl Into<FilterValue>) -> Self {
        self.filters.push(Filter::Eq(column, value.into()));
        self
    }

    #[must_use]
    pub fn is_in<V, I>(mut self, column: &'static str, values: I) -> Self
    where
        V: Into<FilterValue>,
        I: IntoIterator<Item = V>,
    {
        self.filters.push(Filter::In(
            column,
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    #[must_use]
    pub fn ilike(mut self, column: &'static str, pattern: impl Into<String>) -> Self {
        self.filters.push(Filter::ILike(column, pattern.into()));
        self
    }

    #[must_use]
    pub fn or(mut self, any_of: Vec<Filter>) -> Self {
        self.filters.push(Filter::Or(any_of));
        self
    }

    #[must_use]
    pub const fn order_by(mut self, column: &'static str, ascending: bool) -> Self {
        self.order = Some(OrderBy { column, ascending });
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub const fn order(&self) -> Option<&OrderBy> {
        self.order.as_ref()
    }

    #[must_use]
    pub const fn row_limit(&self) -> Option<u64> {
        self.limit
    }
}

/// Row-level access to the four catalog tables.
#[async_trait::async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn categories(&self, query: &Query) -> Result<Vec<Category>, BackendError>;

    async fn models(&self, query: &Query) -> Result<Vec<Model>, BackendError>;

    async fn products(&self, query: &Query) -> Result<Vec<Product>, BackendError>;

    async fn category_models(&self, query: &Query) -> Result<Vec<CategoryModel>, BackendError>;

    async fn insert_category(&self, row: &NewCategory) -> Result<Category, BackendError>;

    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] when no row has `id`.
    async fn update_category(
        &self,
        id: i32,
        changes: &CategoryChanges,
    ) -> Result<Category, BackendError>;

    async fn delete_category(&self, id: i32) -> Result<(), BackendError>;

    async fn insert_model(&self, row: &NewModel) -> Result<Model, BackendError>;

    async fn update_model(&self, id: i32, changes: &ModelChanges) -> Result<Model, BackendError>;

    async fn delete_model(&self, id: i32) -> Result<(), BackendError>;

    async fn insert_product(&self, row: &NewProduct) -> Result<Product, BackendError>;

    async fn update_product(
        &self,
        id: i32,
        changes: &ProductChanges,
    ) -> Result<Product, BackendError>;

    async fn delete_product(&self, id: i32) -> Result<(), BackendError>;

    async fn insert_category_model(&self, link: CategoryModel) -> Result<(), BackendError>;

    /// Deletes every join row matching `query` and returns how many went.
    async fn delete_category_models(&self, query: &Query) -> Result<u64, BackendError>;

    async fn ping(&self) -> Result<(), BackendError>;
}

/// First row of a single-row fetch, or [`BackendError::NotFound`].
pub fn single<T>(rows: Vec<T>, what: impl Into<String>) -> Result<T, BackendError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(what.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_builder_collects_filters_in_order() {
        let query = Query::new()
            .eq("category_id", 4)
            .is_in("id", [1, 2, 3])
            .ilike("title", "%gel%")
            .order_by("title", true)
            .limit(10);

        assert_eq!(query.filters().len(), 3);
        assert_eq!(query.filters()[0], Filter::Eq("category_id", FilterValue::Int(4)));
        assert_eq!(
            query.filters()[1],
            Filter::In(
                "id",
                vec![FilterValue::Int(1), FilterValue::Int(2), FilterValue::Int(3)]
            )
        );
        assert_eq!(query.order().map(|o| o.column), Some("title"));
        assert_eq!(query.row_limit(), Some(10));
    }

    #[test]
    fn contains_wraps_needle_in_wildcards() {
        assert_eq!(
            Filter::contains("title", "agm"),
            Filter::ILike("title", "%agm%".to_string())
        );
    }

    #[test]
    fn single_reports_missing_rows() {
        let rows: Vec<i32> = Vec::new();
        let err = single(rows, "category lead-acid").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "category lead-acid not found");

        assert_eq!(single(vec![7, 8], "x").unwrap(), 7);
    }
}

pub mod admin;
pub use admin::{AdminError, AdminService, CategoryForm, ModelForm, ProductForm, Upload};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, AuthSession, AuthUser, SignUpResult};
pub use auth_service_impl::LocalAuthService;

pub mod catalog_service;
pub use catalog_service::{CatalogError, CatalogService};

pub mod catalog_store;
pub use catalog_store::{CatalogState, CatalogStore, FetchError};

pub mod contact;
pub mod grouping;
pub use grouping::group_products_by_model;

pub mod search;
pub use search::SearchResults;

pub mod slug;
pub use slug::slugify;

//! HTTP clients for the hosted data service.

pub mod auth;
pub mod rest;
pub mod storage;

pub use auth::RemoteAuthService;
pub use rest::RestClient;
pub use storage::RemoteStorage;

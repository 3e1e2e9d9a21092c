use std::sync::Arc;
use std::time::Duration;

use crate::backend::{CatalogBackend, RestBackend};
use crate::clients::{RemoteAuthService, RemoteStorage, RestClient};
use crate::config::{BackendKind, Config};
use crate::db::Store;
use crate::services::{AdminService, AuthService, CatalogService, CatalogStore, LocalAuthService};
use crate::storage::{LocalStorage, ObjectStorage};
use tracing::info;

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused by the REST, storage and auth clients so they share one pool.
/// Local access tokens live as long as the session cookie.
fn session_lifetime(config: &Config) -> Duration {
    let minutes = u64::try_from(config.server.session_minutes.max(1)).unwrap_or(1);
    Duration::from_secs(minutes * 60)
}

fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("voltshop/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub backend: Arc<dyn CatalogBackend>,

    pub storage: Arc<dyn ObjectStorage>,

    pub auth: Arc<dyn AuthService>,

    pub catalog_store: Arc<CatalogStore>,

    pub catalog: Arc<CatalogService>,

    pub admin: Arc<AdminService>,

    /// Present for the sqlite backend only.
    pub store: Option<Store>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (backend, storage, auth, store): (
            Arc<dyn CatalogBackend>,
            Arc<dyn ObjectStorage>,
            Arc<dyn AuthService>,
            Option<Store>,
        ) = match config.backend.kind {
            BackendKind::Sqlite => {
                let store = Store::with_pool_options(
                    &config.general.database_path,
                    config.general.max_db_connections,
                    config.general.min_db_connections,
                )
                .await?;

                info!(path = %config.storage.local_path, "Using local catalog database and storage");
                (
                    Arc::new(store.clone()) as Arc<dyn CatalogBackend>,
                    Arc::new(LocalStorage::new(
                        &config.storage.local_path,
                        &config.storage.public_base_url,
                    )) as Arc<dyn ObjectStorage>,
                    Arc::new(LocalAuthService::new(
                        store.clone(),
                        config.auth.clone(),
                        session_lifetime(&config),
                    )) as Arc<dyn AuthService>,
                    Some(store),
                )
            }
            BackendKind::Remote => {
                let http_client = build_shared_http_client(config.backend.request_timeout_seconds)?;
                let url = &config.backend.url;
                let key = &config.backend.api_key;

                info!(%url, "Using hosted data service");
                (
                    Arc::new(RestBackend::new(RestClient::with_shared_client(
                        http_client.clone(),
                        url,
                        key,
                    ))) as Arc<dyn CatalogBackend>,
                    Arc::new(RemoteStorage::new(http_client.clone(), url, key))
                        as Arc<dyn ObjectStorage>,
                    Arc::new(RemoteAuthService::new(
                        http_client,
                        url,
                        key,
                        config.auth.min_password_length,
                    )) as Arc<dyn AuthService>,
                    None,
                )
            }
        };

        Ok(Self::with_parts(config, backend, storage, auth, store))
    }

    /// Wires the services over already-built backend, storage and auth.
    #[must_use]
    pub fn with_parts(
        config: Config,
        backend: Arc<dyn CatalogBackend>,
        storage: Arc<dyn ObjectStorage>,
        auth: Arc<dyn AuthService>,
        store: Option<Store>,
    ) -> Self {
        let catalog_store = Arc::new(CatalogStore::new(
            backend.clone(),
            config.catalog.search_min_chars,
        ));
        let catalog = Arc::new(CatalogService::new(
            backend.clone(),
            catalog_store.clone(),
            config.contact.clone(),
        ));
        let admin = Arc::new(AdminService::new(
            backend.clone(),
            storage.clone(),
            catalog_store.clone(),
            &config,
        ));

        Self {
            config: Arc::new(config),
            backend,
            storage,
            auth,
            catalog_store,
            catalog,
            admin,
            store,
        }
    }
}

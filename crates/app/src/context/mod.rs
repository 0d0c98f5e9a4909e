//! Application context - dependency injection container

use std::path::Path;
use std::sync::Arc;

use faxgate_core::{FaxService, PollCheckpointStore};
use faxgate_domain::{FaxConfig, FaxError, Result};
use faxgate_infra::database::{DbManager, SqlCipherFaxJobRepository, SqlCipherSettingsRepository};
use faxgate_infra::http::HttpClient;
use faxgate_infra::integrations::sinch::SinchFaxClient;
use faxgate_infra::storage::LocalFaxFileStore;
use faxgate_infra::KeyManager;

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: FaxConfig,
    pub db: Arc<DbManager>,
    pub checkpoints: Arc<dyn PollCheckpointStore>,
    pub fax_service: Arc<FaxService>,
}

impl AppContext {
    /// Create a new application context from a resolved configuration
    pub async fn new(config: FaxConfig) -> Result<Self> {
        // Resolve the encryption key with a test-friendly fallback chain:
        // 1. FAXGATE_TEST_DB_KEY (for tests, doesn't touch the keyring)
        // 2. FAXGATE_DB_KEY (headless/container override)
        // 3. KeyManager (default, uses the OS keyring)
        let encryption_key = match std::env::var("FAXGATE_TEST_DB_KEY") {
            Ok(value) => {
                tracing::debug!("using FAXGATE_TEST_DB_KEY for database encryption");
                value
            }
            Err(_) => match std::env::var("FAXGATE_DB_KEY") {
                Ok(value) => {
                    tracing::info!("using FAXGATE_DB_KEY for database encryption");
                    value
                }
                Err(_) => {
                    tracing::info!("fetching encryption key from the system keyring");
                    KeyManager::get_or_create_key().map_err(|e| {
                        tracing::error!(error = %e, "failed to retrieve encryption key");
                        e
                    })?
                }
            },
        };

        // The default database path lives under the platform data dir, which
        // may not exist on a fresh install.
        if let Some(parent) = Path::new(&config.database_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FaxError::Database(format!(
                    "failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let db = Arc::new(DbManager::new(
            &config.database_path,
            config.database_pool_size,
            Some(encryption_key.as_str()),
        )?);
        db.run_migrations()?;

        let jobs = Arc::new(SqlCipherFaxJobRepository::new(Arc::clone(db.pool())));
        let checkpoints: Arc<dyn PollCheckpointStore> =
            Arc::new(SqlCipherSettingsRepository::new(Arc::clone(db.pool())));
        let files = Arc::new(LocalFaxFileStore::new(config.file_storage_path.clone()));

        let http = HttpClient::new()?;
        if !config.is_configured() {
            tracing::warn!(
                "provider credentials are not configured; provider calls will fail until they are"
            );
        }
        let provider = Arc::new(SinchFaxClient::new(&config, http));

        let fax_service = Arc::new(FaxService::new(
            provider,
            jobs,
            files,
            Arc::clone(&checkpoints),
            &config,
        ));

        Ok(Self { config, db, checkpoints, fax_service })
    }

    /// Check health of the gateway components
    ///
    /// The database check runs a real query. The provider check only
    /// verifies credentials are present; no network call is made.
    pub async fn health_check(&self) -> HealthStatus {
        let mut status = HealthStatus::new();

        status = status.add_component(self.check_database_health().await);

        if self.config.is_configured() {
            status = status.add_component(ComponentHealth::healthy("provider"));
        } else {
            status = status
                .add_component(ComponentHealth::unhealthy("provider", "credentials not configured"));
        }

        status = status.add_component(self.check_storage_health());

        status.calculate_score();
        status
    }

    /// Check database health by running a simple query off the async runtime.
    async fn check_database_health(&self) -> ComponentHealth {
        let db = Arc::clone(&self.db);
        match tokio::task::spawn_blocking(move || db.health_check()).await {
            Ok(Ok(())) => ComponentHealth::healthy("database"),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "database health check failed");
                ComponentHealth::unhealthy("database", format!("query failed: {e}"))
            }
            Err(e) => {
                tracing::error!(error = %e, "database health check task panicked");
                ComponentHealth::unhealthy("database", format!("task panic: {e}"))
            }
        }
    }

    fn check_storage_health(&self) -> ComponentHealth {
        match std::fs::create_dir_all(&self.config.file_storage_path) {
            Ok(()) => ComponentHealth::healthy("document_store"),
            Err(e) => {
                ComponentHealth::unhealthy("document_store", format!("root not writable: {e}"))
            }
        }
    }
}

//! Module assembly and lifecycle

use crate::api::native::NativeClient;
use crate::api::rest::routes;
use crate::config::Config;
use crate::contract::LedgerApi;
use crate::domain::Services;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::repositories::SeaOrmAuditLogRepository;
use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

/// Enrollment ledger module: services, migrations and REST routes over one
/// database connection
pub struct EnrollmentLedgerModule {
    db: Arc<DatabaseConnection>,
    services: Arc<Services>,
}

impl EnrollmentLedgerModule {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let db = Arc::new(db);
        let audit_repo = Arc::new(SeaOrmAuditLogRepository::new(db.clone()));
        let services = Arc::new(Services::new(db.clone(), audit_repo, config));

        tracing::info!("Enrollment ledger initialized");
        Self { db, services }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        Migrator::up(&*self.db, None)
            .await
            .context("enrollment ledger migrations failed")?;
        tracing::info!("Enrollment ledger migrations completed");
        Ok(())
    }

    /// REST routes of the module
    pub fn router(&self) -> axum::Router {
        tracing::info!("Registering enrollment ledger REST routes");
        routes::register_routes(axum::Router::new(), self.services.clone())
    }

    /// In-process client
    pub fn client(&self) -> Arc<dyn LedgerApi> {
        Arc::new(NativeClient::new(self.services.clone()))
    }

    pub fn services(&self) -> Arc<Services> {
        self.services.clone()
    }

    /// Wait for in-flight audit writes
    pub async fn shutdown(&self) {
        let pending = self.services.audit.pending();
        if pending > 0 {
            tracing::info!(pending, "draining audit writes");
        }
        self.services.audit.flush().await;
        tracing::info!("Enrollment ledger stopped");
    }
}

//! Domain layer - business logic and services

pub mod attendance;
pub mod audit;
pub mod catalog;
pub mod enrollment;
pub mod repository;

pub use attendance::AttendanceService;
pub use audit::AuditRecorder;
pub use catalog::CatalogService;
pub use enrollment::EnrollmentService;
pub use repository::AuditLogRepository;

use crate::config::Config;
use crate::contract::LedgerError;
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use std::sync::Arc;

/// Every service of the ledger, sharing one connection pool
pub struct Services {
    pub catalog: CatalogService,
    pub enrollments: EnrollmentService,
    pub attendance: AttendanceService,
    pub audit: AuditRecorder,
    pub config: Config,
}

impl Services {
    pub fn new(
        db: Arc<DatabaseConnection>,
        audit_repo: Arc<dyn AuditLogRepository>,
        config: Config,
    ) -> Self {
        Self {
            catalog: CatalogService::new(db.clone()),
            enrollments: EnrollmentService::new(db.clone()),
            attendance: AttendanceService::new(db),
            audit: AuditRecorder::new(audit_repo, &config),
            config,
        }
    }
}

/// Map a store error to the ledger taxonomy.
///
/// Unique-constraint violations are business conflicts; everything else is
/// logged here and surfaces as `Internal`.
pub(crate) fn store_err(operation: &'static str) -> impl Fn(DbErr) -> LedgerError {
    move |err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(operation, %detail, "unique constraint violated");
            LedgerError::conflict(format!("{operation}: duplicate entry"))
        }
        _ => {
            tracing::error!(operation, error = %err, "store failure");
            LedgerError::Internal
        }
    }
}

/// Map a row decoding error to `Internal`
pub(crate) fn decode_err(operation: &'static str) -> impl Fn(anyhow::Error) -> LedgerError {
    move |err| {
        tracing::error!(operation, error = ?err, "malformed row");
        LedgerError::Internal
    }
}

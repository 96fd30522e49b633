//! Repository traits for data access
//!
//! The audit trail is reached through a trait so the recorder can be
//! exercised against failing or in-memory stores.
//! Implementations are in infra/storage/repositories.rs

use crate::contract::{AuditLogEntry, AuditLogFilter, AuditStats, NewAuditLog};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Append-only repository for audit log rows
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Append a row
    async fn insert(&self, entry: &NewAuditLog) -> Result<AuditLogEntry>;

    /// Find a row by id
    async fn find_by_id(&self, id: i64) -> Result<Option<AuditLogEntry>>;

    /// Rows matching `filter`, newest first
    async fn list(&self, filter: &AuditLogFilter, limit: u64, offset: u64)
        -> Result<Vec<AuditLogEntry>>;

    /// Number of rows matching `filter`
    async fn count(&self, filter: &AuditLogFilter) -> Result<u64>;

    /// Aggregate counts inside an optional time window
    async fn stats(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<AuditStats>;
}

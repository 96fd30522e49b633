//! Audit trail recorder
//!
//! Appends immutable rows describing mutating actions. Writes are best
//! effort: a failing audit store is reported on the operational log and
//! never fails the business operation being audited.

use super::repository::AuditLogRepository;
use crate::config::Config;
use crate::contract::{AuditLogEntry, AuditLogFilter, AuditStats, LedgerError, NewAuditLog, Page};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::task::TaskTracker;

#[derive(Clone)]
pub struct AuditRecorder {
    repo: Arc<dyn AuditLogRepository>,
    /// In-flight detached writes
    tasks: TaskTracker,
    enabled: bool,
    default_page_size: u64,
    max_page_size: u64,
}

impl AuditRecorder {
    pub fn new(repo: Arc<dyn AuditLogRepository>, config: &Config) -> Self {
        Self {
            repo,
            tasks: TaskTracker::new(),
            enabled: config.audit_enabled,
            default_page_size: config.default_page_size.max(1),
            max_page_size: config.max_page_size.max(1),
        }
    }

    // ===== Write path =====

    /// Persist one entry, swallowing any error
    pub async fn create_log(&self, entry: NewAuditLog) {
        if !self.enabled {
            return;
        }

        match self.repo.insert(&entry).await {
            Ok(saved) => tracing::debug!(
                audit_id = saved.id,
                action = %saved.action,
                entity_type = %saved.entity_type,
                "audit entry recorded"
            ),
            Err(e) => tracing::error!(
                error = ?e,
                action = %entry.action,
                entity_type = %entry.entity_type,
                entity_id = ?entry.entity_id,
                "Failed to save audit entry"
            ),
        }
    }

    /// Fire-and-forget variant of [`create_log`](Self::create_log)
    pub fn record(&self, entry: NewAuditLog) {
        if !self.enabled {
            return;
        }
        let this = self.clone();
        self.tasks.spawn(async move { this.create_log(entry).await });
    }

    /// Wait for every write spawned by [`record`](Self::record) so far
    pub async fn flush(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    // ===== Query surface =====

    /// Filtered listing, newest first. `page` is 1-based.
    pub async fn list(
        &self,
        filter: AuditLogFilter,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<Page<AuditLogEntry>, LedgerError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            check_window(from, to)?;
        }

        let page = page.unwrap_or(1).max(1);
        let page_size = page_size
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);
        let offset = (page - 1).saturating_mul(page_size);

        let total = self.repo.count(&filter).await.map_err(query_err)?;
        let items = self
            .repo
            .list(&filter, page_size, offset)
            .await
            .map_err(query_err)?;

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    pub async fn get(&self, id: i64) -> Result<AuditLogEntry, LedgerError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(query_err)?
            .ok_or_else(|| LedgerError::not_found("audit log", id))
    }

    pub async fn by_actor(
        &self,
        actor_id: i32,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<Page<AuditLogEntry>, LedgerError> {
        let filter = AuditLogFilter {
            actor_id: Some(actor_id),
            ..AuditLogFilter::default()
        };
        self.list(filter, page, page_size).await
    }

    pub async fn by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<Page<AuditLogEntry>, LedgerError> {
        let filter = AuditLogFilter {
            entity_type: Some(entity_type.to_string()),
            entity_id: Some(entity_id.to_string()),
            ..AuditLogFilter::default()
        };
        self.list(filter, page, page_size).await
    }

    pub async fn stats(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<AuditStats, LedgerError> {
        if let (Some(from), Some(to)) = (from, to) {
            check_window(from, to)?;
        }
        self.repo.stats(from, to).await.map_err(query_err)
    }
}

fn check_window(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(), LedgerError> {
    if from > to {
        return Err(LedgerError::validation(format!(
            "date range start {from} is after its end {to}"
        )));
    }
    Ok(())
}

fn query_err(err: anyhow::Error) -> LedgerError {
    tracing::error!(error = ?err, "audit query failed");
    LedgerError::Internal
}

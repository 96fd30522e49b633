//! SeaORM repository implementations

use crate::contract::{AuditAction, AuditLogEntry, AuditLogFilter, AuditStats, NewAuditLog};
use crate::domain::repository::AuditLogRepository;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    prelude::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use std::sync::Arc;

use super::entity::audit_log;
use super::mapper::try_collect;

// ===== Audit Log Repository =====

pub struct SeaOrmAuditLogRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmAuditLogRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn filtered(filter: &AuditLogFilter) -> Select<audit_log::Entity> {
    let mut query = audit_log::Entity::find();

    if let Some(actor_id) = filter.actor_id {
        query = query.filter(audit_log::Column::ActorId.eq(actor_id));
    }
    if let Some(action) = filter.action {
        query = query.filter(audit_log::Column::Action.eq(action.as_str()));
    }
    if let Some(entity_type) = &filter.entity_type {
        query = query.filter(audit_log::Column::EntityType.eq(entity_type.as_str()));
    }
    if let Some(entity_id) = &filter.entity_id {
        query = query.filter(audit_log::Column::EntityId.eq(entity_id.as_str()));
    }

    windowed(query, filter.from, filter.to)
}

fn windowed(
    mut query: Select<audit_log::Entity>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Select<audit_log::Entity> {
    if let Some(from) = from {
        query = query.filter(audit_log::Column::CreatedAt.gte(from));
    }
    if let Some(to) = to {
        query = query.filter(audit_log::Column::CreatedAt.lte(to));
    }
    query
}

#[async_trait]
impl AuditLogRepository for SeaOrmAuditLogRepository {
    async fn insert(&self, entry: &NewAuditLog) -> Result<AuditLogEntry> {
        let active: audit_log::ActiveModel = entry.into();
        let row = active.insert(&*self.db).await?;
        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<AuditLogEntry>> {
        let result = audit_log::Entity::find_by_id(id).one(&*self.db).await?;

        match result {
            Some(row) => Ok(Some(row.try_into()?)),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        filter: &AuditLogFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<AuditLogEntry>> {
        let rows = filtered(filter)
            .order_by_desc(audit_log::Column::CreatedAt)
            .order_by_desc(audit_log::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;

        try_collect(rows)
    }

    async fn count(&self, filter: &AuditLogFilter) -> Result<u64> {
        Ok(filtered(filter).count(&*self.db).await?)
    }

    async fn stats(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<AuditStats> {
        let by_action: Vec<(String, i64)> = windowed(audit_log::Entity::find(), from, to)
            .select_only()
            .column(audit_log::Column::Action)
            .column_as(Expr::col(audit_log::Column::Id).count(), "count")
            .group_by(audit_log::Column::Action)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let by_entity_type: Vec<(String, i64)> = windowed(audit_log::Entity::find(), from, to)
            .select_only()
            .column(audit_log::Column::EntityType)
            .column_as(Expr::col(audit_log::Column::Id).count(), "count")
            .group_by(audit_log::Column::EntityType)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let actors: Vec<Option<i32>> = windowed(audit_log::Entity::find(), from, to)
            .select_only()
            .column(audit_log::Column::ActorId)
            .filter(audit_log::Column::ActorId.is_not_null())
            .distinct()
            .into_tuple()
            .all(&*self.db)
            .await?;

        let mut stats = AuditStats::default();
        for (action, count) in by_action {
            let action: AuditAction = action.parse()?;
            let count = u64::try_from(count)?;
            stats.total += count;
            stats.by_action.insert(action, count);
        }
        for (entity_type, count) in by_entity_type {
            stats.by_entity_type.insert(entity_type, u64::try_from(count)?);
        }
        stats.distinct_actors = actors.len() as u64;

        Ok(stats)
    }
}

//! Attendance service
//!
//! One record per (student, class, day), only for students on the class
//! roster. The unique index on the table is the final arbiter when two
//! writers race on the same day.

use super::{decode_err, store_err};
use crate::contract::{
    AttendanceEntry, AttendanceRecord, AttendanceReport, AttendanceStatus, EnrollmentStatus,
    LedgerError,
};
use crate::infra::storage::entity::{attendance_record, class};
use crate::infra::storage::ledger;
use crate::infra::storage::mapper::try_collect;
use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, TransactionTrait,
};
use std::collections::HashSet;
use std::sync::Arc;

pub struct AttendanceService {
    db: Arc<DatabaseConnection>,
}

impl AttendanceService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record one student's attendance for one day
    pub async fn record_one(
        &self,
        student_id: i32,
        class_id: i32,
        date: NaiveDate,
        status: AttendanceStatus,
        notes: Option<String>,
    ) -> Result<AttendanceRecord, LedgerError> {
        let op = "record attendance";
        let class = load_class(&*self.db, class_id, op).await?;
        ensure_class_runs_on(&class, date)?;

        let row = record_checked(&*self.db, student_id, class_id, date, status, notes).await?;

        tracing::debug!(student_id, class_id, %date, %status, "attendance recorded");
        AttendanceRecord::try_from(row).map_err(decode_err(op))
    }

    /// Record a whole class-day. Either every entry is stored or none is.
    pub async fn record_bulk(
        &self,
        class_id: i32,
        date: NaiveDate,
        entries: Vec<AttendanceEntry>,
    ) -> Result<Vec<AttendanceRecord>, LedgerError> {
        let op = "record bulk attendance";
        if entries.is_empty() {
            return Err(LedgerError::validation("bulk attendance needs at least one entry"));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        if let Some(dup) = entries.iter().find(|e| !seen.insert(e.student_id)) {
            return Err(LedgerError::conflict(format!(
                "student {} appears more than once in the batch",
                dup.student_id
            )));
        }

        let txn = self.db.begin().await.map_err(store_err(op))?;
        // Claiming the class first serialises concurrent batches for it
        let class = ledger::find_class(&txn, class_id, true)
            .await
            .map_err(store_err(op))?
            .ok_or_else(|| LedgerError::not_found("class", class_id))?;
        ensure_class_runs_on(&class, date)?;

        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            // Any error drops `txn`, rolling back the rows inserted so far
            let row = record_checked(
                &txn,
                entry.student_id,
                class_id,
                date,
                entry.status,
                entry.notes,
            )
            .await?;
            rows.push(row);
        }
        txn.commit().await.map_err(store_err(op))?;

        tracing::info!(class_id, %date, count = rows.len(), "bulk attendance recorded");
        try_collect(rows).map_err(decode_err(op))
    }

    /// Change the status (and optionally notes) of an existing record
    pub async fn update(
        &self,
        id: i32,
        status: AttendanceStatus,
        notes: Option<String>,
    ) -> Result<AttendanceRecord, LedgerError> {
        let op = "update attendance";
        let row = attendance_record::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(store_err(op))?
            .ok_or_else(|| LedgerError::not_found("attendance record", id))?;

        let mut active: attendance_record::ActiveModel = row.into();
        active.status = Set(status.as_str().to_string());
        if notes.is_some() {
            active.notes = Set(notes);
        }
        active.updated_at = Set(Utc::now());
        let row = active.update(&*self.db).await.map_err(store_err(op))?;

        AttendanceRecord::try_from(row).map_err(decode_err(op))
    }

    pub async fn get(&self, id: i32) -> Result<AttendanceRecord, LedgerError> {
        let op = "get attendance";
        attendance_record::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(store_err(op))?
            .ok_or_else(|| LedgerError::not_found("attendance record", id))
            .and_then(|row| AttendanceRecord::try_from(row).map_err(decode_err(op)))
    }

    pub async fn list_for_class(
        &self,
        class_id: i32,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, LedgerError> {
        let op = "list attendance";
        load_class(&*self.db, class_id, op).await?;

        let rows = ledger::list_attendance(&*self.db, class_id, date)
            .await
            .map_err(store_err(op))?;
        try_collect(rows).map_err(decode_err(op))
    }

    /// Explicit operator removal of a record
    pub async fn delete(&self, id: i32) -> Result<(), LedgerError> {
        let result = attendance_record::Entity::delete_by_id(id)
            .exec(&*self.db)
            .await
            .map_err(store_err("delete attendance"))?;

        if result.rows_affected == 0 {
            return Err(LedgerError::not_found("attendance record", id));
        }
        tracing::info!(attendance_id = id, "attendance record deleted");
        Ok(())
    }

    /// Present/absent/justified totals for a class-day against the roster size
    pub async fn class_report(
        &self,
        class_id: i32,
        date: NaiveDate,
    ) -> Result<AttendanceReport, LedgerError> {
        let op = "attendance report";
        load_class(&*self.db, class_id, op).await?;

        let counts = ledger::count_attendance_by_status(&*self.db, class_id, date)
            .await
            .map_err(store_err(op))?;
        let total_students = ledger::count_active_enrollments(&*self.db, class_id)
            .await
            .map_err(store_err(op))?;

        let mut report = AttendanceReport {
            total_students,
            ..AttendanceReport::default()
        };
        for (status, count) in counts {
            let status = status
                .parse::<AttendanceStatus>()
                .map_err(|e| decode_err(op)(e.into()))?;
            let count = u64::try_from(count).unwrap_or_default();
            match status {
                AttendanceStatus::Present => report.present = count,
                AttendanceStatus::Absent => report.absent = count,
                AttendanceStatus::Justified => report.justified = count,
            }
        }
        Ok(report)
    }
}

async fn load_class<C: ConnectionTrait>(
    conn: &C,
    class_id: i32,
    op: &'static str,
) -> Result<class::Model, LedgerError> {
    ledger::find_class(conn, class_id, false)
        .await
        .map_err(store_err(op))?
        .ok_or_else(|| LedgerError::not_found("class", class_id))
}

fn ensure_class_runs_on(class: &class::Model, date: NaiveDate) -> Result<(), LedgerError> {
    if class.start_date <= date && date <= class.end_date {
        Ok(())
    } else {
        Err(LedgerError::validation(format!(
            "{date} is outside class {} ({} to {})",
            class.id, class.start_date, class.end_date
        )))
    }
}

/// Roster and uniqueness checks followed by the insert
async fn record_checked<C: ConnectionTrait>(
    conn: &C,
    student_id: i32,
    class_id: i32,
    date: NaiveDate,
    status: AttendanceStatus,
    notes: Option<String>,
) -> Result<attendance_record::Model, LedgerError> {
    let op = "record attendance";

    if !ledger::student_exists(conn, student_id)
        .await
        .map_err(store_err(op))?
    {
        return Err(LedgerError::not_found("student", student_id));
    }

    let on_roster = ledger::find_enrollment(conn, student_id, class_id)
        .await
        .map_err(store_err(op))?
        .is_some_and(|e| e.status == EnrollmentStatus::Active.as_str());
    if !on_roster {
        return Err(LedgerError::validation(format!(
            "student {student_id} has no active enrollment in class {class_id}"
        )));
    }

    if ledger::find_attendance_for_day(conn, student_id, class_id, date)
        .await
        .map_err(store_err(op))?
        .is_some()
    {
        return Err(duplicate_day(student_id, class_id, date));
    }

    insert_record(conn, student_id, class_id, date, status, notes).await
}

fn duplicate_day(student_id: i32, class_id: i32, date: NaiveDate) -> LedgerError {
    LedgerError::conflict(format!(
        "attendance for student {student_id} in class {class_id} on {date} already exists"
    ))
}

/// Insert; a writer that lost the race on the unique index gets a conflict
async fn insert_record<C: ConnectionTrait>(
    conn: &C,
    student_id: i32,
    class_id: i32,
    date: NaiveDate,
    status: AttendanceStatus,
    notes: Option<String>,
) -> Result<attendance_record::Model, LedgerError> {
    ledger::insert_attendance(conn, student_id, class_id, date, status, notes)
        .await
        .map_err(|err| match store_err("record attendance")(err) {
            LedgerError::Conflict { .. } => duplicate_day(student_id, class_id, date),
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::contract::{NewClass, NewStudent, Shift};
    use crate::domain::Services;
    use crate::infra::storage::migrations::Migrator;
    use crate::infra::storage::repositories::SeaOrmAuditLogRepository;
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;

    async fn services() -> (Arc<DatabaseConnection>, Services) {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Arc::new(Database::connect(options).await.unwrap());
        Migrator::up(&*db, None).await.unwrap();
        let repo = Arc::new(SeaOrmAuditLogRepository::new(db.clone()));
        (db.clone(), Services::new(db, repo, Config::default()))
    }

    #[tokio::test]
    async fn unique_index_rejects_second_insert_as_conflict() {
        let (db, services) = services().await;
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let class = services
            .catalog
            .create_class(NewClass {
                name: "Welding A".to_string(),
                shift: Shift::Morning,
                start_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
                capacity: 2,
            })
            .await
            .unwrap();
        let student = services
            .catalog
            .create_student(NewStudent {
                first_name: "Ana".to_string(),
                last_name: "Lima".to_string(),
                email: "ana@example.org".to_string(),
                phone: None,
            })
            .await
            .unwrap();
        services.enrollments.create(student.id, class.id, None).await.unwrap();

        // Skips the pre-check, as a racing writer would
        insert_record(&*db, student.id, class.id, day, AttendanceStatus::Present, None)
            .await
            .unwrap();
        let err = insert_record(&*db, student.id, class.id, day, AttendanceStatus::Absent, None)
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Conflict { .. }));
    }
}

//! Enrollment service - the seat ledger
//!
//! This is the only writer of `classes.seats_available`. Every mutation runs
//! in one transaction whose first statement locks the class row, so after
//! each commit
//!
//! ```text
//! seats_available + |active enrollments| == capacity
//! ```
//!
//! holds for every class. A dropped transaction rolls back; a half-applied
//! seat adjustment can never be committed.

use super::{decode_err, store_err};
use crate::contract::{Enrollment, EnrollmentStatus, LedgerError, SeatLedger};
use crate::infra::storage::entity::enrollment;
use crate::infra::storage::ledger;
use crate::infra::storage::mapper::try_collect;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::sync::Arc;

pub struct EnrollmentService {
    db: Arc<DatabaseConnection>,
}

impl EnrollmentService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn begin(&self, operation: &'static str) -> Result<DatabaseTransaction, LedgerError> {
        self.db.begin().await.map_err(store_err(operation))
    }

    /// Enroll a student, consuming one seat.
    ///
    /// `status` may only request `Active`; new rows never start cancelled.
    pub async fn create(
        &self,
        student_id: i32,
        class_id: i32,
        status: Option<EnrollmentStatus>,
    ) -> Result<Enrollment, LedgerError> {
        if let Some(status) = status.filter(|s| *s != EnrollmentStatus::Active) {
            return Err(LedgerError::validation(format!(
                "new enrollments start active, '{status}' was requested"
            )));
        }

        let txn = self.begin("create enrollment").await?;
        let row = enroll_in(&txn, student_id, class_id).await?;
        txn.commit().await.map_err(store_err("create enrollment"))?;

        tracing::debug!(student_id, class_id, "enrollment created");
        Enrollment::try_from(row).map_err(decode_err("create enrollment"))
    }

    /// Cancel an active enrollment, returning its seat.
    pub async fn cancel(&self, student_id: i32, class_id: i32) -> Result<Enrollment, LedgerError> {
        let txn = self.begin("cancel enrollment").await?;
        let row = withdraw_from(&txn, student_id, class_id).await?;
        txn.commit().await.map_err(store_err("cancel enrollment"))?;

        tracing::debug!(student_id, class_id, "enrollment cancelled");
        Enrollment::try_from(row).map_err(decode_err("cancel enrollment"))
    }

    /// Hard delete. The seat comes back only if the row was still active.
    pub async fn delete(&self, student_id: i32, class_id: i32) -> Result<(), LedgerError> {
        let op = "delete enrollment";
        let txn = self.begin(op).await?;

        ledger::find_class(&txn, class_id, true)
            .await
            .map_err(store_err(op))?;
        let row = ledger::find_enrollment(&txn, student_id, class_id)
            .await
            .map_err(store_err(op))?
            .ok_or_else(|| enrollment_not_found(student_id, class_id))?;
        let was_active = row.status == EnrollmentStatus::Active.as_str();

        ledger::delete_enrollment(&txn, student_id, class_id)
            .await
            .map_err(store_err(op))?;
        if was_active {
            give_back_seat(&txn, class_id, op).await?;
        }
        txn.commit().await.map_err(store_err(op))?;

        tracing::debug!(student_id, class_id, was_active, "enrollment deleted");
        Ok(())
    }

    /// Move an active enrollment to another class in one transaction.
    ///
    /// The source row is cancelled (its seat returned) and a new active row
    /// is created in the target class.
    pub async fn transfer(
        &self,
        student_id: i32,
        from_class_id: i32,
        to_class_id: i32,
    ) -> Result<Enrollment, LedgerError> {
        if from_class_id == to_class_id {
            return Err(LedgerError::validation(
                "transfer source and target class are the same",
            ));
        }

        let op = "transfer enrollment";
        let txn = self.begin(op).await?;

        // Lock both class rows in id order so two opposite transfers cannot deadlock
        let (low, high) = if from_class_id < to_class_id {
            (from_class_id, to_class_id)
        } else {
            (to_class_id, from_class_id)
        };
        for class_id in [low, high] {
            ledger::find_class(&txn, class_id, true)
                .await
                .map_err(store_err(op))?
                .ok_or_else(|| LedgerError::not_found("class", class_id))?;
        }

        withdraw_from(&txn, student_id, from_class_id).await?;
        let row = enroll_in(&txn, student_id, to_class_id).await?;
        txn.commit().await.map_err(store_err(op))?;

        tracing::info!(student_id, from_class_id, to_class_id, "enrollment transferred");
        Enrollment::try_from(row).map_err(decode_err(op))
    }

    pub async fn get(&self, student_id: i32, class_id: i32) -> Result<Enrollment, LedgerError> {
        let row = ledger::find_enrollment(&*self.db, student_id, class_id)
            .await
            .map_err(store_err("get enrollment"))?
            .ok_or_else(|| enrollment_not_found(student_id, class_id))?;

        Enrollment::try_from(row).map_err(decode_err("get enrollment"))
    }

    /// Enrollments of a class; `Some(Active)` yields the roster
    pub async fn list_by_class(
        &self,
        class_id: i32,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<Enrollment>, LedgerError> {
        let op = "list class enrollments";
        ledger::find_class(&*self.db, class_id, false)
            .await
            .map_err(store_err(op))?
            .ok_or_else(|| LedgerError::not_found("class", class_id))?;

        let rows = ledger::list_enrollments(&*self.db, None, Some(class_id), status)
            .await
            .map_err(store_err(op))?;
        try_collect(rows).map_err(decode_err(op))
    }

    pub async fn list_by_student(&self, student_id: i32) -> Result<Vec<Enrollment>, LedgerError> {
        let op = "list student enrollments";
        if !ledger::student_exists(&*self.db, student_id)
            .await
            .map_err(store_err(op))?
        {
            return Err(LedgerError::not_found("student", student_id));
        }

        let rows = ledger::list_enrollments(&*self.db, Some(student_id), None, None)
            .await
            .map_err(store_err(op))?;
        try_collect(rows).map_err(decode_err(op))
    }

    /// Read the seat counter and the roster size in one consistent snapshot
    pub async fn seat_ledger(&self, class_id: i32) -> Result<SeatLedger, LedgerError> {
        let op = "read seat ledger";
        let txn = self.begin(op).await?;

        let class = ledger::find_class(&txn, class_id, false)
            .await
            .map_err(store_err(op))?
            .ok_or_else(|| LedgerError::not_found("class", class_id))?;
        let active_enrollments = ledger::count_active_enrollments(&txn, class_id)
            .await
            .map_err(store_err(op))?;
        txn.commit().await.map_err(store_err(op))?;

        let snapshot = SeatLedger {
            class_id,
            capacity: class.capacity,
            seats_available: class.seats_available,
            active_enrollments,
        };
        if !snapshot.is_balanced() {
            tracing::error!(?snapshot, "seat ledger out of balance");
        }
        Ok(snapshot)
    }
}

fn enrollment_not_found(student_id: i32, class_id: i32) -> LedgerError {
    LedgerError::not_found("enrollment", format!("{student_id}/{class_id}"))
}

/// Insert an active row and take a seat, inside `txn`.
async fn enroll_in(
    txn: &DatabaseTransaction,
    student_id: i32,
    class_id: i32,
) -> Result<enrollment::Model, LedgerError> {
    let op = "create enrollment";

    // Lock first; a value read before the lock may be stale
    let class = ledger::find_class(txn, class_id, true)
        .await
        .map_err(store_err(op))?
        .ok_or_else(|| LedgerError::not_found("class", class_id))?;

    if !ledger::student_exists(txn, student_id)
        .await
        .map_err(store_err(op))?
    {
        return Err(LedgerError::not_found("student", student_id));
    }

    if let Some(existing) = ledger::find_enrollment(txn, student_id, class_id)
        .await
        .map_err(store_err(op))?
    {
        return Err(LedgerError::conflict(format!(
            "student {student_id} already has a {} enrollment in class {class_id}",
            existing.status
        )));
    }

    if class.seats_available <= 0 {
        tracing::warn!(student_id, class_id, "enrollment rejected, class is full");
        return Err(LedgerError::CapacityExceeded { class_id });
    }

    let row = ledger::insert_active_enrollment(txn, student_id, class_id)
        .await
        .map_err(|err| match store_err(op)(err) {
            LedgerError::Conflict { .. } => LedgerError::conflict(format!(
                "student {student_id} is already enrolled in class {class_id}"
            )),
            other => other,
        })?;

    if !ledger::take_seat(txn, class_id).await.map_err(store_err(op))? {
        return Err(LedgerError::CapacityExceeded { class_id });
    }

    Ok(row)
}

/// Cancel an active row and return its seat, inside `txn`.
async fn withdraw_from(
    txn: &DatabaseTransaction,
    student_id: i32,
    class_id: i32,
) -> Result<enrollment::Model, LedgerError> {
    let op = "cancel enrollment";

    ledger::find_class(txn, class_id, true)
        .await
        .map_err(store_err(op))?;
    let row = ledger::find_enrollment(txn, student_id, class_id)
        .await
        .map_err(store_err(op))?
        .ok_or_else(|| enrollment_not_found(student_id, class_id))?;

    if row.status != EnrollmentStatus::Active.as_str() {
        return Err(LedgerError::invalid_state(format!(
            "enrollment {student_id}/{class_id} is already {}",
            row.status
        )));
    }

    let row = ledger::mark_enrollment_cancelled(txn, row)
        .await
        .map_err(store_err(op))?;
    give_back_seat(txn, class_id, op).await?;

    Ok(row)
}

async fn give_back_seat(
    txn: &DatabaseTransaction,
    class_id: i32,
    op: &'static str,
) -> Result<(), LedgerError> {
    if ledger::release_seat(txn, class_id)
        .await
        .map_err(store_err(op))?
    {
        Ok(())
    } else {
        // Counter already at capacity while an active row existed
        tracing::error!(class_id, "seat release would exceed capacity");
        Err(LedgerError::Internal)
    }
}

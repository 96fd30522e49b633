//! Row-level ledger operations
//!
//! Every function takes the connection it runs on, so the domain services
//! can compose them inside a single `DatabaseTransaction`. None of them
//! commits on its own.

use super::entity::{attendance_record, class, enrollment, student};
use crate::contract::{AttendanceStatus, EnrollmentStatus};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    prelude::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use sea_orm::ActiveValue::{NotSet, Set};

// ===== Classes =====

/// Read a class row, taking a row lock when `for_update` is set.
///
/// The lock is `SELECT ... FOR UPDATE` on backends that support it. SQLite
/// has no row locks and a deferred transaction that reads first can only
/// upgrade to a writer by failing with `SQLITE_BUSY`, so there the class row
/// is touched with a no-op update instead. Callers claim the class before
/// any other statement of the transaction.
pub async fn find_class<C: ConnectionTrait>(
    conn: &C,
    class_id: i32,
    for_update: bool,
) -> Result<Option<class::Model>, DbErr> {
    let mut query = class::Entity::find_by_id(class_id);
    if for_update {
        if conn.get_database_backend() == DbBackend::Sqlite {
            claim_write_lock(conn, class_id).await?;
        } else {
            query = query.lock_exclusive();
        }
    }
    query.one(conn).await
}

/// SQLite: take the database write lock by writing the class row unchanged
async fn claim_write_lock<C: ConnectionTrait>(conn: &C, class_id: i32) -> Result<(), DbErr> {
    class::Entity::update_many()
        .col_expr(
            class::Column::SeatsAvailable,
            Expr::col(class::Column::SeatsAvailable).into(),
        )
        .filter(class::Column::Id.eq(class_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Take one seat. Returns `false` when the class had none left.
pub async fn take_seat<C: ConnectionTrait>(conn: &C, class_id: i32) -> Result<bool, DbErr> {
    let result = class::Entity::update_many()
        .col_expr(
            class::Column::SeatsAvailable,
            Expr::col(class::Column::SeatsAvailable).sub(1),
        )
        .col_expr(class::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(class::Column::Id.eq(class_id))
        .filter(class::Column::SeatsAvailable.gt(0))
        .exec(conn)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Return one seat. Capped at capacity so a seat can never be minted.
pub async fn release_seat<C: ConnectionTrait>(conn: &C, class_id: i32) -> Result<bool, DbErr> {
    let result = class::Entity::update_many()
        .col_expr(
            class::Column::SeatsAvailable,
            Expr::col(class::Column::SeatsAvailable).add(1),
        )
        .col_expr(class::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(class::Column::Id.eq(class_id))
        .filter(
            Expr::col(class::Column::SeatsAvailable).lt(Expr::col(class::Column::Capacity)),
        )
        .exec(conn)
        .await?;

    Ok(result.rows_affected == 1)
}

// ===== Students =====

pub async fn student_exists<C: ConnectionTrait>(conn: &C, student_id: i32) -> Result<bool, DbErr> {
    let count = student::Entity::find_by_id(student_id).count(conn).await?;
    Ok(count > 0)
}

// ===== Enrollments =====

pub async fn find_enrollment<C: ConnectionTrait>(
    conn: &C,
    student_id: i32,
    class_id: i32,
) -> Result<Option<enrollment::Model>, DbErr> {
    enrollment::Entity::find_by_id((student_id, class_id))
        .one(conn)
        .await
}

pub async fn insert_active_enrollment<C: ConnectionTrait>(
    conn: &C,
    student_id: i32,
    class_id: i32,
) -> Result<enrollment::Model, DbErr> {
    let now = Utc::now();
    enrollment::ActiveModel {
        student_id: Set(student_id),
        class_id: Set(class_id),
        status: Set(EnrollmentStatus::Active.as_str().to_string()),
        enrolled_at: Set(now),
        updated_at: Set(now),
        cancelled_at: Set(None),
    }
    .insert(conn)
    .await
}

pub async fn mark_enrollment_cancelled<C: ConnectionTrait>(
    conn: &C,
    row: enrollment::Model,
) -> Result<enrollment::Model, DbErr> {
    let now = Utc::now();
    let mut active: enrollment::ActiveModel = row.into();
    active.status = Set(EnrollmentStatus::Cancelled.as_str().to_string());
    active.updated_at = Set(now);
    active.cancelled_at = Set(Some(now));
    active.update(conn).await
}

pub async fn delete_enrollment<C: ConnectionTrait>(
    conn: &C,
    student_id: i32,
    class_id: i32,
) -> Result<u64, DbErr> {
    let result = enrollment::Entity::delete_by_id((student_id, class_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub async fn list_enrollments<C: ConnectionTrait>(
    conn: &C,
    student_id: Option<i32>,
    class_id: Option<i32>,
    status: Option<EnrollmentStatus>,
) -> Result<Vec<enrollment::Model>, DbErr> {
    let mut query = enrollment::Entity::find();
    if let Some(sid) = student_id {
        query = query.filter(enrollment::Column::StudentId.eq(sid));
    }
    if let Some(cid) = class_id {
        query = query.filter(enrollment::Column::ClassId.eq(cid));
    }
    if let Some(status) = status {
        query = query.filter(enrollment::Column::Status.eq(status.as_str()));
    }

    query
        .order_by_asc(enrollment::Column::ClassId)
        .order_by_asc(enrollment::Column::StudentId)
        .all(conn)
        .await
}

/// Roster size: active enrollments of a class
pub async fn count_active_enrollments<C: ConnectionTrait>(
    conn: &C,
    class_id: i32,
) -> Result<u64, DbErr> {
    enrollment::Entity::find()
        .filter(enrollment::Column::ClassId.eq(class_id))
        .filter(enrollment::Column::Status.eq(EnrollmentStatus::Active.as_str()))
        .count(conn)
        .await
}

// ===== Attendance =====

pub async fn insert_attendance<C: ConnectionTrait>(
    conn: &C,
    student_id: i32,
    class_id: i32,
    date: NaiveDate,
    status: AttendanceStatus,
    notes: Option<String>,
) -> Result<attendance_record::Model, DbErr> {
    let now = Utc::now();
    attendance_record::ActiveModel {
        id: NotSet,
        student_id: Set(student_id),
        class_id: Set(class_id),
        date: Set(date),
        status: Set(status.as_str().to_string()),
        notes: Set(notes),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

pub async fn find_attendance_for_day<C: ConnectionTrait>(
    conn: &C,
    student_id: i32,
    class_id: i32,
    date: NaiveDate,
) -> Result<Option<attendance_record::Model>, DbErr> {
    attendance_record::Entity::find()
        .filter(attendance_record::Column::StudentId.eq(student_id))
        .filter(attendance_record::Column::ClassId.eq(class_id))
        .filter(attendance_record::Column::Date.eq(date))
        .one(conn)
        .await
}

pub async fn list_attendance<C: ConnectionTrait>(
    conn: &C,
    class_id: i32,
    date: Option<NaiveDate>,
) -> Result<Vec<attendance_record::Model>, DbErr> {
    let mut query =
        attendance_record::Entity::find().filter(attendance_record::Column::ClassId.eq(class_id));
    if let Some(date) = date {
        query = query.filter(attendance_record::Column::Date.eq(date));
    }

    query
        .order_by_asc(attendance_record::Column::Date)
        .order_by_asc(attendance_record::Column::StudentId)
        .all(conn)
        .await
}

/// Per-status counts of one class-day
pub async fn count_attendance_by_status<C: ConnectionTrait>(
    conn: &C,
    class_id: i32,
    date: NaiveDate,
) -> Result<Vec<(String, i64)>, DbErr> {
    attendance_record::Entity::find()
        .select_only()
        .column(attendance_record::Column::Status)
        .column_as(Expr::col(attendance_record::Column::Id).count(), "count")
        .filter(attendance_record::Column::ClassId.eq(class_id))
        .filter(attendance_record::Column::Date.eq(date))
        .group_by(attendance_record::Column::Status)
        .into_tuple()
        .all(conn)
        .await
}

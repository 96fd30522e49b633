//! HTTP request handlers - thin layer that delegates to domain services

use super::{dto::*, error::Problem};
use crate::domain::Services;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;

type Svc = Extension<Arc<Services>>;

// ===== Catalog Handlers =====

pub async fn create_class(
    Extension(svc): Svc,
    Json(req): Json<CreateClassRequest>,
) -> Result<(StatusCode, Json<ClassDto>), Problem> {
    let class = svc.catalog.create_class(req.into()).await?;
    Ok((StatusCode::CREATED, Json(class.into())))
}

pub async fn list_classes(Extension(svc): Svc) -> Result<Json<ListResponse<ClassDto>>, Problem> {
    let classes = svc.catalog.list_classes().await?;
    let items: Vec<ClassDto> = classes.into_iter().map(Into::into).collect();
    Ok(Json(items.into()))
}

pub async fn get_class(
    Extension(svc): Svc,
    Path(class_id): Path<i32>,
) -> Result<Json<ClassDto>, Problem> {
    let class = svc.catalog.get_class(class_id).await?;
    Ok(Json(class.into()))
}

pub async fn class_seats(
    Extension(svc): Svc,
    Path(class_id): Path<i32>,
) -> Result<Json<SeatLedgerDto>, Problem> {
    let ledger = svc.enrollments.seat_ledger(class_id).await?;
    Ok(Json(ledger.into()))
}

pub async fn class_enrollments(
    Extension(svc): Svc,
    Path(class_id): Path<i32>,
    Query(query): Query<EnrollmentListQuery>,
) -> Result<Json<ListResponse<EnrollmentDto>>, Problem> {
    let enrollments = svc
        .enrollments
        .list_by_class(class_id, query.status.map(Into::into))
        .await?;
    let items: Vec<EnrollmentDto> = enrollments.into_iter().map(Into::into).collect();
    Ok(Json(items.into()))
}

pub async fn create_student(
    Extension(svc): Svc,
    Json(req): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<StudentDto>), Problem> {
    let student = svc.catalog.create_student(req.into()).await?;
    Ok((StatusCode::CREATED, Json(student.into())))
}

pub async fn list_students(
    Extension(svc): Svc,
) -> Result<Json<ListResponse<StudentDto>>, Problem> {
    let students = svc.catalog.list_students().await?;
    let items: Vec<StudentDto> = students.into_iter().map(Into::into).collect();
    Ok(Json(items.into()))
}

pub async fn get_student(
    Extension(svc): Svc,
    Path(student_id): Path<i32>,
) -> Result<Json<StudentDto>, Problem> {
    let student = svc.catalog.get_student(student_id).await?;
    Ok(Json(student.into()))
}

pub async fn student_enrollments(
    Extension(svc): Svc,
    Path(student_id): Path<i32>,
) -> Result<Json<ListResponse<EnrollmentDto>>, Problem> {
    let enrollments = svc.enrollments.list_by_student(student_id).await?;
    let items: Vec<EnrollmentDto> = enrollments.into_iter().map(Into::into).collect();
    Ok(Json(items.into()))
}

// ===== Enrollment Handlers =====

pub async fn create_enrollment(
    Extension(svc): Svc,
    Json(req): Json<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<EnrollmentDto>), Problem> {
    let enrollment = svc
        .enrollments
        .create(req.student_id, req.class_id, req.status.map(Into::into))
        .await?;
    Ok((StatusCode::CREATED, Json(enrollment.into())))
}

pub async fn get_enrollment(
    Extension(svc): Svc,
    Path((student_id, class_id)): Path<(i32, i32)>,
) -> Result<Json<EnrollmentDto>, Problem> {
    let enrollment = svc.enrollments.get(student_id, class_id).await?;
    Ok(Json(enrollment.into()))
}

pub async fn cancel_enrollment(
    Extension(svc): Svc,
    Path((student_id, class_id)): Path<(i32, i32)>,
) -> Result<Json<EnrollmentDto>, Problem> {
    let enrollment = svc.enrollments.cancel(student_id, class_id).await?;
    Ok(Json(enrollment.into()))
}

pub async fn transfer_enrollment(
    Extension(svc): Svc,
    Path((student_id, class_id)): Path<(i32, i32)>,
    Json(req): Json<TransferEnrollmentRequest>,
) -> Result<Json<EnrollmentDto>, Problem> {
    let enrollment = svc
        .enrollments
        .transfer(student_id, class_id, req.to_class_id)
        .await?;
    Ok(Json(enrollment.into()))
}

pub async fn delete_enrollment(
    Extension(svc): Svc,
    Path((student_id, class_id)): Path<(i32, i32)>,
) -> Result<StatusCode, Problem> {
    svc.enrollments.delete(student_id, class_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Attendance Handlers =====

pub async fn record_attendance(
    Extension(svc): Svc,
    Json(req): Json<RecordAttendanceRequest>,
) -> Result<(StatusCode, Json<AttendanceDto>), Problem> {
    let record = svc
        .attendance
        .record_one(
            req.student_id,
            req.class_id,
            req.date,
            req.status.into(),
            req.notes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn record_attendance_bulk(
    Extension(svc): Svc,
    Json(req): Json<BulkAttendanceRequest>,
) -> Result<(StatusCode, Json<BulkAttendanceResponse>), Problem> {
    let entries = req.entries.into_iter().map(Into::into).collect();
    let records = svc
        .attendance
        .record_bulk(req.class_id, req.date, entries)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkAttendanceResponse {
            class_id: req.class_id,
            date: req.date,
            items: records.into_iter().map(Into::into).collect(),
        }),
    ))
}

pub async fn list_attendance(
    Extension(svc): Svc,
    Query(query): Query<AttendanceListQuery>,
) -> Result<Json<ListResponse<AttendanceDto>>, Problem> {
    let records = svc
        .attendance
        .list_for_class(query.class_id, query.date)
        .await?;
    let items: Vec<AttendanceDto> = records.into_iter().map(Into::into).collect();
    Ok(Json(items.into()))
}

pub async fn get_attendance(
    Extension(svc): Svc,
    Path(id): Path<i32>,
) -> Result<Json<AttendanceDto>, Problem> {
    let record = svc.attendance.get(id).await?;
    Ok(Json(record.into()))
}

pub async fn update_attendance(
    Extension(svc): Svc,
    Path(id): Path<i32>,
    Json(req): Json<UpdateAttendanceRequest>,
) -> Result<Json<AttendanceDto>, Problem> {
    let record = svc
        .attendance
        .update(id, req.status.into(), req.notes)
        .await?;
    Ok(Json(record.into()))
}

pub async fn delete_attendance(
    Extension(svc): Svc,
    Path(id): Path<i32>,
) -> Result<StatusCode, Problem> {
    svc.attendance.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn attendance_report(
    Extension(svc): Svc,
    Query(query): Query<AttendanceReportQuery>,
) -> Result<Json<AttendanceReportDto>, Problem> {
    let report = svc
        .attendance
        .class_report(query.class_id, query.date)
        .await?;
    Ok(Json(AttendanceReportDto::new(query.class_id, query.date, report)))
}

// ===== Audit Handlers =====

pub async fn list_audit_logs(
    Extension(svc): Svc,
    Query(query): Query<AuditListQuery>,
) -> Result<Json<PageResponse<AuditLogDto>>, Problem> {
    let page = svc
        .audit
        .list((&query).into(), query.page, query.page_size)
        .await?;
    Ok(Json(page.into()))
}

pub async fn audit_stats(
    Extension(svc): Svc,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<AuditStatsDto>, Problem> {
    let stats = svc.audit.stats(query.from, query.to).await?;
    Ok(Json(stats.into()))
}

pub async fn get_audit_log(
    Extension(svc): Svc,
    Path(id): Path<i64>,
) -> Result<Json<AuditLogDto>, Problem> {
    let entry = svc.audit.get(id).await?;
    Ok(Json(entry.into()))
}

pub async fn audit_logs_by_actor(
    Extension(svc): Svc,
    Path(actor_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<AuditLogDto>>, Problem> {
    let page = svc
        .audit
        .by_actor(actor_id, query.page, query.page_size)
        .await?;
    Ok(Json(page.into()))
}

pub async fn audit_logs_by_entity(
    Extension(svc): Svc,
    Path((entity_type, entity_id)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<AuditLogDto>>, Problem> {
    let page = svc
        .audit
        .by_entity(&entity_type, &entity_id, query.page, query.page_size)
        .await?;
    Ok(Json(page.into()))
}

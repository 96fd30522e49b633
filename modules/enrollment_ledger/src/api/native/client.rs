//! Native client implementation - wraps domain services for in-process calls

use crate::contract::{
    AttendanceEntry, AttendanceRecord, AttendanceReport, AttendanceStatus, AuditLogEntry,
    AuditLogFilter, AuditStats, Class, Enrollment, EnrollmentStatus, LedgerApi, LedgerError, Page,
    SeatLedger, Student,
};
use crate::domain::Services;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// Native client that calls the domain services directly, without HTTP.
///
/// Calls made through it are not audited; the audit trail covers the REST
/// surface only.
#[derive(Clone)]
pub struct NativeClient {
    services: Arc<Services>,
}

impl NativeClient {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[async_trait]
impl LedgerApi for NativeClient {
    async fn get_class(&self, class_id: i32) -> Result<Class, LedgerError> {
        self.services.catalog.get_class(class_id).await
    }

    async fn get_student(&self, student_id: i32) -> Result<Student, LedgerError> {
        self.services.catalog.get_student(student_id).await
    }

    async fn enroll(
        &self,
        student_id: i32,
        class_id: i32,
        status: Option<EnrollmentStatus>,
    ) -> Result<Enrollment, LedgerError> {
        self.services
            .enrollments
            .create(student_id, class_id, status)
            .await
    }

    async fn cancel_enrollment(
        &self,
        student_id: i32,
        class_id: i32,
    ) -> Result<Enrollment, LedgerError> {
        self.services.enrollments.cancel(student_id, class_id).await
    }

    async fn delete_enrollment(&self, student_id: i32, class_id: i32) -> Result<(), LedgerError> {
        self.services.enrollments.delete(student_id, class_id).await
    }

    async fn transfer_enrollment(
        &self,
        student_id: i32,
        from_class_id: i32,
        to_class_id: i32,
    ) -> Result<Enrollment, LedgerError> {
        self.services
            .enrollments
            .transfer(student_id, from_class_id, to_class_id)
            .await
    }

    async fn roster(&self, class_id: i32) -> Result<Vec<Enrollment>, LedgerError> {
        self.services
            .enrollments
            .list_by_class(class_id, Some(EnrollmentStatus::Active))
            .await
    }

    async fn seat_ledger(&self, class_id: i32) -> Result<SeatLedger, LedgerError> {
        self.services.enrollments.seat_ledger(class_id).await
    }

    async fn record_attendance(
        &self,
        student_id: i32,
        class_id: i32,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, LedgerError> {
        self.services
            .attendance
            .record_one(student_id, class_id, date, status, None)
            .await
    }

    async fn record_attendance_bulk(
        &self,
        class_id: i32,
        date: NaiveDate,
        entries: Vec<AttendanceEntry>,
    ) -> Result<Vec<AttendanceRecord>, LedgerError> {
        self.services
            .attendance
            .record_bulk(class_id, date, entries)
            .await
    }

    async fn attendance_report(
        &self,
        class_id: i32,
        date: NaiveDate,
    ) -> Result<AttendanceReport, LedgerError> {
        self.services.attendance.class_report(class_id, date).await
    }

    async fn list_audit_logs(
        &self,
        filter: AuditLogFilter,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<Page<AuditLogEntry>, LedgerError> {
        self.services.audit.list(filter, page, page_size).await
    }

    async fn audit_stats(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<AuditStats, LedgerError> {
        self.services.audit.stats(from, to).await
    }
}

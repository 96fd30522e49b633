//! Native client trait for inter-module communication
//!
//! This trait defines the API that other modules use to interact with the ledger.
//! NO HTTP - direct function calls for performance.

use super::error::LedgerError;
use super::model::{
    AttendanceEntry, AttendanceRecord, AttendanceReport, AttendanceStatus, AuditLogEntry,
    AuditLogFilter, AuditStats, Class, Enrollment, EnrollmentStatus, Page, SeatLedger, Student,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Enrollment ledger API for inter-module communication
#[async_trait]
pub trait LedgerApi: Send + Sync {
    // ===== Catalog =====

    async fn get_class(&self, class_id: i32) -> Result<Class, LedgerError>;

    async fn get_student(&self, student_id: i32) -> Result<Student, LedgerError>;

    // ===== Enrollment Operations =====

    /// Enroll a student, consuming a seat
    async fn enroll(
        &self,
        student_id: i32,
        class_id: i32,
        status: Option<EnrollmentStatus>,
    ) -> Result<Enrollment, LedgerError>;

    /// Cancel an active enrollment, returning its seat
    async fn cancel_enrollment(
        &self,
        student_id: i32,
        class_id: i32,
    ) -> Result<Enrollment, LedgerError>;

    /// Hard delete an enrollment
    async fn delete_enrollment(&self, student_id: i32, class_id: i32) -> Result<(), LedgerError>;

    /// Move an active enrollment to another class
    async fn transfer_enrollment(
        &self,
        student_id: i32,
        from_class_id: i32,
        to_class_id: i32,
    ) -> Result<Enrollment, LedgerError>;

    /// Active enrollments of a class
    async fn roster(&self, class_id: i32) -> Result<Vec<Enrollment>, LedgerError>;

    async fn seat_ledger(&self, class_id: i32) -> Result<SeatLedger, LedgerError>;

    // ===== Attendance Operations =====

    async fn record_attendance(
        &self,
        student_id: i32,
        class_id: i32,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, LedgerError>;

    async fn record_attendance_bulk(
        &self,
        class_id: i32,
        date: NaiveDate,
        entries: Vec<AttendanceEntry>,
    ) -> Result<Vec<AttendanceRecord>, LedgerError>;

    async fn attendance_report(
        &self,
        class_id: i32,
        date: NaiveDate,
    ) -> Result<AttendanceReport, LedgerError>;

    // ===== Audit Queries =====

    async fn list_audit_logs(
        &self,
        filter: AuditLogFilter,
        page: Option<u64>,
        page_size: Option<u64>,
    ) -> Result<Page<AuditLogEntry>, LedgerError>;

    async fn audit_stats(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<AuditStats, LedgerError>;
}

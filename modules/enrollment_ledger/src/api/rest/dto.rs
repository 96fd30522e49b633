//! REST DTOs with serde derives for HTTP API

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ===== Enumerations =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShiftDto {
    Morning,
    Afternoon,
    Evening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatusDto {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatusDto {
    Present,
    Absent,
    Justified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuditActionDto {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    Approve,
    Reject,
}

// ===== Catalog DTOs =====

/// Class response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassDto {
    pub id: i32,

    #[schema(example = "Industrial Electricity - Cohort 12")]
    pub name: String,

    pub shift: ShiftDto,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    pub capacity: i32,

    pub seats_available: i32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Class creation request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateClassRequest {
    pub name: String,

    pub shift: ShiftDto,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    /// Number of seats; becomes the initial seats_available
    pub capacity: i32,
}

/// Student response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentDto {
    pub id: i32,

    pub first_name: String,

    pub last_name: String,

    #[schema(example = "ana.souza@example.org")]
    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Student creation request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateStudentRequest {
    pub first_name: String,

    pub last_name: String,

    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,
}

// ===== Enrollment DTOs =====

/// Enrollment response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentDto {
    pub student_id: i32,

    pub class_id: i32,

    pub status: EnrollmentStatusDto,

    pub enrolled_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Enrollment creation request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateEnrollmentRequest {
    pub student_id: i32,

    pub class_id: i32,

    /// Optional, only `active` is accepted
    #[serde(default)]
    pub status: Option<EnrollmentStatusDto>,
}

/// Transfer request; source pair comes from the path
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransferEnrollmentRequest {
    pub to_class_id: i32,
}

/// Optional status filter for enrollment listings
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentListQuery {
    pub status: Option<EnrollmentStatusDto>,
}

/// Seat accounting of a class
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SeatLedgerDto {
    pub class_id: i32,

    pub capacity: i32,

    pub seats_available: i32,

    pub active_enrollments: u64,

    /// seats_available + active_enrollments == capacity
    pub balanced: bool,
}

// ===== Attendance DTOs =====

/// Attendance record response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceDto {
    pub id: i32,

    pub student_id: i32,

    pub class_id: i32,

    #[schema(example = "2024-05-01")]
    pub date: NaiveDate,

    pub status: AttendanceStatusDto,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Single attendance request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordAttendanceRequest {
    pub student_id: i32,

    pub class_id: i32,

    pub date: NaiveDate,

    pub status: AttendanceStatusDto,

    #[serde(default)]
    pub notes: Option<String>,
}

/// One line of a bulk attendance request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AttendanceEntryDto {
    pub student_id: i32,

    pub status: AttendanceStatusDto,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Whole class-day attendance request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BulkAttendanceRequest {
    pub class_id: i32,

    pub date: NaiveDate,

    pub entries: Vec<AttendanceEntryDto>,
}

/// Bulk attendance response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkAttendanceResponse {
    pub class_id: i32,

    pub date: NaiveDate,

    pub items: Vec<AttendanceDto>,
}

/// Attendance status change
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateAttendanceRequest {
    pub status: AttendanceStatusDto,

    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceListQuery {
    pub class_id: i32,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceReportQuery {
    pub class_id: i32,
    pub date: NaiveDate,
}

/// Per-day attendance totals
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceReportDto {
    pub class_id: i32,

    pub date: NaiveDate,

    pub present: u64,

    pub absent: u64,

    pub justified: u64,

    pub total_students: u64,
}

// ===== Audit DTOs =====

/// Audit log response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLogDto {
    pub id: i64,

    pub actor_id: Option<i32>,

    pub action: AuditActionDto,

    #[schema(example = "enrollment")]
    pub entity_type: String,

    pub entity_id: Option<String>,

    pub before_state: Option<serde_json::Value>,

    pub after_state: Option<serde_json::Value>,

    pub origin_address: Option<String>,

    pub origin_agent: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Filters and paging for audit listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditListQuery {
    pub actor_id: Option<i32>,
    pub action: Option<AuditActionDto>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Aggregated audit counts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditStatsDto {
    pub total: u64,

    /// Keyed by lowercase action name
    pub by_action: std::collections::BTreeMap<String, u64>,

    pub by_entity_type: std::collections::BTreeMap<String, u64>,

    pub distinct_actors: u64,
}

// ===== List Response DTOs =====

/// Unpaged list
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,

    pub total: usize,
}

/// One page of a paged list
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,

    /// Total matching rows across all pages
    pub total: u64,

    pub page: u64,

    pub page_size: u64,
}

// Note: Conversion implementations live in mapper.rs
